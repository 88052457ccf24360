//! Placeholder expansion for ascii art templates.
//!
//! Accepts `${C1}`, `$C1` and bare `C1`. Any other `${NAME}` expands to
//! nothing, any other `$` is art. While expanding, each line records the color codes it emitted
//! so the layout step never has to dig them back out of escape bytes.

use crate::palette::{Palette, Slot};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtLine {
    /// Line text with escapes already substituted in.
    pub text: String,
    /// Color codes emitted on this line, left to right.
    pub colors: Vec<u8>,
}

impl ArtLine {
    /// Most recent foreground color set on this line.
    pub fn last_color(&self) -> Option<u8> {
        self.colors.last().copied()
    }

    fn push_slot(&mut self, slot: Slot) {
        self.text.push_str(&slot.escape());
        if let Slot::Color(code) = slot {
            self.colors.push(code);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandedArt {
    pub lines: Vec<ArtLine>,
}

impl ExpandedArt {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

enum Token<'a> {
    Literal(usize),
    Placeholder { len: usize, name: &'a str },
}

pub fn expand(body: &str, palette: &Palette) -> ExpandedArt {
    ExpandedArt {
        lines: body.split('\n').map(|line| expand_line(line, palette)).collect(),
    }
}

fn expand_line(line: &str, palette: &Palette) -> ArtLine {
    let mut out = ArtLine::default();
    let mut rest = line;

    while let Some(pos) = rest.find(|c: char| c == '$' || c == 'C') {
        out.text.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match next_token(tail) {
            Token::Literal(len) => {
                out.text.push_str(&tail[..len]);
                rest = &tail[len..];
            }
            Token::Placeholder { len, name } => {
                if let Some(slot) = palette.lookup(name) {
                    out.push_slot(slot);
                }
                rest = &tail[len..];
            }
        }
    }
    out.text.push_str(rest);
    out
}

// `tail` always starts with '$' or 'C'
fn next_token(tail: &str) -> Token<'_> {
    let bytes = tail.as_bytes();

    if bytes[0] == b'C' {
        return match bytes.get(1) {
            Some(b'0'..=b'6') => Token::Placeholder {
                len: 2,
                name: &tail[..2],
            },
            _ => Token::Literal(1),
        };
    }

    if bytes.get(1) == Some(&b'{') {
        return match tail.find('}') {
            Some(end) => Token::Placeholder {
                len: end + 1,
                name: &tail[2..end],
            },
            None => Token::Literal(2),
        };
    }

    // Only `$C0`..`$C6` is a bare `$` placeholder. `$USER`, `$$` and the like
    // stay in the art as typed instead of expanding to nothing, since logos
    // such as Debian's are drawn with `$`.
    match bytes.get(1..3) {
        Some([b'C', b'0'..=b'6']) => Token::Placeholder {
            len: 3,
            name: &tail[1..3],
        },
        _ => Token::Literal(1),
    }
}
