//! Puts the colored art and the fetch script's output side by side.

use std::sync::LazyLock;

use regex::Regex;
use unicode_width::UnicodeWidthStr;

use crate::expand::ExpandedArt;
use crate::palette;

/// Blank columns between the widest art line and the fact text.
pub const GUTTER: usize = 5;

static ANSI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[\x1b\x{9b}][\[\]()#;?]*(?:(?:(?:[a-zA-Z\d]*(?:;[a-zA-Z\d]*)*)?\x07)|(?:(?:\d{1,4}(?:;\d{0,4})*)?[\dA-PRZcf-ntqry=><~]))",
    )
    .expect("ansi pattern is valid")
});

pub fn strip_ansi(s: &str) -> String {
    ANSI_RE.replace_all(s, "").into_owned()
}

/// Terminal columns taken by `s` once escapes are gone.
pub fn visible_width(s: &str) -> usize {
    strip_ansi(s).width()
}

/// Lines printed by the fetch script, matched to art rows by index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputBlock {
    lines: Vec<String>,
}

impl OutputBlock {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Splits captured stdout. The newline ending the last line doesn't start
    /// another (empty) fact.
    pub fn from_stdout(stdout: &str) -> Self {
        if stdout.is_empty() {
            return Self::default();
        }
        let trimmed = stdout.strip_suffix('\n').unwrap_or(stdout);
        Self::new(trimmed.split('\n').map(str::to_string).collect())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[cfg(test)]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// Builds the final block: every art row padded to the same visible column,
/// facts after a reset, and the last color set on any earlier art row carried
/// into the next one, so glyphs colored only on their first line keep that
/// color all the way down.
pub fn compose(art: &ExpandedArt, output: &OutputBlock) -> String {
    let widths: Vec<usize> = art.lines.iter().map(|l| visible_width(&l.text)).collect();
    let max_width = widths.iter().copied().max().unwrap_or(0);
    let column = max_width + GUTTER;
    let rows = art.len().max(output.len());
    let reset = palette::reset();

    let mut rendered = Vec::with_capacity(rows);
    // color in effect at the end of the previous art row
    let mut carry: Option<u8> = None;
    for i in 0..rows {
        let mut row = String::new();
        match art.lines.get(i) {
            Some(line) => {
                if let Some(code) = carry {
                    row.push_str(&palette::foreground(code));
                }
                carry = line.last_color().or(carry);
                row.push_str(&line.text);
                row.push_str(&" ".repeat(column.saturating_sub(widths[i])));
            }
            None => row.push_str(&" ".repeat(column)),
        }
        if let Some(fact) = output.lines.get(i) {
            row.push_str(&reset);
            row.push_str(fact);
        }
        rendered.push(row);
    }

    let mut block = rendered.join("\n");
    let kept = block.trim_end_matches(&['\n', '\t', ' '][..]).len();
    block.truncate(kept);
    block.push_str(&reset);
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::expand;
    use crate::palette::Palette;
    use pretty_assertions::assert_eq;

    const RESET: &str = "\x1b[0m";

    fn facts(lines: &[&str]) -> OutputBlock {
        OutputBlock::new(lines.iter().map(|s| s.to_string()).collect())
    }

    /// Visible text of each row up to the reset that introduces its fact.
    fn art_columns(block: &str) -> Vec<usize> {
        block
            .lines()
            .map(|row| {
                let before_fact = row.split_once(RESET).map_or(row, |(art, _)| art);
                visible_width(before_fact)
            })
            .collect()
    }

    #[test]
    fn strip_ansi_removes_palette_escapes() {
        assert_eq!(strip_ansi("\x1b[1m\x1b[38;5;196mred\x1b[0m text"), "red text");
        assert_eq!(visible_width("\x1b[38;5;4m██\x1b[0m"), 2);
    }

    #[test]
    fn rows_align_at_widest_line_plus_gutter() {
        let art = expand("aaaaa\nbbbbbbbbbbbb\nccc", &Palette::default());
        let block = compose(&art, &facts(&["one", "two", "three"]));
        assert_eq!(art_columns(&block), vec![17, 17, 17]);
        assert_eq!(
            strip_ansi(&block),
            "aaaaa            one\nbbbbbbbbbbbb     two\nccc              three"
        );
    }

    #[test]
    fn escapes_do_not_eat_padding() {
        let palette = Palette::new(vec![1, 2]);
        let art = expand("${C1}ab${C2}cde\n${C2}xy", &palette);
        let block = compose(&art, &facts(&["f1", "f2"]));
        assert_eq!(art_columns(&block), vec![10, 10]);
    }

    #[test]
    fn extra_fact_lines_get_blank_art_columns() {
        let art = expand("ab\ncd", &Palette::default());
        let block = compose(&art, &facts(&["1", "2", "3", "4"]));
        let rows: Vec<&str> = block.lines().collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[2], format!("{}{RESET}3", " ".repeat(7)));
        assert!(rows[3].starts_with(&format!("{}{RESET}4", " ".repeat(7))));
    }

    #[test]
    fn extra_art_lines_have_no_fact_and_the_tail_is_trimmed() {
        let art = expand("ab\ncd\nef", &Palette::default());
        let block = compose(&art, &facts(&["1"]));
        let pad = " ".repeat(5);
        assert_eq!(block, format!("ab{pad}{RESET}1\ncd{pad}\nef{RESET}"));
    }

    #[test]
    fn last_color_of_previous_row_bleeds_into_next() {
        let palette = Palette::new(vec![1, 2]);
        let art = expand("${C1}a${C2}b\nc\n${C0}d", &palette);
        let block = compose(&art, &OutputBlock::default());
        let rows: Vec<&str> = block.lines().collect();
        assert!(rows[0].starts_with("\x1b[1m\x1b[38;5;1ma"));
        assert!(rows[1].starts_with("\x1b[38;5;2mc"));
        // a reset is not a color, C2 is still the one carried
        assert!(rows[2].starts_with(&format!("\x1b[38;5;2m{RESET}d")));
    }

    #[test]
    fn carried_color_runs_through_uncolored_rows() {
        let art = expand("${C1}a\nb\nc", &Palette::new(vec![1]));
        let block = compose(&art, &OutputBlock::default());
        let rows: Vec<&str> = block.lines().collect();
        let pad = " ".repeat(5);
        assert_eq!(rows[0], format!("\x1b[1m\x1b[38;5;1ma{pad}"));
        assert_eq!(rows[1], format!("\x1b[38;5;1mb{pad}"));
        assert_eq!(rows[2], format!("\x1b[38;5;1mc{RESET}"));
    }

    #[test]
    fn newer_color_replaces_the_carried_one() {
        let art = expand("${C1}a\nb\n${C2}c\nd", &Palette::new(vec![1, 2]));
        let block = compose(&art, &OutputBlock::default());
        let rows: Vec<&str> = block.lines().collect();
        assert!(rows[1].starts_with("\x1b[38;5;1mb"));
        assert!(rows[2].starts_with("\x1b[38;5;1m\x1b[1m\x1b[38;5;2mc"));
        assert!(rows[3].starts_with("\x1b[38;5;2md"));
    }

    #[test]
    fn blank_rows_past_the_art_carry_nothing() {
        let art = expand("${C1}a", &Palette::new(vec![1]));
        let block = compose(&art, &facts(&["1", "2"]));
        let rows: Vec<&str> = block.lines().collect();
        assert_eq!(rows[1], format!("{}{RESET}2{RESET}", " ".repeat(6)));
    }

    #[test]
    fn stripped_block_keeps_the_fact_column() {
        let palette = Palette::new(vec![4, 5, 6]);
        let art = expand("${C1}  __\n${C2} /  \\\n${C3}/____\\${C1}", &palette);
        let block = compose(&art, &facts(&["os", "cpu", "mem", "disk"]));
        let stripped = strip_ansi(&block);
        for (row, fact) in stripped.lines().zip(["os", "cpu", "mem", "disk"]) {
            assert_eq!(&row[11..], fact);
            assert!(row[..11].chars().skip(6).all(|c| c == ' '));
        }
    }

    #[test]
    fn block_always_ends_with_reset() {
        let block = compose(&ExpandedArt::default(), &OutputBlock::default());
        assert_eq!(block, RESET);
    }

    #[test]
    fn output_block_from_stdout() {
        assert_eq!(OutputBlock::from_stdout("a\nb\n").lines(), &["a", "b"]);
        assert_eq!(OutputBlock::from_stdout("a\n\n").lines(), &["a", ""]);
        assert_eq!(OutputBlock::from_stdout("no newline").lines(), &["no newline"]);
        assert!(OutputBlock::from_stdout("").is_empty());
        assert_eq!(OutputBlock::from_stdout("\n").lines(), &[""]);
    }
}
