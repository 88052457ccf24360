use crossterm::style::{Attribute, Color, ResetColor, SetAttribute, SetForegroundColor};

/// Number of ordinal color slots (`C1`..`C6`). `C0` is always reset.
pub const SLOT_COUNT: usize = 6;

/// What a single `Cn` placeholder turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Reset,
    Color(u8),
}

impl Slot {
    /// Full escape emitted for the placeholder: reset, or bold + 256-color fg.
    pub fn escape(self) -> String {
        match self {
            Slot::Reset => reset(),
            Slot::Color(code) => format!(
                "{}{}",
                SetAttribute(Attribute::Bold),
                SetForegroundColor(Color::AnsiValue(code))
            ),
        }
    }
}

pub fn reset() -> String {
    format!("{}", ResetColor)
}

/// Just the foreground part, used when a color bleeds into the next row.
pub fn foreground(code: u8) -> String {
    format!("{}", SetForegroundColor(Color::AnsiValue(code)))
}

/// Ordered 256-color codes backing `C1`..`C6`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    codes: Vec<u8>,
}

impl Palette {
    pub fn new(codes: Vec<u8>) -> Self {
        Self { codes }
    }

    #[cfg(test)]
    pub fn codes(&self) -> &[u8] {
        &self.codes
    }

    /// Slot `index` (0 = `C0`). Anything the palette doesn't cover is reset.
    pub fn slot(&self, index: usize) -> Slot {
        if index == 0 || index > SLOT_COUNT {
            return Slot::Reset;
        }
        self.codes
            .get(index - 1)
            .map_or(Slot::Reset, |&code| Slot::Color(code))
    }

    /// Resolves a placeholder name (`C0`..`C6`) to its slot.
    pub fn lookup(&self, name: &str) -> Option<Slot> {
        let index = slot_index(name)?;
        Some(self.slot(index))
    }

    /// `(name, escape)` for every slot, `C0` first.
    pub fn color_map(&self) -> Vec<(String, String)> {
        (0..=SLOT_COUNT)
            .map(|i| (format!("C{}", i), self.slot(i).escape()))
            .collect()
    }

    /// Template directive colors take over the palette unless the config
    /// insists on its own.
    pub fn with_directive(&self, directive: Option<&[u8]>, force_config: bool) -> Palette {
        match directive {
            Some(colors) if !force_config => Palette::new(colors.to_vec()),
            _ => self.clone(),
        }
    }
}

fn slot_index(name: &str) -> Option<usize> {
    let digit = name.strip_prefix('C')?;
    match digit.as_bytes() {
        [d @ b'0'..=b'6'] => Some((d - b'0') as usize),
        _ => None,
    }
}
