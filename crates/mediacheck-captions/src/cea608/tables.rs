//! Line-21 character sets, row addressing and color palettes.

use mediacheck_common::Color;

/// Highest row index; rows run 0 to 15.
pub const CC_ROWS: usize = 15;

/// Character set a byte is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharSet {
    BasicNorthAmerican,
    SpecialNorthAmerican,
    SpanishFrench,
    PortugueseGerman,
}

impl CharSet {
    /// Map a 7-bit code to its glyph.
    pub fn glyph(self, b: u8) -> Option<char> {
        match self {
            Self::BasicNorthAmerican => Some(basic_north_american(b)),
            Self::SpecialNorthAmerican => special_north_american(b),
            Self::SpanishFrench => spanish_french(b),
            Self::PortugueseGerman => portuguese_german(b),
        }
    }

    /// Extended sets overwrite the basic character sent before them.
    pub fn replaces_previous(self) -> bool {
        matches!(self, Self::SpanishFrench | Self::PortugueseGerman)
    }
}

/// ASCII with a handful of substitutions.
fn basic_north_american(b: u8) -> char {
    match b {
        0x27 => '’',
        0x2A => 'á',
        0x5C => 'é',
        0x5E => 'í',
        0x5F => 'ó',
        0x60 => 'ú',
        0x7B => 'ç',
        0x7C => '÷',
        0x7D => 'Ñ',
        0x7E => 'ñ',
        0x7F => '█',
        _ => char::from(b),
    }
}

// 0x39 is the transparent space, rendered as a braille blank.
fn special_north_american(b: u8) -> Option<char> {
    const TABLE: [char; 16] = [
        '®', '°', '½', '¿', '™', '¢', '£', '♪', 'à', '⠀', 'è', 'â', 'ê', 'î', 'ô', 'û',
    ];
    TABLE.get(b.checked_sub(0x30)? as usize).copied()
}

fn spanish_french(b: u8) -> Option<char> {
    const TABLE: [char; 32] = [
        'Á', 'É', 'Ó', 'Ú', 'Ü', 'ü', '‘', '¡', '*', '\'', '─', '©', '℠', '·', '“', '”',
        'À', 'Â', 'Ç', 'È', 'Ê', 'Ë', 'ë', 'Î', 'Ï', 'ï', 'Ô', 'Ù', 'ù', 'Û', '«', '»',
    ];
    TABLE.get(b.checked_sub(0x20)? as usize).copied()
}

fn portuguese_german(b: u8) -> Option<char> {
    const TABLE: [char; 32] = [
        'Ã', 'ã', 'Í', 'Ì', 'ì', 'Ò', 'ò', 'Õ', 'õ', '{', '}', '\\', '^', '_', '|', '~',
        'Ä', 'ä', 'Ö', 'ö', 'ß', '¥', '¤', '│', 'Å', 'å', 'Ø', 'ø', '┌', '┐', '└', '┘',
    ];
    TABLE.get(b.checked_sub(0x20)? as usize).copied()
}

/// Row addressed by a preamble address code.
pub fn pac_row(b1: u8, b2: u8) -> usize {
    const ROWS: [usize; 16] = [11, 11, 1, 2, 3, 4, 12, 13, 14, 15, 5, 6, 7, 8, 9, 10];
    ROWS[(((b1 & 0x07) << 1) | ((b2 >> 5) & 0x01)) as usize]
}

/// Vertical line position, in percent, of a row.
pub fn row_to_line(row: usize) -> f64 {
    const LINES: [f64; 16] = [
        0.0, 10.0, 15.33, 20.66, 26.0, 31.33, 36.66, 42.0, 47.33, 52.66, 58.0, 63.33, 68.66, 74.0,
        79.33, 84.66,
    ];
    LINES.get(row).copied().unwrap_or(0.0)
}

/// Foreground for PAC and mid-row attribute values 0 to 6.
pub const TEXT_COLORS: [Color; 7] = [
    Color::White,
    Color::Green,
    Color::Blue,
    Color::Cyan,
    Color::Red,
    Color::Yellow,
    Color::Magenta,
];

/// Attribute value for white italics.
pub const WHITE_ITALICS: u8 = 7;

pub const BACKGROUND_COLORS: [Color; 8] = [
    Color::Black,
    Color::Green,
    Color::Blue,
    Color::Cyan,
    Color::Red,
    Color::Yellow,
    Color::Magenta,
    Color::Black,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_substitutions() {
        assert_eq!(CharSet::BasicNorthAmerican.glyph(b'A'), Some('A'));
        assert_eq!(CharSet::BasicNorthAmerican.glyph(0x27), Some('’'));
        assert_eq!(CharSet::BasicNorthAmerican.glyph(0x7F), Some('█'));
    }

    #[test]
    fn test_extended_tables() {
        assert_eq!(CharSet::SpecialNorthAmerican.glyph(0x37), Some('♪'));
        assert_eq!(CharSet::SpecialNorthAmerican.glyph(0x2F), None);
        assert_eq!(CharSet::SpanishFrench.glyph(0x20), Some('Á'));
        assert_eq!(CharSet::SpanishFrench.glyph(0x3F), Some('»'));
        assert_eq!(CharSet::PortugueseGerman.glyph(0x34), Some('ß'));
        assert_eq!(CharSet::PortugueseGerman.glyph(0x40), None);
        assert!(CharSet::PortugueseGerman.replaces_previous());
        assert!(!CharSet::SpecialNorthAmerican.replaces_previous());
    }

    #[test]
    fn test_pac_rows() {
        assert_eq!(pac_row(0x11, 0x40), 1);
        assert_eq!(pac_row(0x11, 0x60), 2);
        assert_eq!(pac_row(0x14, 0x60), 15);
        assert_eq!(pac_row(0x10, 0x40), 11);
        assert_eq!(pac_row(0x17, 0x60), 10);
    }

    #[test]
    fn test_row_to_line() {
        assert_eq!(row_to_line(1), 10.0);
        assert_eq!(row_to_line(15), 84.66);
        assert_eq!(row_to_line(0), 0.0);
        assert_eq!(row_to_line(16), 0.0);
    }
}
