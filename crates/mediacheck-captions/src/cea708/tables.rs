//! Character sets and color quantization for DTVCC services.

use mediacheck_common::Color;

/// Eight colors the 64 DTVCC colors are reduced to, indexed by `(R << 2) | (G << 1) | B`.
const COLORS: [Color; 8] = [
    Color::Black,
    Color::Blue,
    Color::Green,
    Color::Cyan,
    Color::Red,
    Color::Magenta,
    Color::Yellow,
    Color::White,
];

/// Reduce a `|xx|R|R|G|G|B|B|` color byte to one of eight colors.
/// Component values 0 and 1 map to off, 2 and 3 to on.
pub fn quantize_color(byte: u8) -> Color {
    let on = |component: u8| usize::from(component & 0x03 >= 2);
    let red = on(byte >> 4);
    let green = on(byte >> 2);
    let blue = on(byte);
    COLORS[(red << 2) | (green << 1) | blue]
}

/// G0: ASCII, with 0x7F as a music note.
pub fn g0(code: u8) -> String {
    match code {
        0x7F => "♪".to_string(),
        c => char::from(c).to_string(),
    }
}

/// G1: Latin-1.
pub fn g1(code: u8) -> String {
    char::from(code).to_string()
}

/// G2: miscellaneous symbols. Unassigned codes render as an underscore.
pub fn g2(code: u8) -> &'static str {
    match code {
        0x20 => " ",
        0x21 => "\u{a0}",
        0x25 => "…",
        0x2A => "Š",
        0x2C => "Œ",
        0x30 => "█",
        0x31 => "‘",
        0x32 => "’",
        0x33 => "“",
        0x34 => "”",
        0x35 => "•",
        0x39 => "™",
        0x3A => "š",
        0x3C => "œ",
        0x3D => "℠",
        0x3F => "Ÿ",
        0x76 => "⅛",
        0x77 => "⅜",
        0x78 => "⅝",
        0x79 => "⅞",
        0x7A => "│",
        0x7B => "┐",
        0x7C => "└",
        0x7D => "─",
        0x7E => "┘",
        0x7F => "┌",
        _ => "_",
    }
}

/// G3: only the closed caption logo is assigned.
pub fn g3(code: u8) -> &'static str {
    match code {
        0xA0 => "[CC]",
        _ => "_",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_color() {
        assert_eq!(quantize_color(0x00), Color::Black);
        assert_eq!(quantize_color(0x15), Color::Black);
        assert_eq!(quantize_color(0x2A), Color::White);
        assert_eq!(quantize_color(0x3F), Color::White);
        assert_eq!(quantize_color(0x30), Color::Red);
        assert_eq!(quantize_color(0x0C), Color::Green);
        assert_eq!(quantize_color(0x03), Color::Blue);
        assert_eq!(quantize_color(0x3C), Color::Yellow);
        // Opacity bits are ignored.
        assert_eq!(quantize_color(0xC3), Color::Blue);
    }

    #[test]
    fn test_character_sets() {
        assert_eq!(g0(b'A'), "A");
        assert_eq!(g0(0x7F), "♪");
        assert_eq!(g1(0xE9), "é");
        assert_eq!(g2(0x25), "…");
        assert_eq!(g2(0x40), "_");
        assert_eq!(g3(0xA0), "[CC]");
        assert_eq!(g3(0xA1), "_");
    }
}
