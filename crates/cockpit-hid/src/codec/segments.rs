//! 7-segment glyph encoding
//!
//! The FCU and EFIS windows use one byte per digit cell. Bit layout of a
//! plain glyph (as wired on the FCU speed window):
//!
//! | Bit  | Segment      |
//! |------|--------------|
//! | 0x80 | top          |
//! | 0x40 | upper right  |
//! | 0x20 | lower right  |
//! | 0x10 | bottom       |
//! | 0x08 | upper left   |
//! | 0x04 | middle       |
//! | 0x02 | lower left   |
//! | 0x01 | dot          |
//!
//! Heading, altitude and vertical speed windows are wired with the nibbles
//! of adjacent cells crossed over ("swapped" encoding), and the EFIS baro
//! window uses its own bit order. Both are derived from the plain table.

/// Glyph for a single character; unmapped characters are blank
pub fn glyph(c: char) -> u8 {
    match c.to_ascii_uppercase() {
        '0' => 0xFA,
        '1' => 0x60,
        '2' => 0xD6,
        '3' => 0xF4,
        '4' => 0x6C,
        '5' => 0xBC,
        '6' => 0xBE,
        '7' => 0xE0,
        '8' => 0xFE,
        '9' => 0xFC,
        'A' => 0xEE,
        'B' => 0xFE,
        'C' => 0x9A,
        'D' => 0x76,
        'E' => 0x9E,
        'F' => 0x8E,
        'G' => 0xBE,
        'H' => 0x6E,
        'I' => 0x60,
        'J' => 0x70,
        'K' => 0x0E,
        'L' => 0x1A,
        'M' => 0xA6,
        'N' => 0x26,
        'O' => 0xFA,
        'P' => 0xCE,
        'Q' => 0xEC,
        'R' => 0x06,
        'S' => 0xBC,
        'T' => 0x1E,
        'U' => 0x7A,
        'V' => 0x32,
        'W' => 0x58,
        'X' => 0x6E,
        'Y' => 0x7C,
        'Z' => 0xD6,
        '-' => 0x04,
        '#' => 0x36,
        '/' => 0x60,
        '\\' => 0xA0,
        _ => 0x00,
    }
}

pub fn swap_nibbles(value: u8) -> u8 {
    value.rotate_left(4)
}

/// Right-align `text` in a field of `width` characters
///
/// Longer input keeps its rightmost characters; shorter input is padded
/// with spaces on the left.
pub fn fit_text(text: &str, width: usize) -> Vec<char> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() >= width {
        return chars[chars.len() - width..].to_vec();
    }
    let mut out = vec![' '; width - chars.len()];
    out.extend(chars);
    out
}

/// Encode `text` into `width` glyph bytes, rightmost character first
pub fn encode_segments(text: &str, width: usize) -> Vec<u8> {
    let mut data = vec![0u8; width];
    for (i, c) in fit_text(text, width).into_iter().enumerate() {
        data[width - 1 - i] = glyph(c);
    }
    data
}

/// Encode for windows whose cells share nibbles with their neighbour
///
/// Returns `width + 1` bytes. The upper nibble of each cell's swapped glyph
/// moves into the next byte up, so the last byte only carries the spill of
/// the leftmost character.
pub fn encode_segments_swapped(text: &str, width: usize) -> Vec<u8> {
    let mut data = encode_segments(text, width);
    data.push(0);
    for byte in data.iter_mut() {
        *byte = swap_nibbles(*byte);
    }

    for i in 0..width {
        let hi = width - i;
        let lo = width - 1 - i;
        data[hi] = (data[hi] & 0x0F) | (data[lo] & 0xF0);
        data[lo] &= 0x0F;
    }

    data
}

/// (plain bit, EFIS bit) pairs
const EFIS_BIT_MAP: [(u8, u8); 8] = [
    (0x08, 0x01), // upper left
    (0x04, 0x02), // middle
    (0x02, 0x04), // lower left
    (0x10, 0x08), // bottom
    (0x80, 0x10), // top
    (0x40, 0x20), // upper right
    (0x20, 0x40), // lower right
    (0x01, 0x80), // dot
];

/// Remap a plain glyph onto the EFIS baro window wiring
pub fn efis_glyph(plain: u8) -> u8 {
    EFIS_BIT_MAP
        .iter()
        .filter(|(from, _)| plain & from != 0)
        .fold(0, |acc, (_, to)| acc | to)
}

/// Encode `text` into `width` EFIS glyph bytes, rightmost character first
pub fn encode_efis_segments(text: &str, width: usize) -> Vec<u8> {
    encode_segments(text, width)
        .into_iter()
        .map(efis_glyph)
        .collect()
}
