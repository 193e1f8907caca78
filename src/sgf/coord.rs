//! Record coordinate alphabet.
//!
//! Each axis is one letter: `a`..`z` for 0..=25, `A`..`Z` for 26..=51.
//! A point is written x first, then y.

use crate::board::Point;
use crate::constants::MAX_BOARD_DIM;

/// Letter for an axis value, if it fits the alphabet.
pub fn encode(value: usize) -> Option<char> {
    match value {
        0..=25 => Some((b'a' + value as u8) as char),
        26..=51 => Some((b'A' + (value - 26) as u8) as char),
        _ => None,
    }
}

/// Axis value for a letter.
pub fn decode(ch: char) -> Option<usize> {
    match ch {
        'a'..='z' => Some(ch as usize - 'a' as usize),
        'A'..='Z' => Some(ch as usize - 'A' as usize + 26),
        _ => None,
    }
}

/// Two-letter code for a point.
pub fn encode_point((x, y): Point) -> Option<String> {
    Some([encode(x)?, encode(y)?].iter().collect())
}

/// Parse a two-letter code. Anything else (wrong length, bad letters) is `None`.
pub fn decode_point(code: &str) -> Option<Point> {
    let mut chars = code.chars();
    let x = decode(chars.next()?)?;
    let y = decode(chars.next()?)?;
    if chars.next().is_some() {
        return None;
    }
    debug_assert!(x < MAX_BOARD_DIM && y < MAX_BOARD_DIM);
    Some((x, y))
}
