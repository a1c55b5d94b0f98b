//! Hex transport of compiled artifacts
//!
//! Both the native bridge and the kyc script emit the artifact as one hex
//! string, two digits per byte, in either case.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HexError {
    #[error("hex payload has odd length {0}")]
    OddLength(usize),

    #[error("invalid hex digit {found:?} at index {index}")]
    InvalidDigit { index: usize, found: char },
}

/// Decode a hex string into bytes, ignoring surrounding whitespace
pub fn decode_hex(text: &str) -> Result<Vec<u8>, HexError> {
    let text = text.trim_matches(|c: char| c.is_ascii_whitespace());
    let digits = text.as_bytes();

    if let Some(index) = digits.iter().position(|b| !b.is_ascii_hexdigit()) {
        // Everything before `index` is ASCII, so it is a char boundary.
        let found = text[index..].chars().next().unwrap_or('\u{fffd}');
        return Err(HexError::InvalidDigit { index, found });
    }

    if digits.len() % 2 != 0 {
        return Err(HexError::OddLength(digits.len()));
    }

    Ok(digits
        .chunks_exact(2)
        .map(|pair| (nibble(pair[0]) << 4) | nibble(pair[1]))
        .collect())
}

#[inline]
fn nibble(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => unreachable!("validated before decoding"),
    }
}
