//! # Base36 — Arbitrary Text Through a Restricted Charset
//!
//! PAC-IDs and T-REX values may only carry upper-case letters, digits and a
//! few punctuation characters. To transport arbitrary UTF-8 text the text is
//! encoded to bytes, the bytes are read as one big-endian unsigned integer,
//! and that integer is written in base 36 with the alphabet
//! `0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ`.
//!
//! ## Properties
//!
//! - The empty string encodes to `"0"`.
//! - Decoding accepts lower-case digits; encoding always emits upper case.
//! - Decoding reconstructs the minimal big-endian byte string
//!   (`ceil(bit_length / 8)` bytes, zero bytes for the value `0`). Leading
//!   zero bytes therefore do not survive a round trip: a text starting with
//!   U+0000 loses those characters. Every other text round-trips exactly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Base36Error;

const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// A canonical base36 token: upper-case `[A-Z0-9]*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Base36(String);

impl Base36 {
    /// Validate a token. Returns `None` if it contains anything but `[A-Z0-9]`.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if is_base36_token(&token) {
            Some(Self(token))
        } else {
            None
        }
    }

    /// Access the token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the token back to text.
    pub fn decode(&self) -> Result<String, Base36Error> {
        decode(&self.0)
    }

    /// Decode the token back to raw bytes.
    pub fn decode_bytes(&self) -> Result<Vec<u8>, Base36Error> {
        decode_bytes(&self.0)
    }

    /// Consumes self and returns the token text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Base36 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Base36 {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// True if `s` only contains canonical base36 digits `[A-Z0-9]`.
pub fn is_base36_token(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
}

/// Encode UTF-8 text as a base36 token.
pub fn encode(text: &str) -> Base36 {
    encode_bytes(text.as_bytes())
}

/// Encode a big-endian unsigned integer given as bytes.
pub fn encode_bytes(bytes: &[u8]) -> Base36 {
    let mut num: Vec<u8> = bytes.iter().copied().skip_while(|b| *b == 0).collect();
    if num.is_empty() {
        return Base36("0".to_string());
    }

    let mut digits = Vec::new();
    while !num.is_empty() {
        let mut remainder: u32 = 0;
        let mut quotient = Vec::with_capacity(num.len());
        for byte in &num {
            let acc = (remainder << 8) | u32::from(*byte);
            let q = acc / 36;
            remainder = acc % 36;
            if !(quotient.is_empty() && q == 0) {
                quotient.push(q as u8);
            }
        }
        digits.push(ALPHABET[remainder as usize]);
        num = quotient;
    }
    digits.reverse();
    Base36(digits.into_iter().map(char::from).collect())
}

/// Decode a base36 token to the minimal big-endian byte string.
pub fn decode_bytes(token: &str) -> Result<Vec<u8>, Base36Error> {
    if token.is_empty() {
        return Err(Base36Error::Empty);
    }

    // Little-endian limbs while accumulating, reversed at the end.
    let mut limbs: Vec<u8> = Vec::new();
    for c in token.chars() {
        let digit = c.to_digit(36).ok_or_else(|| Base36Error::InvalidDigit {
            token: token.to_string(),
            character: c,
        })?;
        let mut carry = digit;
        for limb in limbs.iter_mut() {
            let acc = u32::from(*limb) * 36 + carry;
            *limb = (acc & 0xFF) as u8;
            carry = acc >> 8;
        }
        while carry > 0 {
            limbs.push((carry & 0xFF) as u8);
            carry >>= 8;
        }
    }
    while limbs.last() == Some(&0) {
        limbs.pop();
    }
    limbs.reverse();
    Ok(limbs)
}

/// Decode a base36 token to UTF-8 text.
pub fn decode(token: &str) -> Result<String, Base36Error> {
    let bytes = decode_bytes(token)?;
    String::from_utf8(bytes).map_err(|_| Base36Error::InvalidUtf8 {
        token: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_string_encodes_to_zero() {
        assert_eq!(encode("").as_str(), "0");
        assert_eq!(decode("0").unwrap(), "");
    }

    #[test]
    fn test_known_vector() {
        // "A" = 0x41 = 65 = 1*36 + 29
        assert_eq!(encode("A").as_str(), "1T");
        assert_eq!(decode("1T").unwrap(), "A");
    }

    #[test]
    fn test_multi_byte_vector() {
        // "AB" = 0x4142 = 16706 = 12*36^2 + 32*36 + 2
        assert_eq!(encode("AB").as_str(), "CW2");
        assert_eq!(decode("CW2").unwrap(), "AB");
    }

    #[test]
    fn test_decode_is_case_insensitive() {
        assert_eq!(decode("cw2").unwrap(), "AB");
    }

    #[test]
    fn test_roundtrip_unicode() {
        for s in [
            "B-500 Balance",
            "Mini Spray Dryer S-300",
            "Smørrebrød µ-Nutrients",
            "Balance BAL500 @☣️Lab",
            "往跟住",
            "😀🌍🐯",
        ] {
            let token = encode(s);
            assert!(is_base36_token(token.as_str()), "not canonical: {token}");
            assert_eq!(decode(token.as_str()).unwrap(), s);
        }
    }

    #[test]
    fn test_decode_rejects_invalid_digit() {
        match decode("AB-C") {
            Err(Base36Error::InvalidDigit { character, .. }) => assert_eq!(character, '-'),
            other => panic!("expected InvalidDigit, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_empty() {
        assert_eq!(decode(""), Err(Base36Error::Empty));
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        // 0xFF alone is not UTF-8; 255 = 7*36 + 3
        assert_eq!(encode_bytes(&[0xFF]).as_str(), "73");
        assert!(matches!(decode("73"), Err(Base36Error::InvalidUtf8 { .. })));
        assert_eq!(decode_bytes("73").unwrap(), vec![0xFF]);
    }

    #[test]
    fn test_leading_zero_bytes_are_dropped() {
        let token = encode_bytes(&[0, 0, 1]);
        assert_eq!(token.as_str(), "1");
        assert_eq!(decode_bytes("1").unwrap(), vec![1]);
    }

    #[test]
    fn test_base36_newtype_validation() {
        assert!(Base36::new("ABC123").is_some());
        assert!(Base36::new("").is_some());
        assert!(Base36::new("abc").is_none());
        assert!(Base36::new("A.B").is_none());
    }
}
