// SPDX-License-Identifier: GPL-2.0
//! Unlock key parsing and feature report layout
//!
//! The key is eight byte values given as decimal tokens on the command line.
//! On the wire it is sent as a 9-byte feature report: report ID 0 followed by
//! the eight key bytes.

use std::fmt;

use tracing::warn;

use crate::error::{RelayError, Result};

/// Number of key bytes
pub const KEY_LEN: usize = 8;

/// Report ID prefixed to the key
pub const REPORT_ID: u8 = 0x00;

/// Feature report length: report ID + key
pub const FEATURE_REPORT_LEN: usize = 1 + KEY_LEN;

/// How key tokens are turned into bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyParseMode {
    /// `atoi`-style: leading digits only, anything unparsable is 0
    #[default]
    Permissive,
    /// The whole token must be a decimal integer
    Strict,
}

/// The eight key bytes sent in the unlock feature report
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct UnlockKey([u8; KEY_LEN]);

impl UnlockKey {
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse exactly [`KEY_LEN`] decimal tokens.
    ///
    /// Values are reduced modulo 256 in both modes, so `300` becomes 44 and
    /// `-1` becomes 255.
    pub fn parse<S: AsRef<str>>(tokens: &[S], mode: KeyParseMode) -> Result<Self> {
        if tokens.len() != KEY_LEN {
            return Err(RelayError::Usage(format!(
                "expected {KEY_LEN} key values, got {}",
                tokens.len()
            )));
        }

        let mut bytes = [0u8; KEY_LEN];
        for (i, (slot, token)) in bytes.iter_mut().zip(tokens).enumerate() {
            let token: &str = token.as_ref();
            *slot = match mode {
                KeyParseMode::Permissive => {
                    let value = parse_permissive(token);
                    if !is_decimal_integer(token) {
                        warn!(
                            "Key value {} ({:?}) is not a decimal number, using {}",
                            i + 1,
                            token,
                            value
                        );
                    }
                    value
                }
                KeyParseMode::Strict => parse_strict(token).ok_or_else(|| {
                    RelayError::Usage(format!(
                        "key value {} ({token:?}) is not a decimal number",
                        i + 1
                    ))
                })?,
            };
        }

        Ok(Self(bytes))
    }

    pub fn bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Build the feature report: `[REPORT_ID, k1, ..., k8]`
    pub fn feature_report(&self) -> [u8; FEATURE_REPORT_LEN] {
        let mut report = [0u8; FEATURE_REPORT_LEN];
        report[0] = REPORT_ID;
        report[1..].copy_from_slice(&self.0);
        report
    }
}

// Keep key material out of casual log output
impl fmt::Debug for UnlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UnlockKey")
            .field(&format_args!("<{KEY_LEN} bytes>"))
            .finish()
    }
}

/// C `atoi` semantics, truncated to a byte.
///
/// Skips leading whitespace, takes an optional sign and then as many digits as
/// follow. No digits at all gives 0.
fn parse_permissive(token: &str) -> u8 {
    let s = token.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '\x0b');
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    // Wrapping u8 arithmetic is arithmetic modulo 256
    let value = rest
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u8, |acc, d| acc.wrapping_mul(10).wrapping_add(d - b'0'));

    if negative {
        value.wrapping_neg()
    } else {
        value
    }
}

/// Optional sign followed by one or more ASCII digits, nothing else
fn is_decimal_integer(token: &str) -> bool {
    let digits = token.strip_prefix(['+', '-']).unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Any complete decimal integer, of any magnitude, reduced modulo 256
fn parse_strict(token: &str) -> Option<u8> {
    is_decimal_integer(token).then(|| parse_permissive(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_report_layout() {
        let key = UnlockKey::parse(&["1", "2", "3", "4", "5", "6", "7", "8"], KeyParseMode::Permissive)
            .unwrap();
        assert_eq!(key.feature_report(), [0x00, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(key.feature_report().len(), FEATURE_REPORT_LEN);
    }

    #[test]
    fn permissive_atoi_semantics() {
        assert_eq!(parse_permissive("abc"), 0);
        assert_eq!(parse_permissive(""), 0);
        assert_eq!(parse_permissive("12x"), 12);
        assert_eq!(parse_permissive("  42"), 42);
        assert_eq!(parse_permissive("+7"), 7);
        assert_eq!(parse_permissive("-"), 0);
        assert_eq!(parse_permissive("0x10"), 0);
    }

    #[test]
    fn values_wrap_modulo_256() {
        assert_eq!(parse_permissive("255"), 255);
        assert_eq!(parse_permissive("256"), 0);
        assert_eq!(parse_permissive("300"), 44);
        assert_eq!(parse_permissive("-1"), 255);
        assert_eq!(parse_permissive("-256"), 0);
        // Far beyond any native integer width
        assert_eq!(parse_permissive("100000000000000000000001"), 1);

        assert_eq!(parse_strict("300"), Some(44));
        assert_eq!(parse_strict("-1"), Some(255));
        assert_eq!(parse_strict("100000000000000000000001"), Some(1));
        assert_eq!(parse_strict("-100000000000000000000001"), Some(255));
    }

    #[test]
    fn decimal_integer_shape() {
        assert!(is_decimal_integer("0"));
        assert!(is_decimal_integer("+12"));
        assert!(is_decimal_integer("-12"));
        assert!(is_decimal_integer("99999999999999999999999999"));
        assert!(!is_decimal_integer(""));
        assert!(!is_decimal_integer("-"));
        assert!(!is_decimal_integer("+-1"));
        assert!(!is_decimal_integer(" 1"));
        assert!(!is_decimal_integer("1 "));
        assert!(!is_decimal_integer("0x10"));
    }

    #[test]
    fn strict_accepts_oversized_integer() {
        let tokens = ["100000000000000000000001", "2", "3", "4", "5", "6", "7", "-257"];
        let key = UnlockKey::parse(&tokens, KeyParseMode::Strict).unwrap();
        assert_eq!(key.bytes(), &[1, 2, 3, 4, 5, 6, 7, 255]);
    }

    #[test]
    fn permissive_non_numeric_is_zero() {
        let key = UnlockKey::parse(&["abc", "2", "3", "4", "5", "6", "7", "8"], KeyParseMode::Permissive)
            .unwrap();
        assert_eq!(key.bytes()[0], 0);
    }

    #[test]
    fn strict_rejects_malformed_token() {
        let err = UnlockKey::parse(&["1", "2", "3", "4x", "5", "6", "7", "8"], KeyParseMode::Strict)
            .unwrap_err();
        match err {
            RelayError::Usage(msg) => assert!(msg.contains("key value 4"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn wrong_key_count_is_usage_error() {
        let err = UnlockKey::parse(&["1", "2", "3"], KeyParseMode::Permissive).unwrap_err();
        assert!(matches!(err, RelayError::Usage(_)));
    }

    #[test]
    fn debug_hides_key_bytes() {
        let key = UnlockKey::new([0xAA; KEY_LEN]);
        let dbg = format!("{key:?}");
        assert!(!dbg.contains("170"), "{dbg}");
    }
}
