//! Strict integer extraction for header fields and chunk size lines.
//!
//! Wire integers are parsed exactly or not at all; a partially-numeric field
//! is a [`ParseError`], never a default value.

use crate::error::ParseError;

/// Parse an unsigned decimal integer, rejecting any non-digit content.
pub fn parse_decimal(s: &str) -> Result<u64, ParseError> {
    s.parse::<u64>()
        .map_err(|_| ParseError::InvalidInteger(s.to_string()))
}

/// Parse an unsigned hexadecimal integer, rejecting any non-hex content.
pub fn parse_hex(s: &str) -> Result<u64, ParseError> {
    u64::from_str_radix(s, 16).map_err(|_| ParseError::InvalidInteger(s.to_string()))
}
