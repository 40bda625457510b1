//! Wire-format parsers for the two text protocols spoken over service links.
//!
//! Everything here is pure: a byte span or line in, a structured message or a
//! [`ParseError`] out. The connection layer in `service_client` drives these
//! from its read path; nothing in this crate performs I/O.

pub mod error;
pub use error::*;

pub mod http;
pub use http::*;

pub mod irc;
pub use irc::*;

pub mod numeric;
