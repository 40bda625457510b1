use thiserror::Error;

/// An error encountered while parsing a wire message.
///
/// A parse error means the framing of the underlying byte stream can no
/// longer be trusted; callers are expected to treat it as fatal for the
/// connection that produced the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Empty message")]
    EmptyMessage,
    #[error("Malformed status line")]
    MalformedStatusLine,
    #[error("Malformed header field: {0}")]
    MalformedField(String),
    #[error("Invalid integer: {0}")]
    InvalidInteger(String),
    #[error("Too many message parameters")]
    TooManyParams,
    #[error("Chunk carried {actual} bytes but declared {expected}")]
    ChunkLengthMismatch { expected: u64, actual: u64 },
    #[error("Unknown body framing")]
    UnknownBodyFraming,
}
