use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;

/// An error that might occur on a single connection.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Connection closed")]
    Closed,
    #[error("I/O Error: {0}")]
    IoError(String),
    #[error("Name resolution failed: {0}")]
    Resolution(String),
    #[error("TLS handshake failed: {0}")]
    Handshake(String),
    #[error("Unexpected end of stream")]
    UnexpectedEof,
    #[error("Parse error: {0}")]
    Parse(#[from] wire_proto::ParseError),
    #[error("Send queue full")]
    SendQueueFull,
    #[error("Send throttled")]
    Throttled,
}

impl From<std::io::Error> for ConnectionError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e.to_string())
    }
}

impl<T> From<TrySendError<T>> for ConnectionError {
    fn from(e: TrySendError<T>) -> Self {
        match e {
            TrySendError::Full(_) => Self::SendQueueFull,
            TrySendError::Closed(_) => Self::Closed,
        }
    }
}
