//! Parser for the HTTP/1.1-like response protocol.
//!
//! This intentionally covers only the subset the service links speak: a
//! status line, `key: value` header fields, and a body framed either by an
//! explicit `content-length` or by `chunked` transfer encoding. Trailers,
//! pipelining and connection reuse are out of scope.

use crate::error::ParseError;
use crate::numeric;

/// How the end of a response body is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    /// Body is exactly this many bytes.
    ContentLength(u64),
    /// Body is a sequence of size-prefixed chunks ending with a zero chunk.
    Chunked,
    /// Neither framing header was present. Reading a body in this state is
    /// a fatal parse failure.
    Unknown,
}

/// A parsed response header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeader {
    pub version: String,
    pub status: u16,
    pub reason: String,
    pub framing: BodyFraming,
}

impl ResponseHeader {
    /// Parse a header block: a status line followed by `key: value` fields,
    /// lines separated by CRLF.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut lines = text.split("\r\n");

        let status_line = lines.next().ok_or(ParseError::EmptyMessage)?;
        if status_line.is_empty() {
            return Err(ParseError::EmptyMessage);
        }

        // Three whitespace-separated tokens; the reason phrase absorbs
        // whatever remains of the line.
        let mut parts = status_line.splitn(3, ' ');
        let version = parts.next().ok_or(ParseError::MalformedStatusLine)?;
        let status = parts.next().ok_or(ParseError::MalformedStatusLine)?;
        let reason = parts.next().ok_or(ParseError::MalformedStatusLine)?;

        if version.is_empty() || status.is_empty() {
            return Err(ParseError::MalformedStatusLine);
        }

        let status: u16 = numeric::parse_decimal(status)?
            .try_into()
            .map_err(|_| ParseError::MalformedStatusLine)?;

        let mut framing = BodyFraming::Unknown;

        for line in lines {
            if line.is_empty() {
                continue;
            }

            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| ParseError::MalformedField(line.to_string()))?;
            let value = value.trim();

            if key.eq_ignore_ascii_case("content-length") {
                framing = BodyFraming::ContentLength(numeric::parse_decimal(value)?);
            } else if key.eq_ignore_ascii_case("transfer-encoding")
                && value.eq_ignore_ascii_case("chunked")
            {
                framing = BodyFraming::Chunked;
            }
        }

        Ok(Self {
            version: version.to_string(),
            status,
            reason: reason.to_string(),
            framing,
        })
    }

    /// The declared body length, when the framing carries one.
    pub fn content_length(&self) -> Option<u64> {
        match self.framing {
            BodyFraming::ContentLength(n) => Some(n),
            _ => None,
        }
    }
}

/// A complete response as handed to callers: one header plus the
/// accumulated body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub header: ResponseHeader,
    pub body: Vec<u8>,
}

/// Parse cursor for a chunked body.
///
/// Lines alternate between chunk size lines (strict hex) and chunk data
/// lines; the parity flag tracks which is expected next. A declared size of
/// zero terminates the body.
#[derive(Debug)]
pub struct ChunkedDecoder {
    expected: u64,
    on_size_line: bool,
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self {
            expected: 0,
            on_size_line: true,
        }
    }

    /// Consume one CRLF-delimited line (with the terminator already
    /// stripped), appending chunk data to `body`.
    ///
    /// Returns `Ok(true)` when the terminating zero-size chunk has been
    /// seen; no further data is appended after that.
    pub fn decode_line(&mut self, line: &[u8], body: &mut Vec<u8>) -> Result<bool, ParseError> {
        if self.on_size_line {
            let text = std::str::from_utf8(line)
                .map_err(|_| ParseError::InvalidInteger(String::from_utf8_lossy(line).into()))?;
            let size = numeric::parse_hex(text.trim())?;
            if size == 0 {
                return Ok(true);
            }
            self.expected = size;
            self.on_size_line = false;
        } else {
            // A data line shorter than declared means an embedded CRLF
            // truncated it; the framing can no longer be trusted.
            if line.len() as u64 != self.expected {
                return Err(ParseError::ChunkLengthMismatch {
                    expected: self.expected,
                    actual: line.len() as u64,
                });
            }
            body.extend_from_slice(line);
            self.expected = 0;
            self.on_size_line = true;
        }
        Ok(false)
    }

    /// True when the cursor is between chunks, expecting a size line.
    pub fn is_idle(&self) -> bool {
        self.on_size_line && self.expected == 0
    }
}
