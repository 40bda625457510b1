//! Read-side framing for the HTTP-like transport variant.
//!
//! The header is accumulated line by line until the blank terminator, then
//! the body is read according to the framing the header declared. Any bytes
//! the buffered reader pulled in past the header seed the body read.

use crate::error::ConnectionError;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use wire_proto::{BodyFraming, ChunkedDecoder, HttpResponse, ResponseHeader};

/// Ceiling on a single body read.
const READ_CHUNK: usize = 1024;

/// Read one complete response: header, then body per its framing kind.
pub(crate) async fn read_response<R>(reader: &mut R) -> Result<HttpResponse, ConnectionError>
where
    R: AsyncBufRead + Unpin,
{
    let header = read_header(reader).await?;

    let body = match header.framing {
        BodyFraming::ContentLength(length) => read_sized_body(reader, length).await?,
        BodyFraming::Chunked => read_chunked_body(reader).await?,
        // A body with no known end cannot be framed; the stream is unusable.
        BodyFraming::Unknown => {
            return Err(wire_proto::ParseError::UnknownBodyFraming.into());
        }
    };

    Ok(HttpResponse { header, body })
}

async fn read_header<R>(reader: &mut R) -> Result<ResponseHeader, ConnectionError>
where
    R: AsyncBufRead + Unpin,
{
    let mut header_text = String::new();

    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            tracing::warn!("End of stream while reading response header");
            return Err(ConnectionError::UnexpectedEof);
        }
        if line == "\r\n" || line == "\n" {
            break;
        }
        header_text.push_str(&line);
    }

    Ok(ResponseHeader::parse(&header_text)?)
}

async fn read_sized_body<R>(reader: &mut R, length: u64) -> Result<Vec<u8>, ConnectionError>
where
    R: AsyncBufRead + Unpin,
{
    let mut body = Vec::with_capacity(length.min(READ_CHUNK as u64) as usize);
    let mut buf = [0u8; READ_CHUNK];

    while (body.len() as u64) < length {
        let want = (length - body.len() as u64).min(READ_CHUNK as u64) as usize;
        let n = reader.read(&mut buf[..want]).await?;
        if n == 0 {
            tracing::warn!(
                "End of stream mid-body: have {} of {} bytes",
                body.len(),
                length
            );
            return Err(ConnectionError::UnexpectedEof);
        }
        body.extend_from_slice(&buf[..n]);
    }

    Ok(body)
}

async fn read_chunked_body<R>(reader: &mut R) -> Result<Vec<u8>, ConnectionError>
where
    R: AsyncBufRead + Unpin,
{
    let mut decoder = ChunkedDecoder::new();
    let mut body = Vec::new();

    loop {
        let line = match read_wire_line(reader).await? {
            Some(line) => line,
            None => {
                tracing::warn!("End of stream mid-body: {} chunked bytes so far", body.len());
                return Err(ConnectionError::UnexpectedEof);
            }
        };

        if decoder.decode_line(&line, &mut body)? {
            break;
        }
    }

    // The zero-size chunk is followed by one final empty line. Consume it
    // here so the next cycle's header read starts on a clean stream.
    match read_wire_line(reader).await? {
        Some(line) if line.is_empty() => Ok(body),
        Some(line) => Err(wire_proto::ParseError::MalformedField(
            String::from_utf8_lossy(&line).into_owned(),
        )
        .into()),
        None => {
            tracing::warn!("End of stream before chunked body terminator");
            Err(ConnectionError::UnexpectedEof)
        }
    }
}

/// Read one CRLF-delimited line, with the terminator stripped. `None` means
/// the stream ended.
async fn read_wire_line<R>(reader: &mut R) -> Result<Option<Vec<u8>>, ConnectionError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let n = reader.read_until(b'\n', &mut line).await?;
    if n == 0 {
        return Ok(None);
    }
    if line.ends_with(b"\n") {
        line.pop();
    }
    if line.ends_with(b"\r") {
        line.pop();
    }
    Ok(Some(line))
}
