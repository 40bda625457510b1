//! Parser for the IRC-like line protocol.

use crate::error::ParseError;

/// The most parameters a single message may carry. Exceeding this is a
/// parse failure, never silent truncation.
pub const MAX_PARAMS: usize = 15;

/// A message tag attached to an inbound line. Tags keep their wire order
/// and the parser does not require names to be unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTag {
    pub name: String,
    /// Empty when the tag appeared without an `=`.
    pub value: String,
}

/// A tokenised, but not yet interpreted, inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcMessage {
    pub tags: Vec<MessageTag>,
    /// Message origin: a server name or `nick[!user][@host]`.
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl IrcMessage {
    /// Parse one line, with the CRLF terminator already stripped.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let mut tags = Vec::new();
        let mut prefix = None;
        let mut params = Vec::new();

        let mut raw = raw.trim_start();
        if raw.is_empty() {
            return Err(ParseError::EmptyMessage);
        }

        if let Some(tag_text) = raw.strip_prefix('@') {
            let space_offset = tag_text
                .find(' ')
                .ok_or_else(|| ParseError::MalformedField(raw.to_string()))?;

            for tag_def in tag_text[..space_offset].split(';') {
                let (name, value) = match tag_def.split_once('=') {
                    Some((n, v)) => (n.to_string(), v.to_string()),
                    None => (tag_def.to_string(), String::new()),
                };
                tags.push(MessageTag { name, value });
            }

            raw = tag_text[space_offset..].trim_start();
        }

        if let Some(prefix_text) = raw.strip_prefix(':') {
            let space_offset = prefix_text
                .find(' ')
                .ok_or_else(|| ParseError::MalformedField(raw.to_string()))?;

            prefix = Some(prefix_text[..space_offset].to_string());
            raw = prefix_text[space_offset..].trim_start();
        }

        if raw.is_empty() {
            return Err(ParseError::EmptyMessage);
        }

        let (command, mut rest) = match raw.find(' ') {
            Some(offset) => (&raw[..offset], &raw[offset + 1..]),
            None => (raw, ""),
        };

        loop {
            if rest.is_empty() {
                break;
            }

            // A ':'-introduced parameter is the trailing one; it absorbs the
            // remainder of the line verbatim, spaces included.
            if let Some(trailing) = rest.strip_prefix(':') {
                if params.len() == MAX_PARAMS {
                    return Err(ParseError::TooManyParams);
                }
                params.push(trailing.to_string());
                break;
            }

            match rest.find(' ') {
                Some(offset) => {
                    let param = &rest[..offset];
                    // Consecutive spaces produce an empty token, which does
                    // not count as a parameter.
                    if !param.is_empty() {
                        if params.len() == MAX_PARAMS {
                            return Err(ParseError::TooManyParams);
                        }
                        params.push(param.to_string());
                    }
                    rest = &rest[offset + 1..];
                }
                None => {
                    if params.len() == MAX_PARAMS {
                        return Err(ParseError::TooManyParams);
                    }
                    params.push(rest.to_string());
                    break;
                }
            }
        }

        Ok(Self {
            tags,
            prefix,
            command: command.to_string(),
            params,
        })
    }
}
