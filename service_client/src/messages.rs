//! Builders for outbound wire text.
//!
//! These are pure: they produce exactly the bytes to hand to
//! [`Connection::send`](crate::Connection::send), CRLF conventions
//! included, and nothing else.

pub fn pass(token: &str) -> String {
    format!("PASS {}\r\n", token)
}

pub fn nick(nickname: &str) -> String {
    format!("NICK {}\r\n", nickname)
}

pub fn join(channel: &str) -> String {
    format!("JOIN {}\r\n", channel)
}

pub fn part(channel: &str) -> String {
    format!("PART {}\r\n", channel)
}

pub fn privmsg(target: &str, text: &str) -> String {
    format!("PRIVMSG {} :{}\r\n", target, text)
}

pub fn pong(server: &str) -> String {
    format!("PONG :{}\r\n", server)
}

/// A minimal GET request; headers end with the empty line, and the
/// connection is not reused across logical requests.
pub fn http_get(host: &str, path: &str) -> String {
    format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, host
    )
}
