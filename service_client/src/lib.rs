//! The outbound connection core.
//!
//! This crate maintains long-lived encrypted TCP connections to remote
//! services and exchanges two text protocols over them: an HTTP/1.1-like
//! request/response protocol and an IRC-like line protocol. Each connection
//! is owned by its own task, which serialises every operation on that
//! connection; callers hold a cheap [`Connection`] handle and receive
//! parsed messages over an event channel.

pub mod id;
pub use id::*;

pub mod error;
pub use error::*;

mod protocols;
pub use protocols::*;

mod connection;
pub use connection::*;

mod connector;
pub use connector::*;

pub mod chain;
pub use chain::Chain;

pub mod throttle;
pub use throttle::{ThrottleSettings, TokenBucket};

pub mod dispatch_queue;
pub use dispatch_queue::DispatchQueue;

pub mod executor;
pub mod messages;
pub mod tls;

mod session;
pub use session::*;

mod internal {
    pub mod protocols;
    pub use protocols::*;
    pub mod connection_task;
    pub use connection_task::*;
    pub mod http_read;
}
