use crate::error::ConnectionError;
use crate::id::ConnectionId;

use std::net::SocketAddr;

use wire_proto::{HttpResponse, IrcMessage};

/// Which wire protocol a connection speaks, selected at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Request/response exchanges: each outbound request is answered by one
    /// parsed header+body pair.
    Http,
    /// Continuous CRLF-line listener; every inbound line is parsed and
    /// delivered, and the read side re-arms itself.
    Line,
}

/// Possible types of event that might occur on a given connection.
#[derive(Debug)]
pub enum ConnectionEventDetail {
    /// The connect/handshake sequence completed.
    Connected(SocketAddr),
    /// A full request/response cycle completed on an HTTP connection.
    Response(HttpResponse),
    /// A line was received and parsed on a line-protocol connection.
    Message(IrcMessage),
    /// An error occurred. The connection closes after this.
    Error(ConnectionError),
    /// The connection has fully shut down. Terminal.
    Closed,
}

/// An event notified via a [`Connector`](crate::Connector)'s event channel.
#[derive(Debug)]
pub struct ConnectionEvent {
    /// The connection ID to which this event relates
    pub source: ConnectionId,
    /// The type of event and its content
    pub detail: ConnectionEventDetail,
}

impl ConnectionEvent {
    pub(crate) fn connected(id: ConnectionId, addr: SocketAddr) -> Self {
        Self {
            source: id,
            detail: ConnectionEventDetail::Connected(addr),
        }
    }

    pub(crate) fn response(id: ConnectionId, response: HttpResponse) -> Self {
        Self {
            source: id,
            detail: ConnectionEventDetail::Response(response),
        }
    }

    pub(crate) fn message(id: ConnectionId, message: IrcMessage) -> Self {
        Self {
            source: id,
            detail: ConnectionEventDetail::Message(message),
        }
    }

    pub(crate) fn error(id: ConnectionId, error: ConnectionError) -> Self {
        Self {
            source: id,
            detail: ConnectionEventDetail::Error(error),
        }
    }

    pub(crate) fn closed(id: ConnectionId) -> Self {
        Self {
            source: id,
            detail: ConnectionEventDetail::Closed,
        }
    }
}
