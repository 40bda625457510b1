use crate::internal::ConnectionControlDetail;
use crate::*;

use tokio::sync::mpsc::{error::TrySendError, Sender};

/// A handle to a connection being managed by its own task.
///
/// The handle is cheap to clone; every clone posts onto the same
/// serialised control lane. The connection task ends once the socket
/// closes or the last handle is dropped.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub protocol: Protocol,
    control_channel: Sender<ConnectionControlDetail>,
}

impl Connection {
    pub(crate) fn new(
        id: ConnectionId,
        protocol: Protocol,
        control_channel: Sender<ConnectionControlDetail>,
    ) -> Self {
        Self {
            id,
            protocol,
            control_channel,
        }
    }

    fn send_control(&self, msg: ConnectionControlDetail) -> Result<(), ConnectionError> {
        self.control_channel.try_send(msg).map_err(|e| {
            tracing::debug!("Error sending connection control message: {}", e);
            e.into()
        })
    }

    /// Send the provided text to the connection, verbatim.
    ///
    /// The text is queued onto the connection's control lane; a full queue
    /// is reported as [`ConnectionError::SendQueueFull`] and the message is
    /// dropped, never retried.
    pub fn send(&self, msg: String) -> Result<(), ConnectionError> {
        self.send_control(ConnectionControlDetail::Send(msg))
    }

    /// Request the connection to close.
    ///
    /// The request is posted onto the connection's own lane, so it cannot
    /// race an in-flight read or write; it takes effect once the current
    /// operation completes. Unlike `send`, a full lane does not lose the
    /// request: it is handed to a task that waits for a slot. Closing an
    /// already-closed connection is a no-op.
    pub fn close(&self) {
        match self.control_channel.try_send(ConnectionControlDetail::Close) {
            Ok(()) => (),
            Err(TrySendError::Full(msg)) => {
                let channel = self.control_channel.clone();
                tokio::spawn(async move {
                    let _ = channel.send(msg).await;
                });
            }
            // Closed means the task is already gone; nothing to do.
            Err(TrySendError::Closed(_)) => (),
        }
    }
}
