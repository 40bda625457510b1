/// A control message posted onto a connection's own task, so that it
/// serialises behind whatever I/O that task is already performing.
#[derive(Debug)]
pub enum ConnectionControlDetail {
    /// Write this text to the socket verbatim.
    Send(String),
    /// Shut the connection down.
    Close,
}
