use crate::internal::*;
use crate::*;

use std::net::SocketAddr;
use std::sync::Arc;

use sha1::{Digest, Sha1};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    net::TcpStream,
    select,
    sync::mpsc::{Receiver, Sender},
};
use tokio_rustls::{client::TlsStream, TlsConnector};
use trust_dns_resolver::TokioAsyncResolver;

use wire_proto::IrcMessage;

/// Resolve the target, connect to the returned endpoints in order, and
/// complete a hostname-verified TLS handshake.
///
/// On success the peer certificate's SHA-1 fingerprint is logged for
/// diagnostics. On any failure the caller gets the error and no stream;
/// nothing is retried here.
pub(crate) async fn establish(
    id: ConnectionId,
    host: &str,
    port: u16,
    tls_config: Arc<rustls::ClientConfig>,
    resolver: &TokioAsyncResolver,
) -> Result<(TlsStream<TcpStream>, SocketAddr), ConnectionError> {
    tracing::debug!("Resolving {} for connection {:?}", host, id);
    let lookup = resolver
        .lookup_ip(host)
        .await
        .map_err(|e| ConnectionError::Resolution(e.to_string()))?;

    let mut stream = None;
    for addr in lookup.iter() {
        let endpoint = SocketAddr::new(addr, port);
        match TcpStream::connect(endpoint).await {
            Ok(s) => {
                stream = Some(s);
                break;
            }
            Err(e) => {
                tracing::debug!("Connect to {} failed: {}", endpoint, e);
            }
        }
    }
    let stream =
        stream.ok_or_else(|| ConnectionError::IoError(format!("No reachable address for {}", host)))?;
    let remote_addr = stream.peer_addr()?;

    let server_name = rustls::ServerName::try_from(host)
        .map_err(|_| ConnectionError::Handshake(format!("Invalid server name: {}", host)))?;

    let connector: TlsConnector = tls_config.into();
    let tls_stream = connector
        .connect(server_name, stream)
        .await
        .map_err(|e| ConnectionError::Handshake(e.to_string()))?;

    let fingerprint = tls_stream
        .get_ref()
        .1
        .peer_certificates()
        .and_then(|certs| certs.first())
        .map(|cert| {
            let mut hasher = Sha1::new();
            hasher.update(&cert.0);
            hex::encode(hasher.finalize())
        });
    tracing::debug!(
        "Connection {:?} established to {}; peer fingerprint {:?}",
        id,
        remote_addr,
        fingerprint
    );

    Ok((tls_stream, remote_addr))
}

/// The task that owns one established connection.
///
/// Everything that happens to the connection — writes, reads, parse
/// results, closure — runs inside this task, one operation at a time; the
/// control channel is the only way in.
pub(crate) struct ConnectionTask<S> {
    id: ConnectionId,
    conn: S,
    protocol: Protocol,
    control_channel: Receiver<ConnectionControlDetail>,
    event_channel: Sender<ConnectionEvent>,
}

impl<S> ConnectionTask<S>
where
    S: AsyncRead + AsyncWrite + Send,
{
    pub fn new(
        id: ConnectionId,
        stream: S,
        protocol: Protocol,
        control: Receiver<ConnectionControlDetail>,
        events: Sender<ConnectionEvent>,
    ) -> Self {
        Self {
            id,
            conn: stream,
            protocol,
            control_channel: control,
            event_channel: events,
        }
    }

    pub async fn run(self) {
        let Self {
            id,
            conn,
            protocol,
            mut control_channel,
            event_channel,
        } = self;

        match protocol {
            Protocol::Line => run_line(id, conn, &mut control_channel, &event_channel).await,
            Protocol::Http => run_http(id, conn, &mut control_channel, &event_channel).await,
        }

        tracing::info!("closing {:?}", id);
        // The socket drops here; Closed is terminal and emitted exactly once.
        if event_channel.send(ConnectionEvent::closed(id)).await.is_err() {
            tracing::error!("Error notifying connection closed on {:?}", id);
        }
    }
}

async fn notify(events: &Sender<ConnectionEvent>, event: ConnectionEvent) {
    let id = event.source;
    if events.send(event).await.is_err() {
        tracing::error!("Error notifying connection event on {:?}", id);
    }
}

/// Continuous listener: every CRLF line is parsed and delivered, and the
/// read re-arms itself. A line that fails to parse poisons the stream's
/// framing and closes the connection.
async fn run_line<S>(
    id: ConnectionId,
    stream: S,
    control_channel: &mut Receiver<ConnectionControlDetail>,
    event_channel: &Sender<ConnectionEvent>,
) where
    S: AsyncRead + AsyncWrite + Send,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let reader = BufReader::new(reader);
    let mut lines = reader.lines();

    loop {
        select! {
            control = control_channel.recv() => match control {
                None => { break; },
                Some(ConnectionControlDetail::Close) => { break; },
                Some(ConnectionControlDetail::Send(msg)) => {
                    if let Err(e) = writer.write_all(msg.as_bytes()).await {
                        notify(event_channel, ConnectionEvent::error(id, e.into())).await;
                        break;
                    }
                }
            },
            line = lines.next_line() => match line {
                Ok(None) => { break; },
                Ok(Some(line)) => {
                    match IrcMessage::parse(&line) {
                        Ok(message) => {
                            notify(event_channel, ConnectionEvent::message(id, message)).await;
                        }
                        Err(e) => {
                            tracing::warn!("Unparseable line on {:?}: {}", id, e);
                            notify(event_channel, ConnectionEvent::error(id, e.into())).await;
                            break;
                        }
                    }
                }
                Err(e) => {
                    notify(event_channel, ConnectionEvent::error(id, e.into())).await;
                    break;
                }
            }
        }
    }

    // Best-effort shutdown; secondary errors are logged, not propagated.
    if let Err(e) = writer.shutdown().await {
        tracing::debug!("Error shutting down connection {:?}: {}", id, e);
    }
}

/// Request/response driver: each queued request is written in full, then
/// exactly one response is read and delivered before the next request is
/// looked at. A close request posted mid-read takes effect once the
/// in-flight cycle completes.
async fn run_http<S>(
    id: ConnectionId,
    stream: S,
    control_channel: &mut Receiver<ConnectionControlDetail>,
    event_channel: &Sender<ConnectionEvent>,
) where
    S: AsyncRead + AsyncWrite + Send,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);

    loop {
        match control_channel.recv().await {
            None => break,
            Some(ConnectionControlDetail::Close) => break,
            Some(ConnectionControlDetail::Send(request)) => {
                if let Err(e) = writer.write_all(request.as_bytes()).await {
                    notify(event_channel, ConnectionEvent::error(id, e.into())).await;
                    break;
                }

                match http_read::read_response(&mut reader).await {
                    Ok(response) => {
                        notify(event_channel, ConnectionEvent::response(id, response)).await;
                    }
                    Err(e) => {
                        notify(event_channel, ConnectionEvent::error(id, e)).await;
                        break;
                    }
                }
            }
        }
    }

    if let Err(e) = writer.shutdown().await {
        tracing::debug!("Error shutting down connection {:?}: {}", id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt, DuplexStream};
    use tokio::sync::mpsc::channel;
    use wire_proto::BodyFraming;

    fn new_task(
        stream: DuplexStream,
        protocol: Protocol,
    ) -> (
        ConnectionTask<DuplexStream>,
        Sender<ConnectionControlDetail>,
        Receiver<ConnectionEvent>,
    ) {
        let (control_send, control_recv) = channel(16);
        let (event_send, event_recv) = channel(16);
        let id = ConnectionIdGenerator::new(1).next();
        (
            ConnectionTask::new(id, stream, protocol, control_recv, event_send),
            control_send,
            event_recv,
        )
    }

    async fn expect_message(events: &mut Receiver<ConnectionEvent>) -> IrcMessage {
        match events.recv().await.expect("event channel closed").detail {
            ConnectionEventDetail::Message(msg) => msg,
            other => panic!("expected Message, got {:?}", other),
        }
    }

    async fn expect_response(events: &mut Receiver<ConnectionEvent>) -> wire_proto::HttpResponse {
        match events.recv().await.expect("event channel closed").detail {
            ConnectionEventDetail::Response(response) => response,
            other => panic!("expected Response, got {:?}", other),
        }
    }

    async fn expect_error(events: &mut Receiver<ConnectionEvent>) -> ConnectionError {
        match events.recv().await.expect("event channel closed").detail {
            ConnectionEventDetail::Error(e) => e,
            other => panic!("expected Error, got {:?}", other),
        }
    }

    async fn expect_closed(events: &mut Receiver<ConnectionEvent>) {
        match events.recv().await.expect("event channel closed").detail {
            ConnectionEventDetail::Closed => (),
            other => panic!("expected Closed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn line_protocol_delivers_parsed_lines_in_order() {
        let (local, mut remote) = duplex(1024);
        let (task, control, mut events) = new_task(local, Protocol::Line);
        let handle = tokio::spawn(task.run());

        remote
            .write_all(b":srv 001 me :welcome\r\nPING :abc\r\n")
            .await
            .unwrap();

        let first = expect_message(&mut events).await;
        assert_eq!(first.command, "001");
        assert_eq!(first.prefix.as_deref(), Some("srv"));

        // The read side re-armed itself; no caller intervention needed.
        let second = expect_message(&mut events).await;
        assert_eq!(second.command, "PING");
        assert_eq!(second.params, &["abc"]);

        control.send(ConnectionControlDetail::Close).await.unwrap();
        expect_closed(&mut events).await;
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn line_protocol_writes_outbound_text_verbatim() {
        let (local, mut remote) = duplex(1024);
        let (task, control, mut events) = new_task(local, Protocol::Line);
        let handle = tokio::spawn(task.run());

        control
            .send(ConnectionControlDetail::Send("NICK tester\r\n".to_string()))
            .await
            .unwrap();

        let mut buf = [0u8; 64];
        let n = remote.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"NICK tester\r\n");

        control.send(ConnectionControlDetail::Close).await.unwrap();
        expect_closed(&mut events).await;
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn line_protocol_parse_failure_is_fatal() {
        let (local, mut remote) = duplex(1024);
        let (task, _control, mut events) = new_task(local, Protocol::Line);
        let handle = tokio::spawn(task.run());

        remote.write_all(b"@tags-without-a-command\r\n").await.unwrap();

        assert!(matches!(
            expect_error(&mut events).await,
            ConnectionError::Parse(_)
        ));
        expect_closed(&mut events).await;
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn line_protocol_remote_eof_closes() {
        let (local, remote) = duplex(1024);
        let (task, _control, mut events) = new_task(local, Protocol::Line);
        let handle = tokio::spawn(task.run());

        drop(remote);

        expect_closed(&mut events).await;
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn http_content_length_exchange() {
        let (local, mut remote) = duplex(1024);
        let (task, control, mut events) = new_task(local, Protocol::Http);
        let handle = tokio::spawn(task.run());

        let request = crate::messages::http_get("svc.example.com", "/status");
        control
            .send(ConnectionControlDetail::Send(request))
            .await
            .unwrap();

        let mut buf = [0u8; 256];
        let n = remote.read(&mut buf).await.unwrap();
        assert!(buf[..n].starts_with(b"GET /status HTTP/1.1\r\n"));

        remote
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 5\r\n\r\nhello")
            .await
            .unwrap();

        let response = expect_response(&mut events).await;
        assert_eq!(response.header.version, "HTTP/1.1");
        assert_eq!(response.header.status, 200);
        assert_eq!(response.header.reason, "OK");
        assert_eq!(response.header.framing, BodyFraming::ContentLength(5));
        assert_eq!(response.body, b"hello");

        control.send(ConnectionControlDetail::Close).await.unwrap();
        expect_closed(&mut events).await;
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn http_chunked_exchange() {
        let (local, mut remote) = duplex(1024);
        let (task, control, mut events) = new_task(local, Protocol::Http);
        let handle = tokio::spawn(task.run());

        control
            .send(ConnectionControlDetail::Send(
                crate::messages::http_get("svc.example.com", "/data"),
            ))
            .await
            .unwrap();

        let mut buf = [0u8; 256];
        remote.read(&mut buf).await.unwrap();

        remote
            .write_all(
                b"HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n",
            )
            .await
            .unwrap();

        let response = expect_response(&mut events).await;
        assert_eq!(response.header.framing, BodyFraming::Chunked);
        assert_eq!(response.body, b"hello");

        control.send(ConnectionControlDetail::Close).await.unwrap();
        expect_closed(&mut events).await;
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn http_chunked_response_leaves_stream_clean_for_next_cycle() {
        let (local, mut remote) = duplex(4096);
        let (task, control, mut events) = new_task(local, Protocol::Http);
        let handle = tokio::spawn(task.run());

        control
            .send(ConnectionControlDetail::Send(
                crate::messages::http_get("svc.example.com", "/one"),
            ))
            .await
            .unwrap();
        control
            .send(ConnectionControlDetail::Send(
                crate::messages::http_get("svc.example.com", "/two"),
            ))
            .await
            .unwrap();

        let mut buf = [0u8; 512];
        remote.read(&mut buf).await.unwrap();
        remote
            .write_all(
                b"HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n",
            )
            .await
            .unwrap();

        let first = expect_response(&mut events).await;
        assert_eq!(first.body, b"hello");

        // The terminator's final CRLF must not bleed into the second
        // cycle's header read.
        remote.read(&mut buf).await.unwrap();
        remote
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 3\r\n\r\ntwo")
            .await
            .unwrap();

        let second = expect_response(&mut events).await;
        assert_eq!(second.header.framing, BodyFraming::ContentLength(3));
        assert_eq!(second.body, b"two");

        control.send(ConnectionControlDetail::Close).await.unwrap();
        expect_closed(&mut events).await;
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn http_unknown_framing_is_fatal() {
        let (local, mut remote) = duplex(1024);
        let (task, control, mut events) = new_task(local, Protocol::Http);
        let handle = tokio::spawn(task.run());

        control
            .send(ConnectionControlDetail::Send(
                crate::messages::http_get("svc.example.com", "/"),
            ))
            .await
            .unwrap();

        let mut buf = [0u8; 256];
        remote.read(&mut buf).await.unwrap();

        remote
            .write_all(b"HTTP/1.1 200 OK\r\nserver: x\r\n\r\nwho knows when this ends")
            .await
            .unwrap();

        assert!(matches!(
            expect_error(&mut events).await,
            ConnectionError::Parse(wire_proto::ParseError::UnknownBodyFraming)
        ));
        expect_closed(&mut events).await;
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn http_eof_mid_body_is_an_error_not_success() {
        let (local, mut remote) = duplex(1024);
        let (task, control, mut events) = new_task(local, Protocol::Http);
        let handle = tokio::spawn(task.run());

        control
            .send(ConnectionControlDetail::Send(
                crate::messages::http_get("svc.example.com", "/"),
            ))
            .await
            .unwrap();

        let mut buf = [0u8; 256];
        remote.read(&mut buf).await.unwrap();

        remote
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 10\r\n\r\nhi")
            .await
            .unwrap();
        drop(remote);

        assert!(matches!(
            expect_error(&mut events).await,
            ConnectionError::UnexpectedEof
        ));
        expect_closed(&mut events).await;
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn http_cycles_are_strictly_serialised() {
        let (local, mut remote) = duplex(4096);
        let (task, control, mut events) = new_task(local, Protocol::Http);
        let handle = tokio::spawn(task.run());

        // Queue both requests up front; the actor may only have one
        // write and one read in flight at a time, so the responses must
        // come back in issue order.
        control
            .send(ConnectionControlDetail::Send(
                crate::messages::http_get("svc.example.com", "/one"),
            ))
            .await
            .unwrap();
        control
            .send(ConnectionControlDetail::Send(
                crate::messages::http_get("svc.example.com", "/two"),
            ))
            .await
            .unwrap();

        let mut buf = [0u8; 512];
        remote.read(&mut buf).await.unwrap();
        remote
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 3\r\n\r\none")
            .await
            .unwrap();

        let first = expect_response(&mut events).await;
        assert_eq!(first.body, b"one");

        remote.read(&mut buf).await.unwrap();
        remote
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 3\r\n\r\ntwo")
            .await
            .unwrap();

        let second = expect_response(&mut events).await;
        assert_eq!(second.body, b"two");

        control.send(ConnectionControlDetail::Close).await.unwrap();
        expect_closed(&mut events).await;
        handle.await.unwrap();
    }
}
