use crate::internal::*;
use crate::*;

use std::sync::Arc;

use tokio::sync::mpsc::{channel, Sender};
use trust_dns_resolver::TokioAsyncResolver;

/// Capacity of each connection's outbound control lane.
const SEND_QUEUE_LEN: usize = 100;

/// Creates and tracks outbound connections for one service.
///
/// The TLS client config and the resolver are built once and shared
/// read-mostly across every connection this connector creates; per
/// connection state lives entirely inside that connection's task.
pub struct Connector {
    id_generator: ConnectionIdGenerator,
    tls_config: Arc<rustls::ClientConfig>,
    resolver: TokioAsyncResolver,
    event_channel: Sender<ConnectionEvent>,
}

impl Connector {
    /// Construct a connector. Events for every connection it creates are
    /// delivered over `event_channel`.
    pub fn new(
        tls_settings: Option<&tls::TlsClientConfig>,
        event_channel: Sender<ConnectionEvent>,
    ) -> Result<Self, ConnectionError> {
        let resolver = TokioAsyncResolver::tokio_from_system_conf()
            .map_err(|e| ConnectionError::Resolution(e.to_string()))?;

        Ok(Self {
            id_generator: ConnectionIdGenerator::new(1),
            tls_config: tls::build_client_config(tls_settings),
            resolver,
            event_channel,
        })
    }

    /// Begin connecting to `host:port`, speaking `protocol` once
    /// established.
    ///
    /// Returns immediately with the connection's handle; `Connected` (or
    /// `Error` followed by `Closed`) arrives on the event channel. A
    /// failed connection is re-entered from resolution by calling this
    /// again.
    pub fn connect(&self, host: &str, port: u16, protocol: Protocol) -> Connection {
        let id = self.id_generator.next();
        let (control_send, control_recv) = channel(SEND_QUEUE_LEN);

        let host = host.to_string();
        let tls_config = Arc::clone(&self.tls_config);
        let resolver = self.resolver.clone();
        let events = self.event_channel.clone();

        executor::spawn_supervised("connection", async move {
            match establish(id, &host, port, tls_config, &resolver).await {
                Ok((stream, remote_addr)) => {
                    if events
                        .send(ConnectionEvent::connected(id, remote_addr))
                        .await
                        .is_err()
                    {
                        tracing::error!("Error notifying new connection {:?}", id);
                        return;
                    }
                    ConnectionTask::new(id, stream, protocol, control_recv, events)
                        .run()
                        .await;
                }
                Err(e) => {
                    tracing::warn!("Connection {:?} to {}:{} failed: {}", id, host, port, e);
                    let _ = events.send(ConnectionEvent::error(id, e)).await;
                    let _ = events.send(ConnectionEvent::closed(id)).await;
                }
            }
        });

        Connection::new(id, protocol, control_send)
    }
}
