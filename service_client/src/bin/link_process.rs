//! A long-lived process that maintains one chat link.
//!
//! Reads a JSON config, builds the worker pool, connects the line-protocol
//! link, registers, answers PINGs, and hands every other inbound message to
//! a dispatch thread through the bounded queue.

use service_client::*;

use std::{env, error::Error, fs::File, io::BufReader, path::Path, sync::Arc};

use tokio::sync::mpsc::channel;

use wire_proto::IrcMessage;

#[derive(Debug, serde::Deserialize)]
struct LinkConfig {
    server: String,
    port: u16,
    nickname: String,
    token: String,
    channel: String,
    tls: Option<tls::TlsClientConfig>,
    throttle: ThrottleSettings,
    workers: executor::WorkerPoolSettings,
}

fn load_config(filename: impl AsRef<Path>) -> Result<LinkConfig, Box<dyn Error>> {
    let file = File::open(filename)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let mut args = env::args();
    args.next();
    let config_path = args.next().ok_or("Usage: link_process <config.json>")?;
    let config = load_config(config_path)?;

    let runtime = executor::build_runtime(&config.workers)?;

    let queue = Arc::new(DispatchQueue::<IrcMessage>::new(1024));

    let dispatch_queue = Arc::clone(&queue);
    let dispatcher = std::thread::spawn(move || {
        while let Some(message) = dispatch_queue.next() {
            tracing::info!(
                "[{}] {} {}",
                message.prefix.as_deref().unwrap_or("-"),
                message.command,
                message.params.join(" ")
            );
        }
    });

    let result = runtime.block_on(run_link(&config, &queue));

    queue.shutdown();
    if dispatcher.join().is_err() {
        tracing::error!("Dispatch thread panicked");
    }

    result
}

async fn run_link(
    config: &LinkConfig,
    queue: &DispatchQueue<IrcMessage>,
) -> Result<(), Box<dyn Error>> {
    let (event_send, mut event_recv) = channel(128);

    let connector = Connector::new(config.tls.as_ref(), event_send)?;
    let connection = connector.connect(&config.server, config.port, Protocol::Line);
    let session = ChatSession::new(connection, config.throttle);

    while let Some(event) = event_recv.recv().await {
        match event.detail {
            ConnectionEventDetail::Connected(addr) => {
                tracing::info!("Connected to {}", addr);
                session
                    .register(&config.token, &config.nickname, &config.channel)
                    .await?;
            }
            ConnectionEventDetail::Message(message) => {
                if message.command == "PING" {
                    let server = message.params.first().cloned().unwrap_or_default();
                    if let Err(e) = session.pong(&server) {
                        tracing::warn!("Failed to answer PING: {}", e);
                    }
                } else if queue.add(message).is_err() {
                    tracing::warn!("Dispatch queue full; dropping message");
                }
            }
            ConnectionEventDetail::Response(_) => {}
            ConnectionEventDetail::Error(e) => {
                tracing::warn!("Connection error on {:?}: {}", event.source, e);
            }
            ConnectionEventDetail::Closed => {
                tracing::info!("Connection {:?} closed", event.source);
                break;
            }
        }
    }

    Ok(())
}
