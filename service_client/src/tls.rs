//! Client-side TLS configuration shared by every connection of a service.

use std::{fs::File, io::BufReader, path::PathBuf, sync::Arc};

/// Where to find the PEM trust root used to verify peer certificates.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct TlsClientConfig {
    pub trust_root: PathBuf,
}

/// Build the shared client config, verifying peers against the configured
/// trust root and the connection's target hostname.
///
/// A failed trust root load is logged but does not abort startup; the
/// config is built with an empty root store and handshakes fail at runtime
/// instead.
pub fn build_client_config(settings: Option<&TlsClientConfig>) -> Arc<rustls::ClientConfig> {
    let mut roots = rustls::RootCertStore::empty();

    if let Some(settings) = settings {
        match load_trust_root(settings) {
            Ok(certs) => {
                let (added, ignored) = roots.add_parsable_certificates(&certs);
                tracing::debug!(
                    "Loaded {} trust roots ({} ignored) from {:?}",
                    added,
                    ignored,
                    settings.trust_root
                );
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to load trust root from {:?}: {}; TLS handshakes will fail",
                    settings.trust_root,
                    e
                );
            }
        }
    }

    Arc::new(
        rustls::ClientConfig::builder()
            .with_safe_defaults()
            .with_root_certificates(roots)
            .with_no_client_auth(),
    )
}

fn load_trust_root(settings: &TlsClientConfig) -> std::io::Result<Vec<Vec<u8>>> {
    let file = File::open(&settings.trust_root)?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::certs(&mut reader)
}
