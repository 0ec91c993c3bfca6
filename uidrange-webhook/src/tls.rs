//! TLS for the admission listener
//!
//! The API server only calls webhooks over HTTPS. The serving certificate
//! and key are read from PEM files (usually a mounted cert-manager secret)
//! and each accepted connection is handed to hyper through the axum router.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::service::TowerToHyperService;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info, warn};

use crate::shutdown::ShutdownCoordinator;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no certificates found in {}", .0.display())]
    NoCertificates(PathBuf),

    #[error("invalid certificate in {}: {reason}", .path.display())]
    Certificate { path: PathBuf, reason: String },

    #[error("invalid private key in {}: {reason}", .path.display())]
    PrivateKey { path: PathBuf, reason: String },

    #[error("TLS configuration error: {0}")]
    Config(#[from] rustls::Error),
}

/// Build a server config from a PEM certificate chain and private key
pub fn load_server_config(cert_path: &Path, key_path: &Path) -> Result<ServerConfig, TlsError> {
    let certs = parse_certificates(cert_path, &read(cert_path)?)?;
    let key = parse_private_key(key_path, &read(key_path)?)?;

    let mut config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(config)
}

fn read(path: &Path) -> Result<Vec<u8>, TlsError> {
    std::fs::read(path).map_err(|source| TlsError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_certificates(path: &Path, pem: &[u8]) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let certs = CertificateDer::pem_slice_iter(pem)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TlsError::Certificate {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if certs.is_empty() {
        return Err(TlsError::NoCertificates(path.to_path_buf()));
    }

    Ok(certs)
}

fn parse_private_key(path: &Path, pem: &[u8]) -> Result<PrivateKeyDer<'static>, TlsError> {
    PrivateKeyDer::from_pem_slice(pem).map_err(|e| TlsError::PrivateKey {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Accept TLS connections and serve `app` on them until shutdown.
///
/// Open connections get a graceful shutdown and are drained for at most the
/// coordinator's timeout.
pub async fn serve(
    listener: TcpListener,
    config: Arc<ServerConfig>,
    app: Router,
    shutdown: ShutdownCoordinator,
) -> std::io::Result<()> {
    let acceptor = TlsAcceptor::from(config);
    let mut connections = JoinSet::new();
    let stop = shutdown.signal();
    tokio::pin!(stop);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    connections.spawn(serve_connection(
                        stream,
                        peer,
                        acceptor.clone(),
                        app.clone(),
                        shutdown.clone(),
                    ));
                }
                Err(e) => warn!("Failed to accept connection: {}", e),
            },
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            _ = &mut stop => break,
        }
    }

    info!(open = connections.len(), "Draining admission connections");
    let drained = tokio::time::timeout(shutdown.timeout(), async {
        while connections.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        warn!("Connections did not drain within {:?}", shutdown.timeout());
        connections.abort_all();
    }

    Ok(())
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    acceptor: TlsAcceptor,
    app: Router,
    shutdown: ShutdownCoordinator,
) {
    let stream = match acceptor.accept(stream).await {
        Ok(stream) => stream,
        Err(e) => {
            debug!(%peer, "TLS handshake failed: {}", e);
            return;
        }
    };

    let builder = auto::Builder::new(TokioExecutor::new());
    let conn = builder.serve_connection(TokioIo::new(stream), TowerToHyperService::new(app));
    tokio::pin!(conn);

    let stop = shutdown.signal();
    tokio::pin!(stop);

    let finished = tokio::select! {
        result = conn.as_mut() => Some(result),
        _ = &mut stop => None,
    };

    let result = match finished {
        Some(result) => result,
        None => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };

    if let Err(e) = result {
        debug!(%peer, "Connection closed with error: {}", e);
    }
}
