// TLS module
// Loads the PEM certificate chain and private key into a rustls acceptor

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

use crate::config::TlsConfig;
use crate::error::StartupError;

/// Build the TLS acceptor for the configured certificate and key
pub fn load_acceptor(tls: &TlsConfig) -> Result<TlsAcceptor, StartupError> {
    let certs = load_certs(&tls.cert_path)?;
    let key = load_private_key(&tls.key_path)?;

    let mut config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn load_certs(path: &str) -> Result<Vec<CertificateDer<'static>>, StartupError> {
    let mut reader = BufReader::new(File::open(path).map_err(|e| {
        StartupError::Tls(format!("cannot open certificate {path}: {e}"))
    })?);
    let certs = rustls_pemfile::certs(&mut reader).collect::<Result<Vec<_>, _>>()?;
    if certs.is_empty() {
        return Err(StartupError::Tls(format!("no certificates found in {path}")));
    }
    Ok(certs)
}

fn load_private_key(path: &str) -> Result<PrivateKeyDer<'static>, StartupError> {
    let mut reader = BufReader::new(File::open(path).map_err(|e| {
        StartupError::Tls(format!("cannot open private key {path}: {e}"))
    })?);
    rustls_pemfile::private_key(&mut reader)?
        .ok_or_else(|| StartupError::Tls(format!("no private key found in {path}")))
}
