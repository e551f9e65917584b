// Connection handling module
// Serves a single accepted connection (plain TCP or TLS) with hyper's HTTP/1.1 server

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsAcceptor;

use crate::handler::{self, FileService};
use crate::logger;

/// Per-connection settings shared by every accepted connection
#[derive(Clone)]
pub struct ConnectionContext {
    pub service: Arc<FileService>,
    pub tls: Option<TlsAcceptor>,
    pub header_read_timeout: Duration,
}

/// Accept a connection and serve it in a spawned task.
///
/// The TLS handshake happens inside the task, so a slow handshake never blocks the accept loop.
pub fn accept_connection(stream: TcpStream, peer_addr: SocketAddr, ctx: &ConnectionContext) {
    logger::log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
    let ctx = ctx.clone();

    tokio::spawn(async move {
        match ctx.tls.clone() {
            Some(acceptor) => {
                let handshake =
                    tokio::time::timeout(ctx.header_read_timeout, acceptor.accept(stream)).await;
                match handshake {
                    Ok(Ok(tls_stream)) => serve_connection(tls_stream, peer_addr, &ctx).await,
                    Ok(Err(e)) => {
                        logger::log_debug(&format!("TLS handshake with {peer_addr} failed: {e}"));
                    }
                    Err(_) => {
                        logger::log_debug(&format!("TLS handshake with {peer_addr} timed out"));
                    }
                }
            }
            None => serve_connection(stream, peer_addr, &ctx).await,
        }
    });
}

/// Serve HTTP/1.1 requests on an established stream until the client closes it
async fn serve_connection<S>(stream: S, peer_addr: SocketAddr, ctx: &ConnectionContext)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let io = TokioIo::new(stream);
    let service = Arc::clone(&ctx.service);

    let mut builder = http1::Builder::new();
    builder
        .keep_alive(true)
        .timer(TokioTimer::new())
        .header_read_timeout(ctx.header_read_timeout);

    let conn = builder.serve_connection(
        io,
        service_fn(move |req| handler::handle_request(req, Arc::clone(&service), Some(peer_addr))),
    );

    if let Err(err) = conn.await {
        logger::log_connection_error(&err);
    }
}
