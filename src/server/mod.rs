// Server module entry point
// Listener setup, TLS, connection serving and the accept loop

pub mod connection;
pub mod listener;
pub mod signal;
pub mod tls;

use std::future::Future;

use tokio::net::TcpListener;

pub use connection::{accept_connection, ConnectionContext};
pub use listener::create_reusable_listener;
pub use signal::shutdown_signal;

/// Accept connections until `shutdown` resolves
///
/// In-flight connections keep running on their own tasks; the runtime drops
/// whatever is left when `main` returns.
pub async fn run_server_loop(
    listener: TcpListener,
    ctx: ConnectionContext,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &ctx),
                    Err(e) => {
                        crate::logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }
            () = &mut shutdown => {
                crate::logger::log_info("Listener closed, no longer accepting connections");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileServerConfig;
    use crate::files::LocalFileSystem;
    use crate::handler::FileService;
    use crate::logger::{AccessLog, AccessLogEntry};
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[derive(Default)]
    struct MemoryLog(Mutex<Vec<AccessLogEntry>>);

    impl AccessLog for MemoryLog {
        fn log_access(&self, entry: &AccessLogEntry) {
            self.0.lock().unwrap().push(entry.clone());
        }
    }

    #[tokio::test]
    async fn test_serves_range_over_tcp() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"0123456789").unwrap();
        let config = FileServerConfig {
            base_path: dir.path().canonicalize().unwrap(),
            allowed_extensions: HashSet::from([".txt".to_string()]),
            max_file_size: 1024,
            stream_timeout: Duration::from_secs(5),
            chunk_size: 4,
            cache_max_age: 0,
        };
        let log = Arc::new(MemoryLog::default());
        let ctx = ConnectionContext {
            service: Arc::new(FileService::new(
                Arc::new(config),
                Arc::new(LocalFileSystem),
                Arc::clone(&log) as Arc<dyn AccessLog>,
            )),
            tls: None,
            header_read_timeout: Duration::from_secs(5),
        };

        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(run_server_loop(listener, ctx, async {
            let _ = stop_rx.await;
        }));

        let mut client = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = "GET /files/a.txt HTTP/1.1\r\n\
                       Host: localhost\r\n\
                       Range: bytes=2-5\r\n\
                       Connection: close\r\n\r\n";
        client.write_all(request.as_bytes()).await.unwrap();
        let mut raw = String::new();
        client.read_to_string(&mut raw).await.unwrap();

        assert!(raw.starts_with("HTTP/1.1 206"));
        assert!(raw.to_ascii_lowercase().contains("content-range: bytes 2-5/10"));
        assert!(raw.ends_with("\r\n\r\n2345"));

        stop_tx.send(()).unwrap();
        server.await.unwrap();
    }
}
