//! Body streaming
//!
//! Copies the planned byte range from disk into a response sink one chunk at a
//! time. Every open, read and write must make progress within the idle timeout;
//! a closed sink stops the copy at once. The file handle lives only as long as
//! the copy, so it is released on every exit path.

use super::fs::FileSystem;
use crate::error::FileError;
use crate::http::body::{ResponseSink, SinkClosed};
use crate::http::range::DeliveryPlan;
use bytes::BytesMut;
use std::future::Future;
use std::io;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncReadExt;

/// How a transfer ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpOutcome {
    /// Every planned byte was handed to the sink
    Completed { bytes_sent: u64 },
    /// The client went away first
    ClientDisconnected { bytes_sent: u64 },
}

impl PumpOutcome {
    pub const fn bytes_sent(&self) -> u64 {
        match self {
            Self::Completed { bytes_sent } | Self::ClientDisconnected { bytes_sent } => *bytes_sent,
        }
    }
}

/// Stream `plan` of the file at `path` into `sink`
///
/// On `ReadError` or `StreamTimeout` the sink is aborted so the client sees a
/// broken transfer instead of a short body that looks complete.
pub async fn pump(
    fs: &dyn FileSystem,
    path: &Path,
    plan: &DeliveryPlan,
    sink: &dyn ResponseSink,
    idle_timeout: Duration,
    chunk_size: usize,
) -> Result<PumpOutcome, FileError> {
    let mut bytes_sent = 0;

    let transferred = tokio::select! {
        result = transfer(fs, path, plan, sink, idle_timeout, chunk_size, &mut bytes_sent) => {
            Some(result)
        }
        () = sink.closed() => None,
    };

    match transferred {
        None => Ok(PumpOutcome::ClientDisconnected { bytes_sent }),
        Some(Ok(outcome)) => Ok(outcome),
        Some(Err(err)) => {
            sink.abort(io::Error::other(err.to_string()));
            Err(err)
        }
    }
}

async fn transfer(
    fs: &dyn FileSystem,
    path: &Path,
    plan: &DeliveryPlan,
    sink: &dyn ResponseSink,
    idle_timeout: Duration,
    chunk_size: usize,
    bytes_sent: &mut u64,
) -> Result<PumpOutcome, FileError> {
    let read_error = |err: io::Error| FileError::ReadError(format!("{}: {err}", path.display()));

    let reader = within(idle_timeout, fs.open_for_read(path, plan.start()))
        .await?
        .map_err(read_error)?;
    let mut reader = reader.take(plan.content_length());
    let mut remaining = plan.content_length();

    while remaining > 0 {
        let mut chunk = BytesMut::with_capacity(chunk_size);
        let read = within(idle_timeout, reader.read_buf(&mut chunk))
            .await?
            .map_err(read_error)?;
        if read == 0 {
            // Truncated or replaced after validation
            return Err(FileError::ReadError(format!(
                "{}: file ended {remaining} bytes early",
                path.display()
            )));
        }
        remaining -= read as u64;

        match within(idle_timeout, sink.send_chunk(chunk.freeze())).await? {
            Ok(()) => *bytes_sent += read as u64,
            Err(SinkClosed) => {
                return Ok(PumpOutcome::ClientDisconnected {
                    bytes_sent: *bytes_sent,
                })
            }
        }
    }

    Ok(PumpOutcome::Completed {
        bytes_sent: *bytes_sent,
    })
}

/// Run one step of the transfer under the idle timeout
async fn within<T>(idle_timeout: Duration, step: impl Future<Output = T>) -> Result<T, FileError> {
    tokio::time::timeout(idle_timeout, step)
        .await
        .map_err(|_| FileError::StreamTimeout(idle_timeout.as_secs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::fs::LocalFileSystem;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        data: Mutex<Vec<u8>>,
        chunks: AtomicUsize,
        aborted: AtomicBool,
        /// Report the receiver gone after this many chunks
        close_after: Option<usize>,
        send_delay: Option<Duration>,
        closed_now: bool,
    }

    #[async_trait]
    impl ResponseSink for RecordingSink {
        async fn send_chunk(&self, chunk: Bytes) -> Result<(), SinkClosed> {
            if let Some(delay) = self.send_delay {
                tokio::time::sleep(delay).await;
            }
            let n = self.chunks.fetch_add(1, Ordering::SeqCst);
            if self.close_after.is_some_and(|limit| n >= limit) {
                return Err(SinkClosed);
            }
            self.data.lock().unwrap().extend_from_slice(&chunk);
            Ok(())
        }

        async fn closed(&self) {
            if !self.closed_now {
                std::future::pending::<()>().await;
            }
        }

        fn abort(&self, _error: io::Error) {
            self.aborted.store(true, Ordering::SeqCst);
        }
    }

    fn fixture() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"0123456789").unwrap();
        (dir, path)
    }

    const IDLE: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_full_transfer_in_chunks() {
        let (_dir, path) = fixture();
        let sink = RecordingSink::default();
        let plan = DeliveryPlan::Full { size: 10 };

        let outcome = pump(&LocalFileSystem, &path, &plan, &sink, IDLE, 4).await.unwrap();
        assert_eq!(outcome, PumpOutcome::Completed { bytes_sent: 10 });
        assert_eq!(&sink.data.lock().unwrap()[..], b"0123456789");
        assert_eq!(sink.chunks.load(Ordering::SeqCst), 3);
        assert!(!sink.aborted.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_partial_transfer() {
        let (_dir, path) = fixture();
        let sink = RecordingSink::default();
        let plan = DeliveryPlan::Partial { start: 2, end: 5, size: 10 };

        let outcome = pump(&LocalFileSystem, &path, &plan, &sink, IDLE, 64).await.unwrap();
        assert_eq!(outcome.bytes_sent(), 4);
        assert_eq!(&sink.data.lock().unwrap()[..], b"2345");
    }

    #[tokio::test]
    async fn test_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, b"").unwrap();
        let sink = RecordingSink::default();

        let outcome = pump(&LocalFileSystem, &path, &DeliveryPlan::Full { size: 0 }, &sink, IDLE, 4)
            .await
            .unwrap();
        assert_eq!(outcome, PumpOutcome::Completed { bytes_sent: 0 });
        assert_eq!(sink.chunks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_client_disconnect_on_write() {
        let (_dir, path) = fixture();
        let sink = RecordingSink {
            close_after: Some(1),
            ..Default::default()
        };

        let plan = DeliveryPlan::Full { size: 10 };
        let outcome = pump(&LocalFileSystem, &path, &plan, &sink, IDLE, 4).await.unwrap();
        assert_eq!(outcome, PumpOutcome::ClientDisconnected { bytes_sent: 4 });
        assert!(!sink.aborted.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_client_disconnect_while_blocked() {
        let (_dir, path) = fixture();
        let sink = RecordingSink {
            send_delay: Some(Duration::from_secs(3600)),
            closed_now: true,
            ..Default::default()
        };

        let plan = DeliveryPlan::Full { size: 10 };
        let outcome = pump(&LocalFileSystem, &path, &plan, &sink, IDLE, 4).await.unwrap();
        assert_eq!(outcome, PumpOutcome::ClientDisconnected { bytes_sent: 0 });
    }

    #[tokio::test]
    async fn test_stalled_sink_times_out() {
        let (_dir, path) = fixture();
        let sink = RecordingSink {
            send_delay: Some(Duration::from_millis(500)),
            ..Default::default()
        };

        let result = pump(
            &LocalFileSystem,
            &path,
            &DeliveryPlan::Full { size: 10 },
            &sink,
            Duration::from_millis(50),
            4,
        )
        .await;
        assert!(matches!(result, Err(FileError::StreamTimeout(_))));
        assert!(sink.aborted.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_truncated_file_is_read_error() {
        let (_dir, path) = fixture();
        let sink = RecordingSink::default();
        // Plan made before the file shrank
        let plan = DeliveryPlan::Full { size: 20 };

        let result = pump(&LocalFileSystem, &path, &plan, &sink, IDLE, 8).await;
        assert!(matches!(result, Err(FileError::ReadError(_))));
        assert!(sink.aborted.load(Ordering::SeqCst));
        assert_eq!(&sink.data.lock().unwrap()[..], b"0123456789");
    }

    #[tokio::test]
    async fn test_deleted_file_is_read_error() {
        let (_dir, path) = fixture();
        std::fs::remove_file(&path).unwrap();
        let sink = RecordingSink::default();

        let plan = DeliveryPlan::Full { size: 10 };
        let result = pump(&LocalFileSystem, &path, &plan, &sink, IDLE, 4).await;
        assert!(matches!(result, Err(FileError::ReadError(_))));
    }
}
