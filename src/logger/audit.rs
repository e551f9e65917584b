//! Audit record module
//!
//! An `AuditRecord` wraps the pending `AccessLogEntry` of one request. Every terminal
//! method consumes the record and flushes the entry, and `Drop` flushes whatever was
//! never committed, so each request produces exactly one access log call.

use std::sync::Arc;
use std::time::Instant;

use super::format::{AccessLogEntry, AccessStatus};
use crate::error::FileError;

/// Audit outcome for a transfer that reached the end of the file
pub const RESULT_SUCCESS: &str = "File streamed successfully";
/// Audit outcome for a HEAD request, which carries no body
pub const RESULT_HEADERS_SENT: &str = "Headers sent";
/// Audit outcome for a transfer the client abandoned
pub const RESULT_CLIENT_DISCONNECTED: &str = "client disconnected";
/// Audit outcome when the request never reached a terminal state
pub const RESULT_UNKNOWN: &str = "Request handled with unknown outcome";

/// Destination of finished access log entries
///
/// Implementations must be best-effort: a failure to persist an entry is never
/// reported back to the request.
pub trait AccessLog: Send + Sync {
    fn log_access(&self, entry: &AccessLogEntry);
}

/// Access log backed by the global log writer
#[derive(Debug, Clone)]
pub struct WriterAccessLog {
    format: String,
}

impl WriterAccessLog {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }
}

impl AccessLog for WriterAccessLog {
    fn log_access(&self, entry: &AccessLogEntry) {
        super::write_access(&entry.format(&self.format));
    }
}

/// Pending access log entry of one request
pub struct AuditRecord {
    entry: Option<AccessLogEntry>,
    request_id: String,
    started: Instant,
    sink: Arc<dyn AccessLog>,
}

impl AuditRecord {
    pub fn begin(entry: AccessLogEntry, sink: Arc<dyn AccessLog>) -> Self {
        Self {
            request_id: entry.request_id.clone(),
            entry: Some(entry),
            started: Instant::now(),
            sink,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// The whole planned body reached the client
    pub fn succeed(self, http_status: u16, bytes_sent: u64) {
        self.commit(
            AccessStatus::Success,
            RESULT_SUCCESS.to_string(),
            http_status,
            bytes_sent,
            None,
        );
    }

    /// A HEAD response went out; no body bytes were sent
    pub fn headers_sent(self, http_status: u16) {
        self.commit(
            AccessStatus::Success,
            RESULT_HEADERS_SENT.to_string(),
            http_status,
            0,
            None,
        );
    }

    /// The client went away mid-transfer; not a server fault
    pub fn client_disconnected(self, http_status: u16, bytes_sent: u64) {
        self.commit(
            AccessStatus::Success,
            RESULT_CLIENT_DISCONNECTED.to_string(),
            http_status,
            bytes_sent,
            None,
        );
    }

    /// The request failed; `http_status` is what the client actually received
    pub fn fail(self, http_status: u16, bytes_sent: u64, err: &FileError) {
        self.commit(
            AccessStatus::Error,
            err.client_message(),
            http_status,
            bytes_sent,
            Some(err.to_string()),
        );
    }

    /// The request was refused before the pipeline ran
    pub fn reject(self, http_status: u16, message: &str) {
        self.commit(AccessStatus::Error, message.to_string(), http_status, 0, None);
    }

    fn commit(
        mut self,
        status: AccessStatus,
        result: String,
        http_status: u16,
        bytes_sent: u64,
        error_detail: Option<String>,
    ) {
        if let Some(mut entry) = self.entry.take() {
            entry.status = status;
            entry.result = Some(result);
            entry.http_status = http_status;
            entry.bytes_sent = bytes_sent;
            entry.error_detail = error_detail;
            self.flush(entry);
        }
    }

    fn flush(&self, mut entry: AccessLogEntry) {
        entry.duration_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.sink.log_access(&entry);
    }
}

impl Drop for AuditRecord {
    fn drop(&mut self) {
        if let Some(mut entry) = self.entry.take() {
            entry.status = AccessStatus::Error;
            entry.result = Some(RESULT_UNKNOWN.to_string());
            self.flush(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryLog(Mutex<Vec<AccessLogEntry>>);

    impl AccessLog for MemoryLog {
        fn log_access(&self, entry: &AccessLogEntry) {
            self.0.lock().unwrap().push(entry.clone());
        }
    }

    fn record(log: &Arc<MemoryLog>) -> AuditRecord {
        let entry = AccessLogEntry::new(
            "req-1".to_string(),
            "GET".to_string(),
            "/files/a.txt".to_string(),
            "127.0.0.1".to_string(),
        );
        AuditRecord::begin(entry, Arc::clone(log) as Arc<dyn AccessLog>)
    }

    #[test]
    fn test_succeed_logs_once() {
        let log = Arc::new(MemoryLog::default());
        let rec = record(&log);
        assert_eq!(rec.request_id(), "req-1");
        rec.succeed(206, 4);

        let entries = log.0.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, AccessStatus::Success);
        assert_eq!(entries[0].result.as_deref(), Some(RESULT_SUCCESS));
        assert_eq!(entries[0].http_status, 206);
        assert_eq!(entries[0].bytes_sent, 4);
    }

    #[test]
    fn test_headers_sent_is_not_a_transfer() {
        let log = Arc::new(MemoryLog::default());
        record(&log).headers_sent(200);

        let entries = log.0.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, AccessStatus::Success);
        assert_eq!(entries[0].result.as_deref(), Some(RESULT_HEADERS_SENT));
        assert_eq!(entries[0].bytes_sent, 0);
    }

    #[test]
    fn test_fail_records_message_and_detail() {
        let log = Arc::new(MemoryLog::default());
        record(&log).fail(500, 0, &FileError::ValidationError("EIO".to_string()));

        let entries = log.0.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, AccessStatus::Error);
        assert_eq!(entries[0].result.as_deref(), Some("Error validating request"));
        assert_eq!(entries[0].error_detail.as_deref(), Some("validation error: EIO"));
    }

    #[test]
    fn test_dropped_record_still_logs() {
        let log = Arc::new(MemoryLog::default());
        drop(record(&log));

        let entries = log.0.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, AccessStatus::Error);
        assert_eq!(entries[0].result.as_deref(), Some(RESULT_UNKNOWN));
    }

    #[test]
    fn test_record_logged_when_task_panics() {
        let log = Arc::new(MemoryLog::default());
        let rec = record(&log);
        let handle = std::thread::spawn(move || {
            let _rec = rec;
            panic!("stage blew up");
        });
        assert!(handle.join().is_err());
        assert_eq!(log.0.lock().unwrap().len(), 1);
    }
}
