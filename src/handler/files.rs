//! File request orchestration
//!
//! Runs one `/files/` request through resolution, validation and range
//! negotiation, answers with either the mapped error or the file response head,
//! and streams the body from a spawned task. The request's audit record travels
//! with it and is committed exactly once, on whichever path ends the request.

use crate::config::FileServerConfig;
use crate::error::FileError;
use crate::files::{self, FileSystem, PumpOutcome, ResolvedTarget, ServableFile};
use crate::http::body::{self, ChannelSink, ResponseBody};
use crate::http::{self, cache, mime, DeliveryPlan, FileHeaders, RequestInfo};
use crate::logger::{self, AccessLog, AuditRecord};
use futures::FutureExt;
use http_body_util::BodyExt;
use hyper::{Method, Response};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use uuid::Uuid;

/// Body chunks buffered between the pump and the connection
const SINK_CAPACITY: usize = 2;

/// Everything known about a request once it is cleared for streaming
struct Prepared {
    target: ResolvedTarget,
    file: ServableFile,
    plan: DeliveryPlan,
}

/// Serves files under the configured base directory
pub struct FileService {
    config: Arc<FileServerConfig>,
    fs: Arc<dyn FileSystem>,
    access_log: Arc<dyn AccessLog>,
}

impl FileService {
    pub fn new(
        config: Arc<FileServerConfig>,
        fs: Arc<dyn FileSystem>,
        access_log: Arc<dyn AccessLog>,
    ) -> Self {
        Self {
            config,
            fs,
            access_log,
        }
    }

    /// Handle one file request
    ///
    /// Always returns a response; failures are mapped through `FileError`.
    pub async fn handle(&self, req: &RequestInfo) -> Response<ResponseBody> {
        let request_id = Uuid::new_v4().to_string();
        let audit = AuditRecord::begin(
            logger::create_access_entry(req, &request_id),
            Arc::clone(&self.access_log),
        );

        if req.method != Method::GET && req.method != Method::HEAD {
            logger::log_debug(&format!("[{request_id}] Method not allowed: {}", req.method));
            let response = http::build_405_response();
            audit.reject(response.status().as_u16(), "Method not allowed");
            return response;
        }

        let prepared = match self.prepare_guarded(req).await {
            Ok(prepared) => prepared,
            Err(err) => {
                report_error(&request_id, req, &err);
                let response = http::build_error_response(&err);
                audit.fail(response.status().as_u16(), 0, &err);
                return response;
            }
        };

        let headers = self.file_headers(&prepared);

        if req.method == Method::HEAD {
            let response = http::build_file_response(&prepared.plan, &headers, body::empty());
            audit.headers_sent(response.status().as_u16());
            return response;
        }

        let (sink, stream_body) = body::channel(SINK_CAPACITY);
        let response = http::build_file_response(&prepared.plan, &headers, stream_body.boxed());
        let status = response.status().as_u16();
        self.spawn_stream(prepared, sink, audit, status);
        response
    }

    /// `prepare` with a panic in any stage turned into `FileError::Internal`
    async fn prepare_guarded(&self, req: &RequestInfo) -> Result<Prepared, FileError> {
        AssertUnwindSafe(self.prepare(req))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(FileError::Internal(panic_message(panic.as_ref()))))
    }

    /// Resolve, validate and negotiate; no response has been committed yet
    async fn prepare(&self, req: &RequestInfo) -> Result<Prepared, FileError> {
        let target = files::resolve(&req.path, &self.config.base_path)?;
        let file = files::validate(&target, &self.config, self.fs.as_ref()).await?;
        let plan = http::negotiate(req.range.as_deref(), file.metadata.size)?;
        Ok(Prepared {
            target,
            file,
            plan,
        })
    }

    fn file_headers(&self, prepared: &Prepared) -> FileHeaders {
        FileHeaders {
            content_type: mime::content_type_for(prepared.target.extension.as_deref()),
            cache_control: cache::CachePolicy::from_max_age(self.config.cache_max_age)
                .to_header_value(),
            last_modified: prepared.file.metadata.modified.map(cache::http_date),
        }
    }

    /// Stream the body in its own task; the status line is already committed
    fn spawn_stream(&self, prepared: Prepared, sink: ChannelSink, audit: AuditRecord, status: u16) {
        let fs = Arc::clone(&self.fs);
        let config = Arc::clone(&self.config);

        tokio::spawn(async move {
            let result = files::pump(
                fs.as_ref(),
                &prepared.file.real_path,
                &prepared.plan,
                &sink,
                config.stream_timeout,
                config.chunk_size,
            )
            .await;

            match result {
                Ok(PumpOutcome::Completed { bytes_sent }) => audit.succeed(status, bytes_sent),
                Ok(PumpOutcome::ClientDisconnected { bytes_sent }) => {
                    logger::log_debug(&format!(
                        "[{}] Client disconnected after {bytes_sent} bytes",
                        audit.request_id()
                    ));
                    audit.client_disconnected(status, bytes_sent);
                }
                Err(err) => {
                    logger::log_error(&format!(
                        "[{}] Streaming {} failed after headers were sent: {err}",
                        audit.request_id(),
                        prepared.file.real_path.display()
                    ));
                    audit.fail(status, 0, &err);
                }
            }
        });
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|msg| (*msg).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    format!("panic while preparing request: {detail}")
}

/// Client errors are expected traffic; server errors carry their detail to the log
fn report_error(request_id: &str, req: &RequestInfo, err: &FileError) {
    if err.is_client_error() {
        logger::log_debug(&format!("[{request_id}] {} {} rejected: {err}", req.method, req.url));
    } else {
        logger::log_error(&format!("[{request_id}] {} {} failed: {err}", req.method, req.url));
    }
}
