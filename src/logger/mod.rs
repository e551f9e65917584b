//! Logger module
//!
//! Provides logging utilities for the file server including:
//! - Server lifecycle logging
//! - Access (audit) logging with multiple formats
//! - Leveled diagnostic logging
//! - File-based logging support

mod audit;
mod format;
pub mod writer;

pub use audit::{
    AccessLog, AuditRecord, WriterAccessLog, RESULT_CLIENT_DISCONNECTED, RESULT_HEADERS_SENT,
    RESULT_SUCCESS, RESULT_UNKNOWN,
};
pub use format::{AccessLogEntry, AccessStatus};
pub use writer::Level;

use crate::config::Config;
use crate::http::RequestInfo;
use chrono::{SecondsFormat, Utc};
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.server_log_file.as_deref(),
        Level::parse(&config.logging.level),
    )
}

/// Write a leveled line to the server log
fn write_server(level: Level, message: &str) {
    let line = format!(
        "{} [{}] {message}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        level.as_str()
    );
    match writer::get() {
        Some(w) if w.enabled(level) => w.write_server(&line),
        Some(_) => {}
        None if level >= Level::Info => eprintln!("{line}"),
        None => {}
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

/// Build the pending access entry for a request
pub fn create_access_entry(req: &RequestInfo, request_id: &str) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        request_id.to_string(),
        req.method.to_string(),
        req.url.clone(),
        req.client_ip
            .map_or_else(|| "-".to_string(), |addr| addr.ip().to_string()),
    );
    entry.user_agent.clone_from(&req.user_agent);
    if let Some(referrer) = &req.referrer {
        entry.referrer.clone_from(referrer);
    }
    entry
}

pub fn log_debug(message: &str) {
    write_server(Level::Debug, message);
}

pub fn log_info(message: &str) {
    write_server(Level::Info, message);
}

pub fn log_warning(message: &str) {
    write_server(Level::Warn, message);
}

pub fn log_error(message: &str) {
    write_server(Level::Error, message);
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, base_path: &std::path::Path) {
    let scheme = if config.server.tls.is_some() { "https" } else { "http" };
    log_info("======================================");
    log_info("File server started successfully");
    log_info(&format!("Listening on: {scheme}://{addr}"));
    log_info(&format!("Serving files from: {}", base_path.display()));
    log_info(&format!(
        "Allowed extensions: {}",
        config.files.allowed_extensions.join(", ")
    ));
    log_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        log_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        log_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.server_log_file {
        log_info(&format!("Server log: {path}"));
    }
    log_info("======================================");
}

pub fn log_request(req: &RequestInfo) {
    log_info(&format!("{} {}", req.method, req.url));
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    log_warning(&format!("Failed to serve connection: {err}"));
}
