//! Access log format module
//!
//! Supports multiple log formats:
//! - `json` (one JSON object per line, the default)
//! - `combined` (Apache/Nginx combined format)
//! - `common` (Common Log Format - CLF)

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle state of an access log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessStatus {
    Pending,
    Success,
    Error,
}

/// Audit record of one file request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLogEntry {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub url: String,
    pub client_ip: String,
    pub user_agent: Option<String>,
    /// Referer header, `direct` when absent
    pub referrer: String,
    pub status: AccessStatus,
    /// Human-readable outcome
    pub result: Option<String>,
    pub http_status: u16,
    pub bytes_sent: u64,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl AccessLogEntry {
    /// Create a pending entry stamped with the current time
    pub fn new(request_id: String, method: String, url: String, client_ip: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
            method,
            url,
            client_ip,
            user_agent: None,
            referrer: "direct".to_string(),
            status: AccessStatus::Pending,
            result: None,
            http_status: 0,
            bytes_sent: 0,
            duration_ms: 0,
            error_detail: None,
        }
    }

    /// Format the log entry according to the specified format
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => self.format_combined(),
            "common" => self.format_common(),
            _ => self.format_json(),
        }
    }

    /// Apache/Nginx Combined Log Format, with request id and outcome appended
    fn format_combined(&self) -> String {
        format!(
            "{} \"{}\" \"{}\" {} {}ms \"{}\"",
            self.format_common(),
            self.referrer,
            self.user_agent.as_deref().unwrap_or("-"),
            self.request_id,
            self.duration_ms,
            self.result.as_deref().unwrap_or("-"),
        )
    }

    /// Common Log Format (CLF)
    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{} {}\" {} {}",
            self.client_ip,
            self.timestamp.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.url,
            self.http_status,
            self.bytes_sent,
        )
    }

    fn format_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"requestId":{:?},"status":"error","result":"unserializable entry: {e}"}}"#,
                self.request_id
            )
        })
    }
}
