// Configuration types module
// Defines the raw, deserialized configuration structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub files: FilesConfig,
    pub logging: LoggingConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Seconds allowed for a client to send request headers
    pub header_read_timeout: u64,
    /// HTTPS settings; plaintext HTTP when absent
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

/// Certificate and private key, both PEM encoded
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    pub cert_path: String,
    pub key_path: String,
}

/// File delivery configuration, as written in the config file
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FilesConfig {
    pub base_path: String,
    pub allowed_extensions: Vec<String>,
    /// Bytes
    pub max_file_size: u64,
    /// Seconds without forward progress before a transfer is aborted
    pub stream_timeout: u64,
    /// Bytes read from disk per chunk
    pub chunk_size: usize,
    /// `Cache-Control: public, max-age=...` value in seconds
    pub cache_max_age: u32,
    /// Create `base_path` at startup when it does not exist
    #[serde(default = "default_create_base_dir")]
    pub create_base_dir: bool,
}

#[allow(clippy::missing_const_for_fn)]
fn default_create_base_dir() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    /// Access log format (json, combined, common)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Server log file path (optional, stderr if not set)
    #[serde(default)]
    pub server_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "json".to_string()
}
