//! Secure file server
//!
//! Serves files from one base directory over HTTPS with extension whitelisting,
//! size limits, single byte-range support and a per-request audit log.

pub mod config;
pub mod error;
pub mod files;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use error::{FileError, StartupError};
