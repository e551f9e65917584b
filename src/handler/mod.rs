//! Request handler module
//!
//! Routing dispatch and the file request orchestration behind `/files/`.

pub mod files;
pub mod router;

// Re-export main entry points
pub use files::FileService;
pub use router::handle_request;
