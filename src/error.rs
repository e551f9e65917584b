//! Error types
//!
//! `FileError` is the closed set of outcomes the file-delivery pipeline can fail with.
//! Each variant maps to exactly one HTTP status and client-facing message; the detail
//! carried by server-side variants is for the server log only.

use hyper::StatusCode;
use thiserror::Error;

/// Failure kinds of the file-delivery pipeline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FileError {
    #[error("access denied")]
    AccessDenied,

    #[error("file type not allowed")]
    InvalidFileType,

    #[error("file not found")]
    FileNotFound,

    #[error("requested path is not a file")]
    NotAFile,

    #[error("file size {size} exceeds limit {limit}")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("range not satisfiable for size {size}")]
    RangeNotSatisfiable { size: u64 },

    #[error("read error: {0}")]
    ReadError(String),

    #[error("no progress within {0} seconds")]
    StreamTimeout(u64),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("initialization error: {0}")]
    InitializationError(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl FileError {
    /// HTTP status code for this error
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::AccessDenied | Self::InvalidFileType => StatusCode::FORBIDDEN,
            Self::FileNotFound => StatusCode::NOT_FOUND,
            Self::NotAFile => StatusCode::BAD_REQUEST,
            Self::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::StreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::ReadError(_)
            | Self::ValidationError(_)
            | Self::InitializationError(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client and recorded as the audit result
    pub fn client_message(&self) -> String {
        match self {
            Self::AccessDenied => "Access denied".to_string(),
            Self::InvalidFileType => "File type not allowed".to_string(),
            Self::FileNotFound => "File not found".to_string(),
            Self::NotAFile => "Requested path is not a file".to_string(),
            Self::FileTooLarge { .. } => "File exceeds maximum size limit".to_string(),
            Self::RangeNotSatisfiable { size } => format!("Content-Range: bytes */{size}"),
            Self::ReadError(_) => "Error reading file".to_string(),
            Self::StreamTimeout(_) => "Stream timeout".to_string(),
            Self::ValidationError(_) => "Error validating request".to_string(),
            Self::InitializationError(_) => "Service initialization error".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// Expected outcomes caused by the request itself, not by the server
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::AccessDenied
                | Self::InvalidFileType
                | Self::FileNotFound
                | Self::NotAFile
                | Self::FileTooLarge { .. }
                | Self::RangeNotSatisfiable { .. }
        )
    }
}

/// Errors that stop the server from starting
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(String),
}

impl From<tokio_rustls::rustls::Error> for StartupError {
    fn from(err: tokio_rustls::rustls::Error) -> Self {
        Self::Tls(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_table() {
        let cases = [
            (FileError::AccessDenied, 403, "Access denied"),
            (FileError::InvalidFileType, 403, "File type not allowed"),
            (FileError::FileNotFound, 404, "File not found"),
            (FileError::NotAFile, 400, "Requested path is not a file"),
            (
                FileError::FileTooLarge { size: 10, limit: 5 },
                413,
                "File exceeds maximum size limit",
            ),
            (
                FileError::RangeNotSatisfiable { size: 10 },
                416,
                "Content-Range: bytes */10",
            ),
            (FileError::ReadError("eof".into()), 500, "Error reading file"),
            (FileError::StreamTimeout(30), 504, "Stream timeout"),
            (
                FileError::ValidationError("EIO".into()),
                500,
                "Error validating request",
            ),
            (
                FileError::InitializationError("no base".into()),
                500,
                "Service initialization error",
            ),
            (FileError::Internal("boom".into()), 500, "Internal server error"),
        ];

        for (err, status, message) in cases {
            assert_eq!(err.status_code().as_u16(), status, "{err:?}");
            assert_eq!(err.client_message(), message, "{err:?}");
        }
    }

    #[test]
    fn test_detail_stays_out_of_client_message() {
        let err = FileError::ReadError("/srv/secret/path: Input/output error".into());
        assert!(!err.client_message().contains("/srv/secret"));
        assert!(err.to_string().contains("/srv/secret"));
    }

    #[test]
    fn test_client_error_classification() {
        assert!(FileError::FileNotFound.is_client_error());
        assert!(FileError::RangeNotSatisfiable { size: 0 }.is_client_error());
        assert!(!FileError::StreamTimeout(1).is_client_error());
        assert!(!FileError::ValidationError(String::new()).is_client_error());
    }
}
