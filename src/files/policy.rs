//! File access policy
//!
//! Decides whether a resolved target may be served: extension whitelist first,
//! then existence, file type, symlink containment, size and readability.

use super::fs::{FileMetadata, FileSystem};
use super::resolver::{is_within, ResolvedTarget};
use crate::config::FileServerConfig;
use crate::error::FileError;
use std::io;
use std::path::PathBuf;

/// A file cleared for streaming
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServableFile {
    /// Symlink-free path the containment check ran against; the only path opened later
    pub real_path: PathBuf,
    pub metadata: FileMetadata,
}

/// Validate `target` and return what streaming will rely on
pub async fn validate(
    target: &ResolvedTarget,
    config: &FileServerConfig,
    fs: &dyn FileSystem,
) -> Result<ServableFile, FileError> {
    if !config.is_extension_allowed(target.extension.as_deref()) {
        return Err(FileError::InvalidFileType);
    }

    let path = &target.canonical_path;
    let metadata = fs.stat(path).await.map_err(map_stat_error)?;
    if !metadata.is_file {
        return Err(FileError::NotAFile);
    }

    // A symlink inside the base directory may still point outside of it
    let real_path = fs.canonicalize(path).await.map_err(map_stat_error)?;
    if !is_within(&config.base_path, &real_path) {
        return Err(FileError::AccessDenied);
    }

    if metadata.size > config.max_file_size {
        return Err(FileError::FileTooLarge {
            size: metadata.size,
            limit: config.max_file_size,
        });
    }

    fs.check_readable(&real_path)
        .await
        .map_err(|_| FileError::AccessDenied)?;

    Ok(ServableFile {
        real_path,
        metadata,
    })
}

fn map_stat_error(err: io::Error) -> FileError {
    match err.kind() {
        io::ErrorKind::NotFound => FileError::FileNotFound,
        io::ErrorKind::PermissionDenied => FileError::AccessDenied,
        _ => FileError::ValidationError(err.to_string()),
    }
}
