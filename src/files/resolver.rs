//! Request path resolution
//!
//! Maps the raw `/files/...` request path onto a path under the base directory.
//! Pure string and path computation: nothing here touches the filesystem.

use crate::error::FileError;
use std::path::{Path, PathBuf};

/// Routing prefix of file requests
pub const ROUTE_PREFIX: &str = "/files/";

/// A request path mapped onto the base directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Path as received, prefix stripped, still percent-encoded
    pub raw_path: String,
    /// Percent-decoded and trimmed
    pub decoded_path: String,
    /// Normalized and joined onto the base directory
    pub canonical_path: PathBuf,
    /// Lowercase extension with its leading dot, taken from `decoded_path`
    pub extension: Option<String>,
}

/// Resolve a request path against `base`
///
/// Fails with `AccessDenied` when the path is not a file request, cannot be
/// decoded, or would step outside `base`.
pub fn resolve(request_path: &str, base: &Path) -> Result<ResolvedTarget, FileError> {
    let raw_path = request_path
        .strip_prefix(ROUTE_PREFIX)
        .ok_or(FileError::AccessDenied)?;

    let decoded = urlencoding::decode(raw_path).map_err(|_| FileError::AccessDenied)?;
    let decoded_path = decoded.trim().to_string();
    if decoded_path.contains('\0') {
        return Err(FileError::AccessDenied);
    }

    let relative = normalize(&decoded_path)?;
    let canonical_path = if relative.as_os_str().is_empty() {
        base.to_path_buf()
    } else {
        base.join(relative)
    };
    if !is_within(base, &canonical_path) {
        return Err(FileError::AccessDenied);
    }

    Ok(ResolvedTarget {
        raw_path: raw_path.to_string(),
        extension: extension_of(&decoded_path),
        decoded_path,
        canonical_path,
    })
}

/// Collapse `.` and `..` segments lexically
///
/// Both `/` and `\` separate segments. A `..` that would climb above the
/// starting point is rejected rather than clamped.
fn normalize(path: &str) -> Result<PathBuf, FileError> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop().ok_or(FileError::AccessDenied)?;
            }
            name => segments.push(name),
        }
    }
    Ok(segments.iter().collect())
}

/// True when `candidate` is `base` itself or lies below it
///
/// Comparison is per path component, so `/base-evil/x` is not within `/base`.
pub fn is_within(base: &Path, candidate: &Path) -> bool {
    candidate.starts_with(base)
}

fn extension_of(decoded_path: &str) -> Option<String> {
    Path::new(decoded_path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
}
