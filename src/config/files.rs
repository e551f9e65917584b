// Validated file-delivery settings
// Built once at startup from `FilesConfig` and shared read-only by every request

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::FilesConfig;
use crate::error::StartupError;
use crate::logger;

/// Immutable settings the file-delivery pipeline runs against
#[derive(Debug, Clone)]
pub struct FileServerConfig {
    /// Canonical absolute directory all served files must live under
    pub base_path: PathBuf,
    /// Lowercase extensions including the leading dot, e.g. `.txt`
    pub allowed_extensions: HashSet<String>,
    pub max_file_size: u64,
    /// Per-chunk idle timeout
    pub stream_timeout: Duration,
    pub chunk_size: usize,
    pub cache_max_age: u32,
}

impl FileServerConfig {
    pub fn is_extension_allowed(&self, extension: Option<&str>) -> bool {
        extension.is_some_and(|ext| self.allowed_extensions.contains(ext))
    }
}

/// Normalize a configured extension to lowercase with a leading dot
pub fn normalize_extension(ext: &str) -> Option<String> {
    let ext = ext.trim().trim_start_matches('.');
    if ext.is_empty() {
        return None;
    }
    Some(format!(".{}", ext.to_lowercase()))
}

impl FilesConfig {
    /// Check the settings and resolve the base directory
    ///
    /// Creates the base directory when it is missing and `create_base_dir` is set.
    pub fn validate(&self) -> Result<FileServerConfig, StartupError> {
        if self.max_file_size == 0 {
            return Err(StartupError::InvalidConfig(
                "files.max_file_size must be greater than zero".to_string(),
            ));
        }
        if self.stream_timeout == 0 {
            return Err(StartupError::InvalidConfig(
                "files.stream_timeout must be greater than zero".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(StartupError::InvalidConfig(
                "files.chunk_size must be greater than zero".to_string(),
            ));
        }

        let allowed_extensions: HashSet<String> = self
            .allowed_extensions
            .iter()
            .filter_map(|ext| normalize_extension(ext))
            .collect();
        if allowed_extensions.is_empty() {
            logger::log_warning(
                "files.allowed_extensions is empty, every file request will be rejected",
            );
        }

        let base_path = prepare_base_directory(Path::new(&self.base_path), self.create_base_dir)?;

        Ok(FileServerConfig {
            base_path,
            allowed_extensions,
            max_file_size: self.max_file_size,
            stream_timeout: Duration::from_secs(self.stream_timeout),
            chunk_size: self.chunk_size,
            cache_max_age: self.cache_max_age,
        })
    }
}

/// Ensure the base directory exists and is a readable directory, returning its canonical path
fn prepare_base_directory(path: &Path, create: bool) -> Result<PathBuf, StartupError> {
    if path.exists() {
        logger::log_info(&format!("Base directory {} already exists", path.display()));
    } else if create {
        std::fs::create_dir_all(path)?;
        logger::log_info(&format!("Base directory {} created", path.display()));
    } else {
        return Err(StartupError::InvalidConfig(format!(
            "base directory {} does not exist",
            path.display()
        )));
    }

    let canonical = path.canonicalize()?;
    if !canonical.is_dir() {
        return Err(StartupError::InvalidConfig(format!(
            "base path {} is not a directory",
            canonical.display()
        )));
    }
    // Listing the directory proves it is readable by this process
    std::fs::read_dir(&canonical)?;

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files_config(base: &Path) -> FilesConfig {
        FilesConfig {
            base_path: base.to_string_lossy().into_owned(),
            allowed_extensions: vec!["TXT".to_string(), ".Pdf".to_string(), " ".to_string()],
            max_file_size: 1024,
            stream_timeout: 5,
            chunk_size: 16,
            cache_max_age: 60,
            create_base_dir: true,
        }
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension("txt").as_deref(), Some(".txt"));
        assert_eq!(normalize_extension(".MP4").as_deref(), Some(".mp4"));
        assert_eq!(normalize_extension(""), None);
        assert_eq!(normalize_extension("."), None);
    }

    #[test]
    fn test_validate_creates_and_canonicalizes_base() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("nested").join("shared");
        let cfg = files_config(&base).validate().unwrap();

        assert!(base.is_dir());
        assert_eq!(cfg.base_path, base.canonicalize().unwrap());
        assert!(cfg.is_extension_allowed(Some(".txt")));
        assert!(cfg.is_extension_allowed(Some(".pdf")));
        assert!(!cfg.is_extension_allowed(Some(".TXT")));
        assert!(!cfg.is_extension_allowed(None));
        assert_eq!(cfg.allowed_extensions.len(), 2);
        assert_eq!(cfg.stream_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_validate_missing_base_without_create() {
        let tmp = tempfile::tempdir().unwrap();
        let mut raw = files_config(&tmp.path().join("absent"));
        raw.create_base_dir = false;
        assert!(matches!(raw.validate(), Err(StartupError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_file_as_base() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            files_config(&file).validate(),
            Err(StartupError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let tmp = tempfile::tempdir().unwrap();
        let mut raw = files_config(tmp.path());
        raw.stream_timeout = 0;
        assert!(raw.validate().is_err());

        let mut raw = files_config(tmp.path());
        raw.chunk_size = 0;
        assert!(raw.validate().is_err());
    }
}
