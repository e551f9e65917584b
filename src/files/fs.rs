//! Filesystem access used by the file pipeline
//!
//! Kept behind a trait so validation and streaming can be exercised against
//! failure modes (permission errors, files vanishing mid-request) that are
//! awkward to produce on a real disk.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::io::{AsyncRead, AsyncSeekExt};

/// Snapshot of a file's metadata, taken once per request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub size: u64,
    pub is_file: bool,
    pub modified: Option<SystemTime>,
    /// Unix permission bits, when the platform has them
    pub mode: Option<u32>,
}

impl From<std::fs::Metadata> for FileMetadata {
    fn from(meta: std::fs::Metadata) -> Self {
        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            Some(meta.permissions().mode())
        };
        #[cfg(not(unix))]
        let mode = None;

        Self {
            size: meta.len(),
            is_file: meta.is_file(),
            modified: meta.modified().ok(),
            mode,
        }
    }
}

/// Byte stream of an opened file
pub type FileReader = Box<dyn AsyncRead + Send + Unpin>;

/// Filesystem operations the file pipeline depends on
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Metadata of `path`, following symlinks
    async fn stat(&self, path: &Path) -> io::Result<FileMetadata>;

    /// Fully resolved path with symlinks followed
    async fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// Succeeds when the process can open `path` for reading
    async fn check_readable(&self, path: &Path) -> io::Result<()>;

    /// Open `path` positioned at byte `start`
    async fn open_for_read(&self, path: &Path, start: u64) -> io::Result<FileReader>;
}

/// The local disk, through tokio's blocking-pool file API
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn stat(&self, path: &Path) -> io::Result<FileMetadata> {
        tokio::fs::metadata(path).await.map(FileMetadata::from)
    }

    async fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        tokio::fs::canonicalize(path).await
    }

    async fn check_readable(&self, path: &Path) -> io::Result<()> {
        tokio::fs::File::open(path).await.map(drop)
    }

    async fn open_for_read(&self, path: &Path, start: u64) -> io::Result<FileReader> {
        let mut file = tokio::fs::File::open(path).await?;
        if start > 0 {
            file.seek(io::SeekFrom::Start(start)).await?;
        }
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_stat_file_and_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"0123456789").unwrap();

        let meta = LocalFileSystem.stat(&file).await.unwrap();
        assert_eq!(meta.size, 10);
        assert!(meta.is_file);
        assert!(meta.modified.is_some());

        let meta = LocalFileSystem.stat(dir.path()).await.unwrap();
        assert!(!meta.is_file);

        let err = LocalFileSystem
            .stat(&dir.path().join("missing.txt"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_open_at_offset() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"0123456789").unwrap();

        let mut reader = LocalFileSystem.open_for_read(&file, 6).await.unwrap();
        let mut rest = String::new();
        reader.read_to_string(&mut rest).await.unwrap();
        assert_eq!(rest, "6789");
        LocalFileSystem.check_readable(&file).await.unwrap();
    }
}
