//! Filesystem seam for the commit pipeline.
//!
//! Every file operation the orchestrator performs goes through [`FileOps`],
//! so tests can substitute an implementation that fails at a chosen step.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

/// Asynchronous file operations used by the commit pipeline.
#[async_trait]
pub trait FileOps: Send + Sync {
    /// Create a single directory. Fails with `AlreadyExists` if it is taken.
    async fn create_dir(&self, path: &Path) -> io::Result<()>;

    async fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Whether anything (file, directory, or link) exists at `path`.
    async fn exists(&self, path: &Path) -> bool;

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Copy file contents, returning the number of bytes written.
    async fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;

    async fn remove_file(&self, path: &Path) -> io::Result<()>;

    async fn file_size(&self, path: &Path) -> io::Result<u64>;

    /// Replace `path` with `contents` so readers never see a partial file.
    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    async fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// [`FileOps`] backed by `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFs;

#[async_trait]
impl FileOps for TokioFs {
    async fn create_dir(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir(path).await
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::symlink_metadata(path).await.is_ok()
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        tokio::fs::rename(from, to).await
    }

    async fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        tokio::fs::copy(from, to).await
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }

    async fn file_size(&self, path: &Path) -> io::Result<u64> {
        Ok(tokio::fs::metadata(path).await?.len())
    }

    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let tmp = temp_path_for(path);
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, path).await
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }
}

/// Sibling path used while writing `path` atomically.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
