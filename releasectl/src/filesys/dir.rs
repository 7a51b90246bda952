//! Directory operations

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::errors::DeployError;

/// A directory wrapper with path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dir {
    path: PathBuf,
}

impl Dir {
    /// Create a new directory reference
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the directory path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the directory exists
    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Create the directory (and parents). Succeeds if it already exists.
    pub async fn create(&self) -> Result<(), DeployError> {
        fs::create_dir_all(&self.path).await?;
        Ok(())
    }

    /// Make sure the path is a directory, creating it when absent.
    ///
    /// Fails with `NotADirectory` when something other than a directory
    /// already occupies the path.
    pub async fn ensure(&self) -> Result<(), DeployError> {
        match fs::metadata(&self.path).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(DeployError::NotADirectory(self.path.clone())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => self.create().await,
            Err(e) => Err(e.into()),
        }
    }

    /// Verify the directory is writable by creating and removing a sentinel file
    pub async fn probe_writable(&self) -> Result<(), DeployError> {
        let sentinel = self
            .path
            .join(format!(".releasectl-write-test-{}", uuid::Uuid::new_v4()));

        let to_denied = |source: io::Error| DeployError::PermissionDenied {
            path: self.path.clone(),
            source,
        };

        fs::write(&sentinel, b"").await.map_err(to_denied)?;
        fs::remove_file(&sentinel).await.map_err(to_denied)?;
        Ok(())
    }

    /// Return the absolute form of this directory, resolving symlinks
    pub async fn canonicalize(&self) -> Result<Dir, DeployError> {
        Ok(Dir::new(fs::canonicalize(&self.path).await?))
    }

    /// Get a subdirectory
    pub fn subdir(&self, name: &str) -> Dir {
        Dir::new(self.path.join(name))
    }
}
