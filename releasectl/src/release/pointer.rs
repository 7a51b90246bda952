//! Active release pointer
//!
//! `{root}/current` is either absent or a symlink to exactly one release.
//! Anything else found at that path is left untouched and reported as
//! [`DeployError::UnsafePointerState`].

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::DeployError;
use crate::filesys::link::{create_symlink, entry_kind, read_symlink, remove_symlink, EntryKind};

/// A swappable symlink to the live release
#[derive(Debug, Clone)]
pub struct ActivePointer {
    path: PathBuf,
}

impl ActivePointer {
    /// Create a pointer reference at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the pointer path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current target, or `None` when the pointer does not exist
    pub async fn target(&self) -> Result<Option<PathBuf>, DeployError> {
        match entry_kind(&self.path).await? {
            EntryKind::Absent => Ok(None),
            EntryKind::Symlink => Ok(Some(read_symlink(&self.path).await?)),
            EntryKind::Directory | EntryKind::File => {
                Err(DeployError::UnsafePointerState(self.path.clone()))
            }
        }
    }

    /// Point at `new_target`.
    ///
    /// Creates the link when absent and replaces it when it is a symlink.
    /// Only the link entry is ever replaced; the previous release stays on
    /// disk.
    pub async fn swap(&self, new_target: &Path) -> Result<(), DeployError> {
        match entry_kind(&self.path).await? {
            EntryKind::Absent => {
                create_symlink(new_target, &self.path).await?;
            }
            EntryKind::Symlink => {
                self.replace(new_target).await?;
            }
            EntryKind::Directory | EntryKind::File => {
                return Err(DeployError::UnsafePointerState(self.path.clone()));
            }
        }

        info!("Active release {} -> {}", self.path.display(), new_target.display());
        Ok(())
    }

    /// Delete the pointer entry without touching what it points at.
    ///
    /// A missing pointer is not an error.
    pub async fn remove(&self) -> Result<(), DeployError> {
        match entry_kind(&self.path).await? {
            EntryKind::Absent => Ok(()),
            EntryKind::Symlink => {
                remove_symlink(&self.path).await?;
                debug!("Removed pointer {}", self.path.display());
                Ok(())
            }
            EntryKind::Directory | EntryKind::File => {
                Err(DeployError::UnsafePointerState(self.path.clone()))
            }
        }
    }

    #[cfg(unix)]
    async fn replace(&self, new_target: &Path) -> Result<(), DeployError> {
        // rename(2) swaps the link in one step, so `current` never goes missing
        let staged = self.staging_path();
        create_symlink(new_target, &staged).await?;

        if let Err(e) = tokio::fs::rename(&staged, &self.path).await {
            if let Err(cleanup) = remove_symlink(&staged).await {
                tracing::warn!("Failed to remove staged link {}: {}", staged.display(), cleanup);
            }
            return Err(e.into());
        }
        Ok(())
    }

    #[cfg(not(unix))]
    async fn replace(&self, new_target: &Path) -> Result<(), DeployError> {
        remove_symlink(&self.path).await?;
        create_symlink(new_target, &self.path).await?;
        Ok(())
    }

    #[cfg(unix)]
    fn staging_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "current".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4()))
    }
}
