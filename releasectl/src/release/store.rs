//! Release store
//!
//! Owns the deployment root: validates it, allocates release directories and
//! reads which release is currently active. It never deletes a release.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::errors::DeployError;
use crate::models::release::Release;
use crate::release::pointer::ActivePointer;
use crate::storage::layout::ReleaseLayout;
use crate::utils::strip_trailing_separators;

/// Release store bound to a validated deployment root
#[derive(Debug, Clone)]
pub struct ReleaseStore {
    layout: ReleaseLayout,
}

impl ReleaseStore {
    /// Prepare `root` for deployments and open a store on it.
    ///
    /// Creates the root when missing, rejects a root that is not a directory,
    /// probes it for writability and makes sure `releases/` exists. Calling
    /// it again on a prepared root is a no-op.
    pub async fn ensure_root(root: impl AsRef<Path>) -> Result<Self, DeployError> {
        let root = root.as_ref();
        let root_dir = ReleaseLayout::new(root).root_dir();

        root_dir.ensure().await?;
        root_dir.probe_writable().await?;

        let layout = ReleaseLayout::new(root_dir.canonicalize().await?.path());
        layout.releases_dir().create().await?;

        debug!("Deployment root ready at {}", layout.root.display());
        Ok(Self { layout })
    }

    /// Get the layout of the deployment root
    pub fn layout(&self) -> &ReleaseLayout {
        &self.layout
    }

    /// Pointer to the active release
    pub fn active_pointer(&self) -> ActivePointer {
        ActivePointer::new(self.layout.current_link())
    }

    /// Create (or reuse) the directory for release `id`.
    ///
    /// Content is not populated here. Allocating an id twice returns the same
    /// path so retried pipeline runs do not fail.
    pub async fn allocate(&self, id: &str) -> Result<Release, DeployError> {
        if id.is_empty() || id.contains(['/', '\\']) || id == "." || id == ".." {
            return Err(DeployError::InputValidation(format!(
                "invalid release id '{}'",
                id
            )));
        }

        let dir = self.layout.release_dir(id);
        if dir.exists().await {
            debug!("Release directory {} already exists, reusing it", dir.path().display());
        }
        dir.create().await?;

        info!("Allocated release {} at {}", id, dir.path().display());
        Ok(Release {
            id: id.to_string(),
            path: dir.path().to_path_buf(),
            created_at: Utc::now(),
        })
    }

    /// Path of the currently active release, if any.
    ///
    /// A pointer that exists but cannot be read as a symlink is logged and
    /// treated as "no previous release".
    pub async fn previous_target(&self) -> Option<PathBuf> {
        let pointer = self.active_pointer();
        match pointer.target().await {
            Ok(Some(target)) => {
                let target = strip_trailing_separators(&target);
                if !self.layout.is_release_path(&target) {
                    debug!(
                        "Active pointer targets {} outside {}",
                        target.display(),
                        self.layout.releases_dir().path().display()
                    );
                }
                Some(target)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Unable to read previous release from {}: {}", pointer.path().display(), e);
                None
            }
        }
    }
}
