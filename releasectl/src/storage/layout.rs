//! Deployment root layout
//!
//! ```text
//! {root}/
//!   releases/{id}/...   one directory per release
//!   current             symlink to the active release
//! ```

use std::path::{Path, PathBuf};

use crate::filesys::dir::Dir;

/// Name of the release collection directory
pub const RELEASES_DIR: &str = "releases";

/// Name of the active release pointer
pub const CURRENT_LINK: &str = "current";

/// Storage layout for a deployment root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseLayout {
    /// Base directory for all storage
    pub root: PathBuf,
}

impl ReleaseLayout {
    /// Create a new layout rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root directory
    pub fn root_dir(&self) -> Dir {
        Dir::new(&self.root)
    }

    /// Get the releases directory
    pub fn releases_dir(&self) -> Dir {
        Dir::new(self.root.join(RELEASES_DIR))
    }

    /// Get the directory for a single release
    pub fn release_dir(&self, id: &str) -> Dir {
        self.releases_dir().subdir(id)
    }

    /// Get the active pointer path
    pub fn current_link(&self) -> PathBuf {
        self.root.join(CURRENT_LINK)
    }

    /// Whether `path` lies inside the releases directory
    pub fn is_release_path(&self, path: &Path) -> bool {
        path.starts_with(self.releases_dir().path())
    }
}
