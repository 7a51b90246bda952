//! Symbolic link primitives
//!
//! Every helper here operates on the link entry itself. None of them follow
//! the link, so a release directory referenced by a link is never touched.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

/// What currently occupies a path, probed without following links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Absent,
    Symlink,
    Directory,
    File,
}

/// Probe the entry type at `path` using `lstat` semantics
pub async fn entry_kind(path: &Path) -> io::Result<EntryKind> {
    match fs::symlink_metadata(path).await {
        Ok(meta) => {
            let file_type = meta.file_type();
            if file_type.is_symlink() {
                Ok(EntryKind::Symlink)
            } else if file_type.is_dir() {
                Ok(EntryKind::Directory)
            } else {
                Ok(EntryKind::File)
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(EntryKind::Absent),
        Err(e) => Err(e),
    }
}

/// Create a symbolic link at `link` pointing to `target`
pub async fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        fs::symlink(target, link).await
    }

    #[cfg(windows)]
    {
        let resolved = match link.parent() {
            Some(parent) => parent.join(target),
            None => target.to_path_buf(),
        };
        if fs::metadata(&resolved).await.map(|m| m.is_dir()).unwrap_or(false) {
            fs::symlink_dir(target, link).await
        } else {
            fs::symlink_file(target, link).await
        }
    }
}

/// Remove the link entry only. Never recurses into the target.
pub async fn remove_symlink(link: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        // Directory links on Windows are removed with RemoveDirectory, which
        // deletes the reparse point and leaves the target alone.
        if fs::metadata(link).await.map(|m| m.is_dir()).unwrap_or(false) {
            return fs::remove_dir(link).await;
        }
    }

    fs::remove_file(link).await
}

/// Read the raw target of a link
pub async fn read_symlink(link: &Path) -> io::Result<PathBuf> {
    fs::read_link(link).await
}
