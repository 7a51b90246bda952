//! Release file population
//!
//! Copies a source tree into a freshly allocated release directory. The
//! tree is listed with `walkdir` on a blocking thread; files are copied
//! with tokio.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::errors::DeployError;
use crate::filesys::link::{create_symlink, read_symlink, EntryKind};

/// Directory names skipped when copying a full source tree
pub const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    ".npm",
    ".yarn",
    ".pnpm-store",
    ".cache",
    ".turbo",
    "__pycache__",
    ".venv",
    "target",
];

const NO_EXCLUSIONS: &[&str] = &[];

/// One entry of the source tree, relative to the copy source
struct SourceEntry {
    source: PathBuf,
    relative: PathBuf,
    kind: EntryKind,
}

/// Copy release content from `source_root` into `dest_root`.
///
/// With `subdir`, only that subtree is copied and nothing is excluded; the
/// subtree must exist and be a directory. Without it, the whole tree is
/// copied minus [`EXCLUDED_DIRS`]. Symlinks are recreated, not followed.
///
/// Returns the number of files and links copied.
pub async fn copy_release_files(
    source_root: &Path,
    dest_root: &Path,
    subdir: Option<&str>,
) -> Result<u64, DeployError> {
    let (source, excluded): (PathBuf, &'static [&str]) = match subdir {
        Some(subdir) => {
            let source = source_root.join(subdir);
            match fs::metadata(&source).await {
                Ok(meta) if meta.is_dir() => (source, NO_EXCLUSIONS),
                Ok(_) => {
                    return Err(DeployError::PreconditionFailed(format!(
                        "dist directory {} is not a directory",
                        source.display()
                    )))
                }
                Err(_) => {
                    return Err(DeployError::PreconditionFailed(format!(
                        "dist directory {} does not exist",
                        source.display()
                    )))
                }
            }
        }
        None => (source_root.to_path_buf(), EXCLUDED_DIRS),
    };

    info!("Copying {} -> {}", source.display(), dest_root.display());

    fs::create_dir_all(dest_root).await?;
    let dest_abs = fs::canonicalize(dest_root).await?;

    let entries = tokio::task::spawn_blocking(move || walk_source(&source, excluded, &dest_abs))
        .await
        .map_err(|e| DeployError::IoError(io::Error::other(e)))??;

    let mut copied = 0u64;
    for entry in entries {
        let dst = dest_root.join(&entry.relative);
        match entry.kind {
            EntryKind::Directory => fs::create_dir_all(&dst).await?,
            EntryKind::Symlink => {
                let target = read_symlink(&entry.source).await?;
                create_symlink(&target, &dst).await?;
                copied += 1;
            }
            EntryKind::File => {
                fs::copy(&entry.source, &dst).await?;
                copied += 1;
            }
            EntryKind::Absent => {}
        }
    }

    info!("Copied {} file(s) into {}", copied, dest_root.display());
    Ok(copied)
}

/// List the source tree in copy order, parents before children.
///
/// Excluded directories and any directory containing the destination are
/// pruned without being descended into. Links are listed, not followed.
fn walk_source(
    source: &Path,
    excluded: &[&str],
    dest_abs: &Path,
) -> Result<Vec<SourceEntry>, DeployError> {
    let keep = |entry: &DirEntry| {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        if excluded.iter().any(|ex| *ex == name) {
            debug!("Skipping excluded directory {}", entry.path().display());
            return false;
        }
        // Deploy root nested inside the source tree
        match std::fs::canonicalize(entry.path()) {
            Ok(abs) if dest_abs.starts_with(&abs) => {
                debug!("Skipping {} (contains the destination)", entry.path().display());
                false
            }
            _ => true,
        }
    };

    let mut entries = Vec::new();
    for entry in WalkDir::new(source)
        .follow_links(false)
        .min_depth(1)
        .into_iter()
        .filter_entry(keep)
    {
        let entry = entry.map_err(io::Error::from)?;
        let file_type = entry.file_type();
        let kind = if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        let relative = entry
            .path()
            .strip_prefix(source)
            .unwrap_or(entry.path())
            .to_path_buf();
        entries.push(SourceEntry {
            source: entry.path().to_path_buf(),
            relative,
            kind,
        });
    }

    Ok(entries)
}
