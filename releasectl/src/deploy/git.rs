//! Source revision lookup

use std::path::Path;

use tokio::process::Command;
use tracing::debug;

/// Environment variable consulted when git is unavailable
pub const REVISION_ENV_VAR: &str = "GITHUB_SHA";

/// Resolve the revision checked out at `repo_path`.
///
/// Tries `git rev-parse HEAD`, then `GITHUB_SHA`. Returns `None` when
/// neither is available.
pub async fn resolve_revision(repo_path: &Path) -> Option<String> {
    match git_head(repo_path, None).await {
        Some(revision) => Some(revision),
        None => env_revision(),
    }
}

/// `git rev-parse HEAD` in `repo_path`.
///
/// With `ceiling`, git stops looking for a repository at that directory
/// (`GIT_CEILING_DIRECTORIES`).
async fn git_head(repo_path: &Path, ceiling: Option<&Path>) -> Option<String> {
    let mut command = Command::new("git");
    command.current_dir(repo_path).args(["rev-parse", "HEAD"]);
    if let Some(ceiling) = ceiling {
        command.env("GIT_CEILING_DIRECTORIES", ceiling);
    }

    match command.output().await {
        Ok(output) if output.status.success() => {
            let revision = String::from_utf8_lossy(&output.stdout).trim().to_string();
            (!revision.is_empty()).then_some(revision)
        }
        Ok(output) => {
            debug!(
                "git rev-parse failed in {}: {}",
                repo_path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            None
        }
        Err(e) => {
            debug!("Failed to run git: {}", e);
            None
        }
    }
}

fn env_revision() -> Option<String> {
    std::env::var(REVISION_ENV_VAR)
        .ok()
        .map(|rev| rev.trim().to_string())
        .filter(|rev| !rev.is_empty())
}
