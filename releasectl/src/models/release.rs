//! Release model

use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// An immutable unit of deployable content under `{root}/releases/{id}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Release id, also the directory name
    pub id: String,

    /// Absolute release directory
    pub path: PathBuf,

    /// Allocation time
    pub created_at: DateTime<Utc>,
}
