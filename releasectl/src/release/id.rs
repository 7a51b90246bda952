//! Release identifiers
//!
//! An id is `YYYYMMDD-HHMMSS-<rev7>`: a local timestamp that sorts
//! lexicographically in creation order, followed by the short revision.
//! Two deployments of the same revision within one second share an id.

use std::fmt::Display;

use chrono::{DateTime, TimeZone};

/// Revision placeholder when no source-control information is available
pub const UNKNOWN_REVISION: &str = "unknown";

/// Number of revision characters kept in an id
pub const SHORT_REVISION_LEN: usize = 7;

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Build a release id from a timestamp and an optional revision
pub fn generate_release_id<Tz>(now: &DateTime<Tz>, revision: Option<&str>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("{}-{}", now.format(TIMESTAMP_FORMAT), short_revision(revision))
}

/// First seven characters of the revision, or `unknown`
pub fn short_revision(revision: Option<&str>) -> String {
    match revision.map(str::trim).filter(|r| !r.is_empty()) {
        Some(rev) => rev.chars().take(SHORT_REVISION_LEN).collect(),
        None => UNKNOWN_REVISION.to_string(),
    }
}
