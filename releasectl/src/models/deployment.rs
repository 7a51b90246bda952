//! Deployment models

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::deploy::stage::StageReport;

/// Outcome of the health verification loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResult {
    /// Whether a response in the accepted range was received
    pub success: bool,

    /// Last observed HTTP status, absent if every attempt failed in transport
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    /// Attempts actually made
    pub attempts: u32,

    /// Last failure reason, set only when `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate result of a deployment run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    pub app_name: String,

    pub release_id: String,

    pub release_path: PathBuf,

    /// Revision the release was built from, `unknown` when unresolved
    pub revision: String,

    /// Path of the active release pointer
    pub current_path: PathBuf,

    /// Release that was active before this deployment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_release: Option<PathBuf>,

    /// Set only when the health check stage ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<HealthCheckResult>,

    /// What happened to each pipeline stage, in order
    pub stages: Vec<StageReport>,

    pub started_at: DateTime<Utc>,

    pub completed_at: DateTime<Utc>,

    pub duration_ms: u64,
}

impl DeploymentResult {
    /// CI outputs as ordered `key`/`value` pairs.
    ///
    /// Required keys are always present; previous release and health check
    /// keys only when known.
    pub fn outputs(&self) -> Vec<(&'static str, String)> {
        let mut outputs = vec![
            ("release_id", self.release_id.clone()),
            ("release_path", self.release_path.display().to_string()),
            ("current_path", self.current_path.display().to_string()),
            ("revision", self.revision.clone()),
            ("duration_ms", self.duration_ms.to_string()),
        ];

        if let Some(previous) = &self.previous_release {
            outputs.push(("previous_release", previous.display().to_string()));
        }

        if let Some(health) = &self.healthcheck {
            outputs.push(("healthcheck_success", health.success.to_string()));
            outputs.push(("healthcheck_attempts", health.attempts.to_string()));
            if let Some(code) = health.status_code {
                outputs.push(("healthcheck_status_code", code.to_string()));
            }
        }

        outputs
    }

    /// Outputs rendered as `key=value` lines
    pub fn outputs_text(&self) -> String {
        self.outputs()
            .into_iter()
            .map(|(key, value)| format!("{}={}\n", key, value))
            .collect()
    }
}
