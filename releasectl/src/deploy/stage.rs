//! Deployment pipeline stages

use serde::{Deserialize, Serialize};

use crate::config::settings::DeployConfig;

/// A pipeline stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Validate settings, prepare the root, resolve the revision
    EnvironmentSetup,

    /// Install dependencies in the source checkout
    InstallDeps,

    /// Build in the source checkout
    Build,

    /// Allocate the release directory
    PrepareRelease,

    /// Copy build output into the release
    SyncFiles,

    /// Commands run inside the release before activation
    PreDeploy,

    /// Point `current` at the new release
    SwitchRelease,

    /// Commands run inside the release after activation
    PostDeploy,

    /// Poll the health check URL
    HealthCheck,
}

impl Stage {
    /// All stages in execution order
    pub const ALL: [Stage; 9] = [
        Stage::EnvironmentSetup,
        Stage::InstallDeps,
        Stage::Build,
        Stage::PrepareRelease,
        Stage::SyncFiles,
        Stage::PreDeploy,
        Stage::SwitchRelease,
        Stage::PostDeploy,
        Stage::HealthCheck,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::EnvironmentSetup => "environment setup",
            Stage::InstallDeps => "install",
            Stage::Build => "build",
            Stage::PrepareRelease => "prepare release",
            Stage::SyncFiles => "sync files",
            Stage::PreDeploy => "pre-deploy",
            Stage::SwitchRelease => "switch release",
            Stage::PostDeploy => "post-deploy",
            Stage::HealthCheck => "health check",
        }
    }

    /// Whether the stage runs for the given settings
    pub fn is_enabled(&self, config: &DeployConfig) -> bool {
        match self {
            Stage::InstallDeps => !config.install_cmds.is_empty(),
            Stage::Build => !config.build_cmds.is_empty(),
            Stage::PreDeploy => !config.pre_deploy_cmds.is_empty(),
            Stage::PostDeploy => !config.post_deploy_cmds.is_empty(),
            Stage::HealthCheck => config.healthcheck_url.is_some(),
            Stage::EnvironmentSetup
            | Stage::PrepareRelease
            | Stage::SyncFiles
            | Stage::SwitchRelease => true,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A stage together with whether it will run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedStage {
    pub stage: Stage,
    pub enabled: bool,
}

/// Lay out the full stage list for a deployment
pub fn plan(config: &DeployConfig) -> Vec<PlannedStage> {
    Stage::ALL
        .iter()
        .map(|stage| PlannedStage {
            stage: *stage,
            enabled: stage.is_enabled(config),
        })
        .collect()
}

/// How a stage ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Completed,
    Skipped,
    Failed,
}

/// Per-stage entry in the deployment result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageReport {
    pub stage: Stage,
    pub status: StageStatus,
    pub duration_ms: u64,
}
