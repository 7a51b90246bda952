//! Deployment orchestrator
//!
//! Drives the fixed stage list from [`crate::deploy::stage`] one stage at a
//! time. The first failing stage aborts the run and its error is returned
//! wrapped in a [`DeployFailure`]; nothing is rolled back. Once a release has
//! been allocated the failure also carries the partial result, so the
//! previous release is still reported when a late stage fails.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Local, Utc};
use thiserror::Error;
use tracing::{error, info};

use crate::config::settings::DeployConfig;
use crate::deploy::git::resolve_revision;
use crate::deploy::health;
use crate::deploy::runner::CommandRunner;
use crate::deploy::stage::{self, Stage, StageReport, StageStatus};
use crate::errors::DeployError;
use crate::filesys::sync::copy_release_files;
use crate::models::deployment::{DeploymentResult, HealthCheckResult};
use crate::models::release::Release;
use crate::release::id::{generate_release_id, short_revision};
use crate::release::store::ReleaseStore;

/// A failed deployment run
#[derive(Error, Debug)]
#[error("{stage} failed: {error}")]
pub struct DeployFailure {
    /// Stage that failed
    pub stage: Stage,

    #[source]
    pub error: DeployError,

    /// What the completed stages produced, once a release exists
    pub partial: Option<Box<DeploymentResult>>,
}

/// Runs one deployment to a single root
pub struct Deployer {
    config: DeployConfig,
    runner: Arc<dyn CommandRunner>,
}

/// State carried between stages
struct DeployContext {
    started_at: DateTime<Utc>,
    clock: Instant,
    store: Option<ReleaseStore>,
    revision: Option<String>,
    release: Option<Release>,
    previous_release: Option<PathBuf>,
    healthcheck: Option<HealthCheckResult>,
    stages: Vec<StageReport>,
}

impl DeployContext {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            clock: Instant::now(),
            store: None,
            revision: None,
            release: None,
            previous_release: None,
            healthcheck: None,
            stages: Vec::new(),
        }
    }

    fn store(&self) -> Result<&ReleaseStore, DeployError> {
        self.store.as_ref().ok_or_else(|| {
            DeployError::PreconditionFailed("deployment root has not been prepared".to_string())
        })
    }

    fn release(&self) -> Result<&Release, DeployError> {
        self.release.as_ref().ok_or_else(|| {
            DeployError::PreconditionFailed("release has not been allocated".to_string())
        })
    }
}

impl Deployer {
    pub fn new(config: DeployConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    /// Run every stage and return the aggregate result
    pub async fn run(&self) -> Result<DeploymentResult, DeployFailure> {
        info!("Deploying {}", self.config.app_name);
        let mut ctx = DeployContext::new();

        for planned in stage::plan(&self.config) {
            if !planned.enabled {
                info!("Skipping {}: nothing configured", planned.stage);
                ctx.stages.push(StageReport {
                    stage: planned.stage,
                    status: StageStatus::Skipped,
                    duration_ms: 0,
                });
                continue;
            }

            info!("==> {}", planned.stage);
            let started = Instant::now();
            if let Err(e) = self.run_stage(planned.stage, &mut ctx).await {
                error!("Stage '{}' failed: {}", planned.stage, e);
                ctx.stages.push(StageReport {
                    stage: planned.stage,
                    status: StageStatus::Failed,
                    duration_ms: started.elapsed().as_millis() as u64,
                });
                if let Some(previous) = &ctx.previous_release {
                    error!("Release active before this run: {}", previous.display());
                }
                return Err(DeployFailure {
                    stage: planned.stage,
                    error: e,
                    partial: self.result(&ctx).ok().map(Box::new),
                });
            }
            ctx.stages.push(StageReport {
                stage: planned.stage,
                status: StageStatus::Completed,
                duration_ms: started.elapsed().as_millis() as u64,
            });
        }

        // Only reachable if the release was never allocated
        let result = self.result(&ctx).map_err(|e| DeployFailure {
            stage: Stage::PrepareRelease,
            error: e,
            partial: None,
        })?;
        info!(
            "Deployed {} release {} in {}ms",
            result.app_name, result.release_id, result.duration_ms
        );
        Ok(result)
    }

    async fn run_stage(&self, stage: Stage, ctx: &mut DeployContext) -> Result<(), DeployError> {
        let config = &self.config;

        match stage {
            Stage::EnvironmentSetup => {
                config.validate()?;
                ctx.store = Some(ReleaseStore::ensure_root(&config.root).await?);
                ctx.revision = match &config.revision {
                    Some(revision) => Some(revision.clone()),
                    None => resolve_revision(&config.repo_path).await,
                };
                info!("Revision: {}", short_revision(ctx.revision.as_deref()));
            }
            Stage::InstallDeps => {
                self.runner
                    .run(&config.install_cmds, &config.repo_path, "install")
                    .await?;
            }
            Stage::Build => {
                self.runner
                    .run(&config.build_cmds, &config.repo_path, "build")
                    .await?;
            }
            Stage::PrepareRelease => {
                let id = generate_release_id(&Local::now(), ctx.revision.as_deref());
                let release = ctx.store()?.allocate(&id).await?;
                ctx.release = Some(release);
            }
            Stage::SyncFiles => {
                let release = ctx.release()?;
                copy_release_files(&config.repo_path, &release.path, config.dist_dir.as_deref())
                    .await?;
            }
            Stage::PreDeploy => {
                let release = ctx.release()?;
                self.runner
                    .run(&config.pre_deploy_cmds, &release.path, "pre-deploy")
                    .await?;
            }
            Stage::SwitchRelease => {
                let store = ctx.store()?;
                let release = ctx.release()?;
                let previous = store.previous_target().await;
                match &previous {
                    Some(previous) => info!("Previous release: {}", previous.display()),
                    None => info!("No previous release"),
                }
                store.active_pointer().swap(&release.path).await?;
                ctx.previous_release = previous;
            }
            Stage::PostDeploy => {
                let release = ctx.release()?;
                self.runner
                    .run(&config.post_deploy_cmds, &release.path, "post-deploy")
                    .await?;
            }
            Stage::HealthCheck => {
                let Some(options) = config.health_check() else {
                    return Ok(());
                };
                let result = health::verify(&options).await?;
                ctx.healthcheck = Some(result.clone());
                if !result.success {
                    return Err(DeployError::HealthCheckFailed {
                        attempts: result.attempts,
                        reason: result.error.unwrap_or_else(|| "unhealthy".to_string()),
                    });
                }
            }
        }

        Ok(())
    }

    /// Aggregate result from the current context
    fn result(&self, ctx: &DeployContext) -> Result<DeploymentResult, DeployError> {
        let store = ctx.store()?;
        let release = ctx.release()?;

        Ok(DeploymentResult {
            app_name: self.config.app_name.clone(),
            release_id: release.id.clone(),
            release_path: release.path.clone(),
            revision: ctx
                .revision
                .clone()
                .unwrap_or_else(|| short_revision(None)),
            current_path: store.layout().current_link(),
            previous_release: ctx.previous_release.clone(),
            healthcheck: ctx.healthcheck.clone(),
            stages: ctx.stages.clone(),
            started_at: ctx.started_at,
            completed_at: Utc::now(),
            duration_ms: ctx.clock.elapsed().as_millis() as u64,
        })
    }
}
