//! End-to-end deployment tests

use std::path::{Path, PathBuf};
use std::sync::Arc;

use releasectl::config::settings::DeployConfig;
use releasectl::deploy::pipeline::Deployer;
use releasectl::deploy::runner::{Shell, ShellRunner};
use releasectl::deploy::stage::{Stage, StageStatus};
use releasectl::errors::DeployError;

use crate::common::{serve_statuses, RecordingRunner};

struct Fixture {
    _tmp: tempfile::TempDir,
    repo: PathBuf,
    root: PathBuf,
}

fn fixture() -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let repo = tmp.path().join("repo");
    std::fs::create_dir_all(repo.join(".git")).unwrap();
    std::fs::create_dir_all(repo.join("node_modules/left-pad")).unwrap();
    std::fs::create_dir_all(repo.join("dist")).unwrap();
    std::fs::write(repo.join("index.html"), "<h1>app</h1>").unwrap();
    std::fs::write(repo.join(".git/HEAD"), "ref: refs/heads/main").unwrap();
    std::fs::write(repo.join("node_modules/left-pad/index.js"), "pad").unwrap();
    std::fs::write(repo.join("dist/bundle.js"), "bundle").unwrap();

    let root = tmp.path().join("deploy");
    Fixture {
        repo,
        root,
        _tmp: tmp,
    }
}

fn config(fx: &Fixture, revision: &str) -> DeployConfig {
    DeployConfig {
        app_name: "web".to_string(),
        root: fx.root.clone(),
        repo_path: fx.repo.clone(),
        revision: Some(revision.to_string()),
        ..Default::default()
    }
}

fn release_count(root: &Path) -> usize {
    std::fs::read_dir(root.join("releases")).unwrap().count()
}

#[tokio::test]
async fn test_two_deployments_report_previous_release() {
    let fx = fixture();
    let runner = Arc::new(RecordingRunner::default());

    let first = Deployer::new(config(&fx, "1111111aaaa"), runner.clone())
        .run()
        .await
        .unwrap();
    let second = Deployer::new(config(&fx, "2222222bbbb"), runner.clone())
        .run()
        .await
        .unwrap();

    assert_ne!(first.release_id, second.release_id);
    assert!(first.release_id.ends_with("-1111111"));
    assert!(second.release_id.ends_with("-2222222"));
    assert_eq!(first.previous_release, None);
    assert_eq!(second.previous_release, Some(first.release_path.clone()));

    let current = std::fs::read_link(&second.current_path).unwrap();
    assert_eq!(current, second.release_path);
    // The first release is still intact
    assert!(first.release_path.join("index.html").exists());
    assert_eq!(release_count(&fx.root), 2);
}

#[tokio::test]
async fn test_release_contents_exclude_caches() {
    let fx = fixture();
    let result = Deployer::new(config(&fx, "abc1234"), Arc::new(RecordingRunner::default()))
        .run()
        .await
        .unwrap();

    let release = &result.release_path;
    assert!(release.join("index.html").exists());
    assert!(release.join("dist/bundle.js").exists());
    assert!(!release.join(".git").exists());
    assert!(!release.join("node_modules").exists());
}

#[tokio::test]
async fn test_dist_dir_publishes_subtree_only() {
    let fx = fixture();
    let mut cfg = config(&fx, "abc1234");
    cfg.dist_dir = Some("dist".to_string());

    let result = Deployer::new(cfg, Arc::new(RecordingRunner::default()))
        .run()
        .await
        .unwrap();

    assert!(result.release_path.join("bundle.js").exists());
    assert!(!result.release_path.join("index.html").exists());
}

#[tokio::test]
async fn test_missing_dist_dir_fails_before_activation() {
    let fx = fixture();
    let mut cfg = config(&fx, "abc1234");
    cfg.dist_dir = Some("build".to_string());

    let err = Deployer::new(cfg, Arc::new(RecordingRunner::default()))
        .run()
        .await
        .unwrap_err()
        .error;

    assert!(matches!(err, DeployError::PreconditionFailed(_)));
    assert!(std::fs::symlink_metadata(fx.root.join("current")).is_err());
}

#[tokio::test]
async fn test_commands_run_in_the_right_places() {
    let fx = fixture();
    let runner = Arc::new(RecordingRunner::default());
    let mut cfg = config(&fx, "abc1234");
    cfg.install_cmds = vec!["npm ci".to_string()];
    cfg.build_cmds = vec!["npm run build".to_string()];
    cfg.pre_deploy_cmds = vec!["./migrate".to_string()];
    cfg.post_deploy_cmds = vec!["./reload".to_string()];

    let result = Deployer::new(cfg, runner.clone()).run().await.unwrap();

    let calls = runner.calls();
    let labels: Vec<&str> = calls.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["install", "build", "pre-deploy", "post-deploy"]);
    assert_eq!(calls[0].cwd, fx.repo);
    assert_eq!(calls[1].cwd, fx.repo);
    assert_eq!(calls[2].cwd, result.release_path);
    assert_eq!(calls[3].cwd, result.release_path);
    assert_eq!(calls[1].commands, vec!["npm run build".to_string()]);

    assert!(result
        .stages
        .iter()
        .all(|s| s.status == StageStatus::Completed || s.stage == Stage::HealthCheck));
}

#[tokio::test]
async fn test_optional_stages_are_skipped() {
    let fx = fixture();
    let runner = Arc::new(RecordingRunner::default());

    let result = Deployer::new(config(&fx, "abc1234"), runner.clone())
        .run()
        .await
        .unwrap();

    assert!(runner.calls().is_empty());
    assert!(result.healthcheck.is_none());
    let skipped: Vec<Stage> = result
        .stages
        .iter()
        .filter(|s| s.status == StageStatus::Skipped)
        .map(|s| s.stage)
        .collect();
    assert_eq!(
        skipped,
        vec![
            Stage::InstallDeps,
            Stage::Build,
            Stage::PreDeploy,
            Stage::PostDeploy,
            Stage::HealthCheck
        ]
    );
    assert!(!result.outputs_text().contains("healthcheck_"));
}

#[tokio::test]
async fn test_build_failure_aborts_before_release() {
    let fx = fixture();
    let runner = Arc::new(RecordingRunner::failing("build"));
    let mut cfg = config(&fx, "abc1234");
    cfg.build_cmds = vec!["make".to_string()];
    cfg.pre_deploy_cmds = vec!["./migrate".to_string()];

    let failure = Deployer::new(cfg, runner.clone()).run().await.unwrap_err();

    assert_eq!(failure.stage, Stage::Build);
    assert!(failure.partial.is_none());
    let err = failure.error;
    assert!(matches!(err, DeployError::CommandFailed { ref label, .. } if label == "build"));
    assert_eq!(runner.calls().len(), 1);
    assert_eq!(release_count(&fx.root), 0);
    assert!(std::fs::symlink_metadata(fx.root.join("current")).is_err());
}

#[tokio::test]
async fn test_post_deploy_failure_leaves_new_release_active() {
    let fx = fixture();
    let runner = Arc::new(RecordingRunner::failing("post-deploy"));
    let mut cfg = config(&fx, "abc1234");
    cfg.post_deploy_cmds = vec!["./reload".to_string()];

    let failure = Deployer::new(cfg, runner).run().await.unwrap_err();

    assert_eq!(failure.stage, Stage::PostDeploy);
    assert!(matches!(failure.error, DeployError::CommandFailed { .. }));
    // No rollback: the pointer already moved
    let partial = failure.partial.unwrap();
    let current = std::fs::read_link(fx.root.join("current")).unwrap();
    assert_eq!(current, partial.release_path);
    let last = partial.stages.last().unwrap();
    assert_eq!((last.stage, last.status), (Stage::PostDeploy, StageStatus::Failed));
}

#[tokio::test]
async fn test_invalid_range_fails_before_any_io() {
    let fx = fixture();
    let mut cfg = config(&fx, "abc1234");
    cfg.healthcheck_url = Some("http://127.0.0.1:1/health".to_string());
    cfg.healthcheck_code_range = "invalid".to_string();

    let err = Deployer::new(cfg, Arc::new(RecordingRunner::default()))
        .run()
        .await
        .unwrap_err()
        .error;

    assert!(matches!(err, DeployError::InvalidRange(_)));
    assert!(!fx.root.exists());
}

#[tokio::test]
async fn test_unsafe_pointer_is_fatal_and_untouched() {
    let fx = fixture();
    std::fs::create_dir_all(fx.root.join("current")).unwrap();
    std::fs::write(fx.root.join("current/uploads.db"), "user data").unwrap();

    let err = Deployer::new(config(&fx, "abc1234"), Arc::new(RecordingRunner::default()))
        .run()
        .await
        .unwrap_err()
        .error;

    assert!(matches!(err, DeployError::UnsafePointerState(_)));
    assert_eq!(
        std::fs::read_to_string(fx.root.join("current/uploads.db")).unwrap(),
        "user data"
    );
}

#[tokio::test]
async fn test_health_check_success_is_reported() {
    let fx = fixture();
    let server = serve_statuses(vec![503, 200]).await;
    let mut cfg = config(&fx, "abc1234");
    cfg.healthcheck_url = Some(server.url.clone());
    cfg.healthcheck_code_range = "200-299".to_string();
    cfg.healthcheck_retries = 3;
    cfg.healthcheck_interval = 0;

    let result = Deployer::new(cfg, Arc::new(RecordingRunner::default()))
        .run()
        .await
        .unwrap();

    let health = result.healthcheck.clone().unwrap();
    assert!(health.success);
    assert_eq!(health.attempts, 2);
    assert_eq!(health.status_code, Some(200));
    let text = result.outputs_text();
    assert!(text.contains("healthcheck_success=true\n"));
    assert!(text.contains("healthcheck_status_code=200\n"));
}

#[tokio::test]
async fn test_health_check_exhaustion_fails_the_deployment() {
    let fx = fixture();
    let server = serve_statuses(vec![500]).await;
    let mut cfg = config(&fx, "abc1234");
    cfg.healthcheck_url = Some(server.url.clone());
    cfg.healthcheck_retries = 2;
    cfg.healthcheck_interval = 0;

    let failure = Deployer::new(cfg, Arc::new(RecordingRunner::default()))
        .run()
        .await
        .unwrap_err();

    match failure.error {
        DeployError::HealthCheckFailed { attempts, reason } => {
            assert_eq!(attempts, 2);
            assert!(reason.contains("500"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(server.hits(), 2);
    // The release stays active; rollback is left to the caller
    assert!(std::fs::read_link(fx.root.join("current")).is_ok());
}

#[tokio::test]
async fn test_shell_runner_end_to_end() {
    let fx = fixture();
    let mut cfg = config(&fx, "abc1234");
    cfg.build_cmds = vec!["echo built > BUILD_INFO".to_string()];
    cfg.pre_deploy_cmds = vec!["test -f BUILD_INFO".to_string()];
    cfg.post_deploy_cmds = vec!["touch ../../post-deploy-ran".to_string()];

    let result = Deployer::new(cfg, Arc::new(ShellRunner::new(Shell::Sh)))
        .run()
        .await
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(result.release_path.join("BUILD_INFO")).unwrap(),
        "built\n"
    );
    assert!(fx.root.join("post-deploy-ran").exists());
}

#[tokio::test]
async fn test_failed_health_check_keeps_rollback_target() {
    let fx = fixture();
    let runner = Arc::new(RecordingRunner::default());
    let first = Deployer::new(config(&fx, "1111111aaaa"), runner.clone())
        .run()
        .await
        .unwrap();

    let server = serve_statuses(vec![500]).await;
    let mut cfg = config(&fx, "2222222bbbb");
    cfg.healthcheck_url = Some(server.url.clone());
    cfg.healthcheck_retries = 1;

    let failure = Deployer::new(cfg, runner).run().await.unwrap_err();

    assert_eq!(failure.stage, Stage::HealthCheck);
    assert!(matches!(failure.error, DeployError::HealthCheckFailed { .. }));
    let partial = failure.partial.unwrap();
    assert_eq!(partial.previous_release, Some(first.release_path.clone()));
    assert!(partial.release_id.ends_with("-2222222"));
    assert_eq!(
        std::fs::read_link(&partial.current_path).unwrap(),
        partial.release_path
    );

    let health = partial.healthcheck.clone().unwrap();
    assert!(!health.success);
    assert_eq!(health.status_code, Some(500));

    let text = partial.outputs_text();
    assert!(text.contains(&format!("previous_release={}\n", first.release_path.display())));
    assert!(text.contains("healthcheck_success=false\n"));
}
