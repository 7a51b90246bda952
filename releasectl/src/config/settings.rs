//! Deployment settings

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::deploy::health::{HealthCheckOptions, StatusRange};
use crate::errors::DeployError;
use crate::logs::LogLevel;
use crate::utils::split_lines;

/// Deployment parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Application name, used in logs and outputs
    #[serde(default)]
    pub app_name: String,

    /// Deployment root holding `releases/` and `current`
    #[serde(default)]
    pub root: PathBuf,

    /// Source checkout the release is built from
    #[serde(default = "default_repo_path")]
    pub repo_path: PathBuf,

    /// Revision override; resolved from git when absent
    #[serde(default)]
    pub revision: Option<String>,

    #[serde(default)]
    pub install_cmds: Vec<String>,

    #[serde(default)]
    pub build_cmds: Vec<String>,

    /// Subdirectory of `repo_path` to publish instead of the whole tree
    #[serde(default)]
    pub dist_dir: Option<String>,

    #[serde(default)]
    pub pre_deploy_cmds: Vec<String>,

    #[serde(default)]
    pub post_deploy_cmds: Vec<String>,

    #[serde(default)]
    pub healthcheck_url: Option<String>,

    /// Accepted status codes, `min-max`
    #[serde(default = "default_code_range")]
    pub healthcheck_code_range: String,

    /// Per-attempt timeout in seconds
    #[serde(default = "default_healthcheck_timeout")]
    pub healthcheck_timeout: u64,

    /// Maximum number of attempts
    #[serde(default = "default_healthcheck_retries")]
    pub healthcheck_retries: u32,

    /// Seconds to wait before the first attempt
    #[serde(default)]
    pub healthcheck_delay: u64,

    /// Seconds between attempts
    #[serde(default = "default_healthcheck_interval")]
    pub healthcheck_interval: u64,

    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_repo_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_code_range() -> String {
    "200-399".to_string()
}

fn default_healthcheck_timeout() -> u64 {
    10
}

fn default_healthcheck_retries() -> u32 {
    5
}

fn default_healthcheck_interval() -> u64 {
    5
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            app_name: String::new(),
            root: PathBuf::new(),
            repo_path: default_repo_path(),
            revision: None,
            install_cmds: Vec::new(),
            build_cmds: Vec::new(),
            dist_dir: None,
            pre_deploy_cmds: Vec::new(),
            post_deploy_cmds: Vec::new(),
            healthcheck_url: None,
            healthcheck_code_range: default_code_range(),
            healthcheck_timeout: default_healthcheck_timeout(),
            healthcheck_retries: default_healthcheck_retries(),
            healthcheck_delay: 0,
            healthcheck_interval: default_healthcheck_interval(),
            log_level: LogLevel::Info,
        }
    }
}

impl DeployConfig {
    /// Overlay named inputs on top of the current values.
    ///
    /// `lookup` receives kebab-case input names (`app-name`, `healthcheck-url`,
    /// ...). Missing and empty values leave the field untouched. Command lists
    /// are one command per line.
    pub fn apply_inputs<F>(&mut self, lookup: F) -> Result<(), DeployError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("app-name") {
            self.app_name = v.trim().to_string();
        }
        if let Some(v) = get("root") {
            self.root = PathBuf::from(v.trim());
        }
        if let Some(v) = get("repo-path") {
            self.repo_path = PathBuf::from(v.trim());
        }
        if let Some(v) = get("revision") {
            self.revision = Some(v.trim().to_string());
        }
        if let Some(v) = get("install-cmds") {
            self.install_cmds = split_lines(&v);
        }
        if let Some(v) = get("build-cmds") {
            self.build_cmds = split_lines(&v);
        }
        if let Some(v) = get("dist-dir") {
            self.dist_dir = Some(v.trim().to_string());
        }
        if let Some(v) = get("pre-deploy-cmds") {
            self.pre_deploy_cmds = split_lines(&v);
        }
        if let Some(v) = get("post-deploy-cmds") {
            self.post_deploy_cmds = split_lines(&v);
        }
        if let Some(v) = get("healthcheck-url") {
            self.healthcheck_url = Some(v.trim().to_string());
        }
        if let Some(v) = get("healthcheck-code-range") {
            self.healthcheck_code_range = v.trim().to_string();
        }
        if let Some(v) = get("healthcheck-timeout") {
            self.healthcheck_timeout = parse_number("healthcheck-timeout", &v)?;
        }
        if let Some(v) = get("healthcheck-retries") {
            self.healthcheck_retries = parse_number("healthcheck-retries", &v)?;
        }
        if let Some(v) = get("healthcheck-delay") {
            self.healthcheck_delay = parse_number("healthcheck-delay", &v)?;
        }
        if let Some(v) = get("healthcheck-interval") {
            self.healthcheck_interval = parse_number("healthcheck-interval", &v)?;
        }
        if let Some(v) = get("log-level") {
            self.log_level = v.parse().map_err(DeployError::InputValidation)?;
        }

        Ok(())
    }

    /// Check the settings before anything touches the filesystem
    pub fn validate(&self) -> Result<(), DeployError> {
        if self.app_name.trim().is_empty() {
            return Err(DeployError::InputValidation("app-name is required".to_string()));
        }
        if self.root.as_os_str().is_empty() {
            return Err(DeployError::InputValidation("root is required".to_string()));
        }
        if self.healthcheck_retries == 0 {
            return Err(DeployError::InputValidation(
                "healthcheck-retries must be at least 1".to_string(),
            ));
        }

        self.healthcheck_code_range.parse::<StatusRange>()?;

        if let Some(raw) = &self.healthcheck_url {
            let url = url::Url::parse(raw).map_err(|e| {
                DeployError::InputValidation(format!("invalid healthcheck-url '{}': {}", raw, e))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(DeployError::InputValidation(format!(
                    "healthcheck-url must use http or https, got '{}'",
                    url.scheme()
                )));
            }
        }

        if let Some(dist_dir) = &self.dist_dir {
            let path = Path::new(dist_dir);
            let escapes = path
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
            if escapes {
                return Err(DeployError::InputValidation(format!(
                    "dist-dir must be a relative path inside the repository, got '{}'",
                    dist_dir
                )));
            }
        }

        Ok(())
    }

    /// Health check options, or `None` when no URL is configured
    pub fn health_check(&self) -> Option<HealthCheckOptions> {
        self.healthcheck_url.as_ref().map(|url| HealthCheckOptions {
            url: url.clone(),
            code_range: self.healthcheck_code_range.clone(),
            timeout: Duration::from_secs(self.healthcheck_timeout),
            max_attempts: self.healthcheck_retries,
            initial_delay: Duration::from_secs(self.healthcheck_delay),
            interval: Duration::from_secs(self.healthcheck_interval),
        })
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, DeployError> {
    value.trim().parse().map_err(|_| {
        DeployError::InputValidation(format!("{} must be a non-negative integer, got '{}'", name, value))
    })
}
