//! Error types for releasectl

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for a deployment run
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InputValidation(String),

    #[error("Invalid status code range '{0}': expected '<min>-<max>'")]
    InvalidRange(String),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Permission denied: {path} is not writable: {source}")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Unsafe pointer state: {0} exists but is not a symbolic link; refusing to replace it")]
    UnsafePointerState(PathBuf),

    #[error("{label} command failed (exit code {}): {command}\n{output}", exit_code_label(.code))]
    CommandFailed {
        label: String,
        command: String,
        code: Option<i32>,
        output: String,
    },

    #[error("Health check failed after {attempts} attempt(s): {reason}")]
    HealthCheckFailed { attempts: u32, reason: String },

    #[error("Logging error: {0}")]
    LoggingError(String),
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none".to_string(),
    }
}

impl DeployError {
    /// Category name used in logs and CI annotations
    pub fn category(&self) -> &'static str {
        match self {
            DeployError::InputValidation(_) | DeployError::InvalidRange(_) => "input_validation",
            DeployError::NotADirectory(_)
            | DeployError::PermissionDenied { .. }
            | DeployError::PreconditionFailed(_) => "filesystem_precondition",
            DeployError::UnsafePointerState(_) => "unsafe_pointer_state",
            DeployError::CommandFailed { .. } => "external_command_failure",
            DeployError::HealthCheckFailed { .. } => "health_check_exhausted",
            DeployError::IoError(_)
            | DeployError::JsonError(_)
            | DeployError::HttpError(_)
            | DeployError::LoggingError(_) => "internal",
        }
    }
}
