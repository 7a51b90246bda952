//! External command execution

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::DeployError;

/// Shell used to interpret command strings.
///
/// Detected once by the caller and handed to the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Sh,
    Pwsh,
    WindowsPowerShell,
    Cmd,
}

impl Shell {
    /// Pick the best shell available on this host
    pub fn detect() -> Self {
        if cfg!(windows) {
            if which::which("pwsh").is_ok() {
                Shell::Pwsh
            } else if which::which("powershell").is_ok() {
                Shell::WindowsPowerShell
            } else {
                Shell::Cmd
            }
        } else if which::which("bash").is_ok() {
            Shell::Bash
        } else {
            Shell::Sh
        }
    }

    /// Shell executable
    pub fn program(&self) -> &'static str {
        match self {
            Shell::Bash => "bash",
            Shell::Sh => "sh",
            Shell::Pwsh => "pwsh",
            Shell::WindowsPowerShell => "powershell",
            Shell::Cmd => "cmd",
        }
    }

    /// Arguments placed before the command string
    pub fn args(&self) -> &'static [&'static str] {
        match self {
            Shell::Bash | Shell::Sh => &["-c"],
            Shell::Pwsh | Shell::WindowsPowerShell => &["-NoProfile", "-NonInteractive", "-Command"],
            Shell::Cmd => &["/C"],
        }
    }
}

/// Runs an ordered list of commands in a working directory
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `commands` in order inside `cwd`, stopping at the first failure
    async fn run(&self, commands: &[String], cwd: &Path, label: &str) -> Result<(), DeployError>;
}

/// Command runner backed by a system shell
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: Shell,
}

impl ShellRunner {
    pub fn new(shell: Shell) -> Self {
        Self { shell }
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, commands: &[String], cwd: &Path, label: &str) -> Result<(), DeployError> {
        for (index, command) in commands.iter().enumerate() {
            info!("[{}] ({}/{}) {}", label, index + 1, commands.len(), command);

            let output = Command::new(self.shell.program())
                .args(self.shell.args())
                .arg(command)
                .current_dir(cwd)
                .stdin(Stdio::null())
                .output()
                .await
                .map_err(|e| DeployError::CommandFailed {
                    label: label.to_string(),
                    command: command.clone(),
                    code: None,
                    output: format!("failed to start {}: {}", self.shell.program(), e),
                })?;

            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            for line in stdout.lines().chain(stderr.lines()) {
                debug!("[{}] {}", label, line);
            }

            if !output.status.success() {
                return Err(DeployError::CommandFailed {
                    label: label.to_string(),
                    command: command.clone(),
                    code: output.status.code(),
                    output: captured_output(&stdout, &stderr),
                });
            }
        }

        Ok(())
    }
}

fn captured_output(stdout: &str, stderr: &str) -> String {
    match (stdout.trim(), stderr.trim()) {
        ("", stderr) => stderr.to_string(),
        (stdout, "") => stdout.to_string(),
        (stdout, stderr) => format!("{}\n{}", stderr, stdout),
    }
}
