//! Configuration loading
//!
//! Precedence, lowest first: JSON file (`--config=<path>`), `INPUT_*`
//! environment variables, `--name=value` command line arguments.

pub mod settings;

use std::collections::HashMap;

use tracing::debug;

use crate::errors::DeployError;
use crate::filesys::file::File;
use settings::DeployConfig;

/// Command line key naming a JSON settings file
pub const CONFIG_FILE_ARG: &str = "config";

/// Build the deployment settings from every source
pub async fn load_config(cli_args: &HashMap<String, String>) -> Result<DeployConfig, DeployError> {
    let mut config = match cli_args.get(CONFIG_FILE_ARG) {
        Some(path) => {
            debug!("Reading settings from {}", path);
            File::new(path).read_json::<DeployConfig>().await.map_err(|e| {
                DeployError::InputValidation(format!("unable to read config file {}: {}", path, e))
            })?
        }
        None => DeployConfig::default(),
    };

    config.apply_inputs(env_input)?;
    config.apply_inputs(|name| cli_input(cli_args, name))?;
    Ok(config)
}

/// Read a CI input from the environment.
///
/// Accepts both `INPUT_APP_NAME` and the hyphenated `INPUT_APP-NAME` that
/// GitHub Actions exports.
pub fn env_input(name: &str) -> Option<String> {
    let upper = name.to_uppercase();
    std::env::var(format!("INPUT_{}", upper.replace('-', "_")))
        .ok()
        .or_else(|| std::env::var(format!("INPUT_{}", upper)).ok())
}

fn cli_input(cli_args: &HashMap<String, String>, name: &str) -> Option<String> {
    cli_args
        .get(name)
        .or_else(|| cli_args.get(&name.replace('-', "_")))
        .cloned()
}
