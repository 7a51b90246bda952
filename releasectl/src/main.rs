//! releasectl - Entry Point
//!
//! Deploys a build into a new immutable release directory, activates it and
//! verifies it. Intended to be called from a CI/CD pipeline.

use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use releasectl::config::load_config;
use releasectl::deploy::pipeline::Deployer;
use releasectl::deploy::runner::{Shell, ShellRunner};
use releasectl::filesys::file::File;
use releasectl::logs::{init_logging, LogOptions};
use releasectl::models::deployment::DeploymentResult;
use releasectl::utils::version_info;

use tracing::{debug, error, info};

/// Environment variable naming the CI outputs file
const OUTPUTS_ENV_VAR: &str = "GITHUB_OUTPUT";

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(version) => println!("{}", version),
            Err(e) => eprintln!("Failed to render version info: {}", e),
        }
        return;
    }

    if cli_args.contains_key("help") {
        print_usage();
        return;
    }

    let config = match load_config(&cli_args).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            std::process::exit(1);
        }
    };

    let log_options = LogOptions {
        log_level: config.log_level,
        json_format: cli_args.contains_key("json-logs"),
    };
    if let Err(e) = init_logging(log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let shell = Shell::detect();
    info!("Using shell: {}", shell.program());

    let deployer = Deployer::new(config, Arc::new(ShellRunner::new(shell)));
    match deployer.run().await {
        Ok(result) => {
            if let Err(e) = publish(&result).await {
                error!("Failed to publish deployment outputs: {}", e);
                std::process::exit(1);
            }
        }
        Err(failure) => {
            // Rollback information for the caller, even though the run failed
            if let Some(partial) = &failure.partial {
                if let Err(e) = publish(partial).await {
                    error!("Failed to publish deployment outputs: {}", e);
                }
            }
            error!(
                "Deployment failed at {} ({}): {}",
                failure.stage,
                failure.error.category(),
                failure.error
            );
            std::process::exit(1);
        }
    }
}

/// Print the result as JSON and append CI outputs when requested
async fn publish(result: &DeploymentResult) -> Result<(), releasectl::errors::DeployError> {
    println!("{}", serde_json::to_string_pretty(result)?);

    match env::var(OUTPUTS_ENV_VAR) {
        Ok(path) if !path.trim().is_empty() => {
            File::new(path).append_string(&result.outputs_text()).await?;
        }
        _ => debug!("{} not set, skipping CI outputs", OUTPUTS_ENV_VAR),
    }

    Ok(())
}

fn print_usage() {
    println!(
        "Usage: releasectl [--config=<file.json>] [--<input>=<value>...] [--json-logs]\n\
         \n\
         Inputs (also read from INPUT_<NAME> environment variables):\n\
         \x20 app-name, root, repo-path, revision, dist-dir,\n\
         \x20 install-cmds, build-cmds, pre-deploy-cmds, post-deploy-cmds,\n\
         \x20 healthcheck-url, healthcheck-code-range, healthcheck-timeout,\n\
         \x20 healthcheck-retries, healthcheck-delay, healthcheck-interval,\n\
         \x20 log-level"
    );
}
