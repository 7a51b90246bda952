//! HTTP health verification
//!
//! Polls a URL until it answers with a status inside the accepted range or
//! the attempt budget runs out. Worst-case duration is roughly
//! `initial_delay + attempts * timeout + (attempts - 1) * interval`.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::errors::DeployError;
use crate::models::deployment::HealthCheckResult;

/// Inclusive range of accepted HTTP status codes, written `min-max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRange {
    pub min: u16,
    pub max: u16,
}

impl StatusRange {
    /// Whether `code` lies within the range, bounds included
    pub fn contains(&self, code: u16) -> bool {
        self.min <= code && code <= self.max
    }
}

impl FromStr for StatusRange {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DeployError::InvalidRange(s.to_string());

        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 2 {
            return Err(invalid());
        }

        let min = parts[0].trim().parse::<u16>().map_err(|_| invalid())?;
        let max = parts[1].trim().parse::<u16>().map_err(|_| invalid())?;
        Ok(Self { min, max })
    }
}

impl std::fmt::Display for StatusRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Health check options
#[derive(Debug, Clone)]
pub struct HealthCheckOptions {
    /// URL to GET
    pub url: String,

    /// Accepted status range, `min-max`
    pub code_range: String,

    /// Per-attempt deadline; zero disables it
    pub timeout: Duration,

    /// Maximum number of attempts
    pub max_attempts: u32,

    /// Wait before the first attempt
    pub initial_delay: Duration,

    /// Wait between attempts
    pub interval: Duration,
}

impl Default for HealthCheckOptions {
    fn default() -> Self {
        Self {
            url: String::new(),
            code_range: "200-399".to_string(),
            timeout: Duration::from_secs(10),
            max_attempts: 5,
            initial_delay: Duration::ZERO,
            interval: Duration::from_secs(5),
        }
    }
}

/// Run the health check, sleeping with tokio's timer
pub async fn verify(options: &HealthCheckOptions) -> Result<HealthCheckResult, DeployError> {
    verify_with_sleep(options, tokio::time::sleep).await
}

/// Run the health check with a caller-supplied sleep function.
///
/// Returns `Err` only for invalid options, before any request is made. An
/// unhealthy endpoint yields `Ok` with `success == false`.
pub async fn verify_with_sleep<S, F>(
    options: &HealthCheckOptions,
    sleep_fn: S,
) -> Result<HealthCheckResult, DeployError>
where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    let range: StatusRange = options.code_range.parse()?;
    if options.max_attempts == 0 {
        return Err(DeployError::InputValidation(
            "health check needs at least one attempt".to_string(),
        ));
    }

    let client = Client::builder()
        .user_agent(concat!("releasectl/", env!("CARGO_PKG_VERSION")))
        .build()?;

    if !options.initial_delay.is_zero() {
        info!("Waiting {:?} before the first health check", options.initial_delay);
        sleep_fn(options.initial_delay).await;
    }

    let mut last_status = None;
    let mut last_error = None;

    for attempt in 1..=options.max_attempts {
        debug!("Health check attempt {}/{}: GET {}", attempt, options.max_attempts, options.url);

        match attempt_once(&client, &options.url, options.timeout).await {
            Ok(code) => {
                last_status = Some(code);
                if range.contains(code) {
                    info!(
                        "Health check passed with status {} on attempt {}/{}",
                        code, attempt, options.max_attempts
                    );
                    return Ok(HealthCheckResult {
                        success: true,
                        status_code: Some(code),
                        attempts: attempt,
                        error: None,
                    });
                }
                let reason = format!("status code {} outside expected range {}", code, range);
                warn!("Health check attempt {}/{}: {}", attempt, options.max_attempts, reason);
                last_error = Some(reason);
            }
            Err(reason) => {
                warn!("Health check attempt {}/{}: {}", attempt, options.max_attempts, reason);
                last_error = Some(reason);
            }
        }

        if attempt < options.max_attempts && !options.interval.is_zero() {
            sleep_fn(options.interval).await;
        }
    }

    Ok(HealthCheckResult {
        success: false,
        status_code: last_status,
        attempts: options.max_attempts,
        error: last_error,
    })
}

async fn attempt_once(client: &Client, url: &str, timeout: Duration) -> Result<u16, String> {
    let request = client.get(url).send();

    let response = if timeout.is_zero() {
        request.await
    } else {
        match tokio::time::timeout(timeout, request).await {
            Ok(response) => response,
            Err(_) => return Err(format!("request timed out after {}s", timeout.as_secs())),
        }
    };

    match response {
        Ok(response) => Ok(response.status().as_u16()),
        Err(e) if e.is_timeout() => Err(format!("request timed out: {}", e)),
        Err(e) => Err(format!("request failed: {}", e)),
    }
}
