//! Configuration validation.

use super::RunConfig;
use crate::error::{Result, RunnerError};

/// Accepted values for `ssl_mode`.
pub const SSL_MODES: &[&str] = &[
    "disable",
    "prefer",
    "require",
    "verify-ca",
    "verify_ca",
    "verify-full",
    "verify_identity",
];

fn is_missing(value: Option<&str>) -> bool {
    value.map_or(true, str::is_empty)
}

fn required(option: &str) -> RunnerError {
    RunnerError::Config(format!(
        "{} option is required but none was specified.",
        option
    ))
}

/// Validate the configuration.
///
/// Stops at the first missing required option.
pub fn validate(config: &RunConfig) -> Result<()> {
    if config.host.is_empty() {
        return Err(required("host"));
    }
    if is_missing(config.user.as_deref()) {
        return Err(required("user"));
    }
    if is_missing(config.password.as_deref()) {
        return Err(required("password"));
    }

    if config.port == 0 {
        return Err(RunnerError::Config("port must be between 1 and 65535".into()));
    }

    if let Some(ref mode) = config.ssl_mode {
        if !SSL_MODES.contains(&mode.to_lowercase().as_str()) {
            return Err(RunnerError::Config(format!(
                "sslMode must be one of {}, got '{}'",
                SSL_MODES.join(", "),
                mode
            )));
        }
    }

    Ok(())
}
