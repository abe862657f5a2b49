//! Configuration type definitions.

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

/// Default MySQL host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default MySQL port.
pub const DEFAULT_PORT: u16 = 3306;

/// Effective connection and runtime configuration for a run.
///
/// Produced by [`RunConfig::resolve`] and read-only to the runner.
#[derive(Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Database host (default: "localhost").
    pub host: String,

    /// Database port (default: 3306).
    pub port: u16,

    /// Default database for the connection.
    pub database: Option<String>,

    /// Username. Required.
    pub user: Option<String>,

    /// Password. Required.
    pub password: Option<String>,

    /// Render each script as a template before executing it.
    pub template_enabled: bool,

    /// External JSON config file the options were merged from.
    pub config_path: Option<PathBuf>,

    /// TLS mode: disable, prefer, require, verify-ca, verify-full.
    /// Unset means a plain connection.
    pub ssl_mode: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database: None,
            user: None,
            password: None,
            template_enabled: false,
            config_path: None,
            ssl_mode: None,
        }
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("template_enabled", &self.template_enabled)
            .field("config_path", &self.config_path)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

/// Options bundle passed by the caller, and the shape of the external
/// JSON config file.
///
/// Every field is optional; `None` (or JSON `null`) means "not specified"
/// and leaves the underlying value untouched when merged. Unknown keys in
/// the config file are ignored.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOptions {
    /// Path to an external JSON config file merged over these options.
    #[serde(default)]
    pub config_path: Option<PathBuf>,

    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub database: Option<String>,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    /// Enables templating of each script before execution.
    #[serde(default)]
    pub sql_is_template: Option<bool>,

    #[serde(default)]
    pub ssl_mode: Option<String>,
}

impl fmt::Debug for TaskOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskOptions")
            .field("config_path", &self.config_path)
            .field("host", &self.host)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("port", &self.port)
            .field("sql_is_template", &self.sql_is_template)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

impl TaskOptions {
    /// Overlay every specified option onto `config`.
    pub fn apply_to(&self, config: &mut RunConfig) {
        if let Some(ref host) = self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.database.is_some() {
            config.database = self.database.clone();
        }
        if self.user.is_some() {
            config.user = self.user.clone();
        }
        if self.password.is_some() {
            config.password = self.password.clone();
        }
        if let Some(enabled) = self.sql_is_template {
            config.template_enabled = enabled;
        }
        if self.ssl_mode.is_some() {
            config.ssl_mode = self.ssl_mode.clone();
        }
    }
}
