//! Configuration resolution and validation.
//!
//! A [`RunConfig`] is built in three layers, later layers winning:
//!
//! 1. Baseline defaults (`localhost:3306`, templating off)
//! 2. Inline [`TaskOptions`] passed by the caller
//! 3. The external JSON file named by `TaskOptions::config_path`, if it exists

mod types;
mod validation;

pub use types::*;

use crate::error::{Result, RunnerError};
use std::path::Path;
use tracing::{debug, warn};

impl RunConfig {
    /// Merge inline options and the optional external config file over the
    /// defaults.
    ///
    /// A config path that does not resolve to an existing file only logs a
    /// warning. A file that exists but is not valid JSON is fatal.
    pub fn resolve(options: &TaskOptions) -> Result<Self> {
        let mut config = RunConfig::default();
        options.apply_to(&mut config);

        let Some(configured) = options.config_path.as_deref() else {
            return Ok(config);
        };
        if configured.as_os_str().is_empty() {
            return Ok(config);
        }

        let full_path = std::path::absolute(configured)?;
        if !full_path.exists() {
            warn!(
                "configPath option specified but was not resolved to a valid file. \
                 Configured path is '{}' which resolved to '{}'.",
                configured.display(),
                full_path.display()
            );
            return Ok(config);
        }

        let file_options = Self::load_file(&full_path)?;
        file_options.apply_to(&mut config);
        config.config_path = Some(full_path);
        debug!("Resolved configuration: {:?}", config);

        Ok(config)
    }

    /// Read an external config file as [`TaskOptions`].
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<TaskOptions> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| RunnerError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Host and port as `host:port`, for log lines.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_options() {
        let config = RunConfig::resolve(&TaskOptions::default()).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 3306);
        assert!(!config.template_enabled);
        assert!(config.database.is_none());
        assert!(config.user.is_none());
        assert!(config.password.is_none());
    }

    #[test]
    fn test_inline_options_override_defaults() {
        let options = TaskOptions {
            host: Some("db1".into()),
            user: Some("u".into()),
            password: Some("p".into()),
            sql_is_template: Some(true),
            ..Default::default()
        };
        let config = RunConfig::resolve(&options).unwrap();
        assert_eq!(config.host, "db1");
        assert_eq!(config.port, 3306);
        assert_eq!(config.user.as_deref(), Some("u"));
        assert!(config.template_enabled);
    }

    #[test]
    fn test_file_port_merged_with_inline_host() {
        let file = config_file(r#"{"port": 3307}"#);
        let options = TaskOptions {
            config_path: Some(file.path().to_path_buf()),
            host: Some("db1".into()),
            user: Some("u".into()),
            password: Some("p".into()),
            ..Default::default()
        };

        let config = RunConfig::resolve(&options).unwrap();
        assert_eq!(config.port, 3307);
        assert_eq!(config.host, "db1");
        assert_eq!(config.user.as_deref(), Some("u"));
        assert!(config.config_path.is_some());
    }

    #[test]
    fn test_file_overrides_inline() {
        let file = config_file(
            r#"{"host": "file-host", "user": "file-user", "sqlIsTemplate": true, "unknown": 1}"#,
        );
        let options = TaskOptions {
            config_path: Some(file.path().to_path_buf()),
            host: Some("inline-host".into()),
            user: Some("inline-user".into()),
            password: Some("p".into()),
            ..Default::default()
        };

        let config = RunConfig::resolve(&options).unwrap();
        assert_eq!(config.host, "file-host");
        assert_eq!(config.user.as_deref(), Some("file-user"));
        assert_eq!(config.password.as_deref(), Some("p"));
        assert!(config.template_enabled);
    }

    #[test]
    fn test_null_in_file_keeps_inline_value() {
        let file = config_file(r#"{"database": null}"#);
        let options = TaskOptions {
            config_path: Some(file.path().to_path_buf()),
            database: Some("app".into()),
            ..Default::default()
        };

        let config = RunConfig::resolve(&options).unwrap();
        assert_eq!(config.database.as_deref(), Some("app"));
    }

    #[test]
    fn test_missing_config_file_is_not_fatal() {
        let options = TaskOptions {
            config_path: Some("definitely/not/here.json".into()),
            user: Some("u".into()),
            ..Default::default()
        };

        let config = RunConfig::resolve(&options).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.user.as_deref(), Some("u"));
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_empty_config_path_is_ignored() {
        let options = TaskOptions {
            config_path: Some("".into()),
            ..Default::default()
        };
        assert!(RunConfig::resolve(&options).is_ok());
    }

    #[test]
    fn test_unparsable_config_file_is_fatal() {
        let file = config_file("{ not json");
        let options = TaskOptions {
            config_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };

        let err = RunConfig::resolve(&options).unwrap_err();
        assert!(matches!(err, RunnerError::ConfigParse { .. }));
        assert!(err.to_string().starts_with("Unable to parse config file from"));
    }

    #[test]
    fn test_wrong_value_type_in_file_is_fatal() {
        let file = config_file(r#"{"port": "not-a-number"}"#);
        let options = TaskOptions {
            config_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        assert!(matches!(
            RunConfig::resolve(&options),
            Err(RunnerError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_debug_redacts_password() {
        let options = TaskOptions {
            password: Some("super_secret_password_123".into()),
            ..Default::default()
        };
        let config = RunConfig::resolve(&options).unwrap();

        for output in [format!("{:?}", options), format!("{:?}", config)] {
            assert!(output.contains("[REDACTED]"));
            assert!(!output.contains("super_secret_password_123"));
        }
    }
}
