//! Error types for the script runner.

use std::path::PathBuf;

use thiserror::Error;

/// Exit code for configuration errors (missing options, bad config file).
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code when no script files were given.
pub const EXIT_NO_SOURCES: u8 = 2;
/// Exit code when the database connection could not be opened.
pub const EXIT_CONNECT_ERROR: u8 = 3;
/// Exit code when a script failed to execute.
pub const EXIT_QUERY_ERROR: u8 = 4;
/// Exit code when a script template failed to render.
pub const EXIT_TEMPLATE_ERROR: u8 = 5;
/// Exit code when closing the connection failed after a clean run.
pub const EXIT_CLOSE_ERROR: u8 = 6;
/// Exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for script runs.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// Configuration error (missing required option, invalid value)
    #[error("Configuration error: {0}")]
    Config(String),

    /// External config file exists but is not valid JSON
    #[error("Unable to parse config file from '{path}' as JSON: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// The batch contained no scripts
    #[error("No source files specified but at least one must be. Source files are the sql scripts to run.")]
    NoSourceFiles,

    /// A script file could not be read
    #[error("Unable to read SQL script '{}'", path.display())]
    ScriptRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Opening the database connection failed
    #[error("Unable to connect to database: {0}")]
    Connect(String),

    /// A script failed on the server
    #[error("An error occurred running SQL script '{script}': {message}")]
    Query { script: String, message: String },

    /// A script template could not be rendered
    #[error("Unable to render SQL script '{script}' as a template: {message}")]
    Template { script: String, message: String },

    /// Closing the database connection failed
    #[error("Error closing database connection: {0}")]
    Close(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RunnerError {
    /// Create a Query error for the named script
    pub fn query(script: impl Into<String>, message: impl Into<String>) -> Self {
        RunnerError::Query {
            script: script.into(),
            message: message.into(),
        }
    }

    /// Create a Template error for the named script
    pub fn template(script: impl Into<String>, message: impl Into<String>) -> Self {
        RunnerError::Template {
            script: script.into(),
            message: message.into(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunnerError::Config(_) | RunnerError::ConfigParse { .. } | RunnerError::Json(_) => {
                EXIT_CONFIG_ERROR
            }
            RunnerError::NoSourceFiles => EXIT_NO_SOURCES,
            RunnerError::Connect(_) => EXIT_CONNECT_ERROR,
            RunnerError::Query { .. } => EXIT_QUERY_ERROR,
            RunnerError::Template { .. } => EXIT_TEMPLATE_ERROR,
            RunnerError::Close(_) => EXIT_CLOSE_ERROR,
            RunnerError::ScriptRead { .. } | RunnerError::Io(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_names_script() {
        let err = RunnerError::query("s2.sql", "syntax error");
        let msg = err.to_string();
        assert!(msg.contains("s2.sql"));
        assert!(msg.contains("syntax error"));
        assert_eq!(err.exit_code(), EXIT_QUERY_ERROR);
    }

    #[test]
    fn test_format_detailed_includes_cause() {
        let err = RunnerError::ScriptRead {
            path: PathBuf::from("missing.sql"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: Unable to read SQL script 'missing.sql'"));
        assert!(detailed.contains("Caused by:\n  1: no such file"));
        assert_eq!(err.exit_code(), EXIT_IO_ERROR);
    }

    #[test]
    fn test_exit_codes_are_distinct_per_failure_kind() {
        let codes = [
            RunnerError::Config("x".into()).exit_code(),
            RunnerError::NoSourceFiles.exit_code(),
            RunnerError::Connect("x".into()).exit_code(),
            RunnerError::query("a", "b").exit_code(),
            RunnerError::template("a", "b").exit_code(),
            RunnerError::Close("x".into()).exit_code(),
            RunnerError::Io(std::io::Error::other("x")).exit_code(),
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }
}
