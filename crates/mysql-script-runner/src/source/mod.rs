//! Script sources.
//!
//! Scripts are read from disk up front, before any connection is opened, so a
//! missing or unreadable file never leaves the database half-migrated.

use std::path::{Path, PathBuf};

use futures::future::try_join_all;
use tracing::debug;

use crate::error::{Result, RunnerError};

/// One SQL script queued for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTask {
    /// Source path or name, used in log lines and error messages.
    pub identifier: String,

    /// Script text as read from the source.
    pub raw_text: String,

    /// Text after template rendering. Set by the runner when templating is on.
    pub rendered_text: Option<String>,
}

impl ScriptTask {
    pub fn new(identifier: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            raw_text: raw_text.into(),
            rendered_text: None,
        }
    }

    /// The text to submit: the rendered form if rendering happened, otherwise
    /// the raw text.
    pub fn sql(&self) -> &str {
        self.rendered_text.as_deref().unwrap_or(&self.raw_text)
    }
}

async fn read_script(path: &Path) -> Result<ScriptTask> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| RunnerError::ScriptRead {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("Read {} bytes from '{}'", text.len(), path.display());
    Ok(ScriptTask::new(path.display().to_string(), text))
}

/// Read every script file, preserving input order.
///
/// Files are read concurrently; the first read failure aborts the load.
pub async fn load_scripts(paths: &[PathBuf]) -> Result<Vec<ScriptTask>> {
    try_join_all(paths.iter().map(|p| read_script(p))).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_load_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = Vec::new();
        for (name, sql) in [("b.sql", "SELECT 2"), ("a.sql", "SELECT 1"), ("c.sql", "")] {
            let path = dir.path().join(name);
            fs::write(&path, sql).unwrap();
            paths.push(path);
        }

        let tasks = load_scripts(&paths).await.unwrap();
        let ids: Vec<_> = tasks.iter().map(|t| t.identifier.clone()).collect();
        assert_eq!(
            ids,
            paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>()
        );
        assert_eq!(tasks[0].raw_text, "SELECT 2");
        assert_eq!(tasks[2].raw_text, "");
        assert!(tasks.iter().all(|t| t.rendered_text.is_none()));
    }

    #[tokio::test]
    async fn test_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.sql");
        fs::write(&good, "SELECT 1").unwrap();
        let missing = dir.path().join("missing.sql");

        let err = load_scripts(&[good, missing.clone()]).await.unwrap_err();
        match err {
            RunnerError::ScriptRead { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_sql_prefers_rendered_text() {
        let mut task = ScriptTask::new("t.sql", "SELECT '<%= x %>'");
        assert_eq!(task.sql(), "SELECT '<%= x %>'");
        task.rendered_text = Some("SELECT 'y'".into());
        assert_eq!(task.sql(), "SELECT 'y'");
    }
}
