//! Script runner - sequential, fail-fast execution over one connection.
//!
//! A run moves through [`RunPhase`]s in order:
//!
//! ```text
//! Idle -> Validating -> Connecting -> Executing(0..n) -> Closing -> Done
//! ```
//!
//! Anything that fails before `Connecting` completes is fatal and never opens
//! a connection. Once a connection is open it is closed exactly once, whatever
//! happens to the scripts. Each step is awaited before the next one starts, so
//! at most one query is ever in flight.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::connection::{Connection, Connector};
use crate::error::{Result, RunnerError};
use crate::source::{load_scripts, ScriptTask};
use crate::template::{InterpolationRenderer, TemplateContext, TemplateRenderer};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Validating,
    Connecting,
    Executing(usize),
    Closing,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Idle => write!(f, "idle"),
            RunPhase::Validating => write!(f, "validating"),
            RunPhase::Connecting => write!(f, "connecting"),
            RunPhase::Executing(i) => write!(f, "executing script #{}", i + 1),
            RunPhase::Closing => write!(f, "closing"),
            RunPhase::Done => write!(f, "done"),
        }
    }
}

/// A script that executed successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptOutcome {
    /// Script path or name.
    pub identifier: String,

    /// Wall-clock time of the execute call.
    pub duration_ms: u64,

    /// Always `true`; a failed script is reported through `first_error`.
    pub success: bool,
}

fn serialize_error<S: Serializer>(
    error: &Option<RunnerError>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Result of a run.
///
/// `outcomes` holds one entry per script that succeeded, in execution order.
/// A failing script adds no outcome; its error is `first_error`.
#[derive(Debug, Serialize)]
pub struct RunResult {
    /// Successful scripts, in order.
    pub outcomes: Vec<ScriptOutcome>,

    /// The first fatal, query or template error, if any.
    #[serde(serialize_with = "serialize_error")]
    pub first_error: Option<RunnerError>,

    /// Error raised while closing the connection.
    #[serde(serialize_with = "serialize_error")]
    pub connection_close_error: Option<RunnerError>,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,
}

impl RunResult {
    fn aborted(started_at: DateTime<Utc>, error: RunnerError) -> Self {
        Self {
            outcomes: Vec::new(),
            first_error: Some(error),
            connection_close_error: None,
            started_at,
            completed_at: Utc::now(),
        }
    }

    /// True when every script ran and the connection closed cleanly.
    pub fn is_success(&self) -> bool {
        self.definitive_error().is_none()
    }

    /// The error that decides the run's outcome.
    ///
    /// A script failure always wins over a close failure that followed it.
    pub fn definitive_error(&self) -> Option<&RunnerError> {
        self.first_error
            .as_ref()
            .or(self.connection_close_error.as_ref())
    }

    /// Total duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        (self.completed_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    /// Convert into `Ok(self)` on success or the definitive error.
    pub fn into_result(mut self) -> Result<Self> {
        if let Some(e) = self.first_error.take() {
            return Err(e);
        }
        if let Some(e) = self.connection_close_error.take() {
            return Err(e);
        }
        Ok(self)
    }

    /// Serialize to a pretty JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Runs an ordered batch of scripts over a single connection.
pub struct ScriptRunner {
    config: RunConfig,
    connector: Arc<dyn Connector>,
    renderer: Arc<dyn TemplateRenderer>,
    context: TemplateContext,
}

impl ScriptRunner {
    /// Create a runner with the built-in renderer and an empty template
    /// context.
    pub fn new(config: RunConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            config,
            connector,
            renderer: Arc::new(InterpolationRenderer),
            context: TemplateContext::default(),
        }
    }

    /// Use a different template renderer.
    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Set the variables available to templates.
    pub fn with_context(mut self, context: TemplateContext) -> Self {
        self.context = context;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Read the given script files and run them in order.
    pub async fn run_files(&self, paths: &[PathBuf]) -> RunResult {
        let started_at = Utc::now();

        if let Err(e) = self.preflight(paths.len()) {
            return RunResult::aborted(started_at, e);
        }
        let tasks = match load_scripts(paths).await {
            Ok(tasks) => tasks,
            Err(e) => {
                debug!("Script load failed: {}", e);
                return RunResult::aborted(started_at, e);
            }
        };

        self.drive(started_at, tasks).await
    }

    /// Run already-loaded scripts in order.
    pub async fn run(&self, tasks: Vec<ScriptTask>) -> RunResult {
        let started_at = Utc::now();

        if let Err(e) = self.preflight(tasks.len()) {
            return RunResult::aborted(started_at, e);
        }

        self.drive(started_at, tasks).await
    }

    fn enter(&self, phase: RunPhase) {
        debug!("Run phase: {}", phase);
    }

    fn preflight(&self, script_count: usize) -> Result<()> {
        self.enter(RunPhase::Idle);
        self.enter(RunPhase::Validating);
        let checked = self.config.validate().and_then(|()| {
            if script_count == 0 {
                Err(RunnerError::NoSourceFiles)
            } else {
                Ok(())
            }
        });
        if let Err(ref e) = checked {
            debug!("Preflight failed: {}", e);
        }
        checked
    }

    async fn drive(&self, started_at: DateTime<Utc>, tasks: Vec<ScriptTask>) -> RunResult {
        self.enter(RunPhase::Connecting);
        let mut connection = match self.connector.connect(&self.config).await {
            Ok(conn) => conn,
            Err(e) => {
                let err = RunnerError::Connect(e.to_string());
                debug!("{}", err);
                return RunResult::aborted(started_at, err);
            }
        };

        let mut outcomes = Vec::with_capacity(tasks.len());
        let first_error = self
            .execute_all(&mut *connection, tasks, &mut outcomes)
            .await
            .err();

        self.enter(RunPhase::Closing);
        let close_result = connection.close().await;
        drop(connection);

        let connection_close_error = match close_result {
            Ok(()) => None,
            Err(e) => {
                let err = RunnerError::Close(e.to_string());
                // Only a subordinate close error is logged here; the definitive
                // one is reported by the caller.
                if first_error.is_some() {
                    warn!("{}", err);
                }
                Some(err)
            }
        };

        if let Some(ref e) = first_error {
            debug!("Run stopped: {}", e);
        }

        self.enter(RunPhase::Done);
        RunResult {
            outcomes,
            first_error,
            connection_close_error,
            started_at,
            completed_at: Utc::now(),
        }
    }

    /// Execute tasks in order, stopping at the first failure.
    async fn execute_all(
        &self,
        connection: &mut dyn Connection,
        tasks: Vec<ScriptTask>,
        outcomes: &mut Vec<ScriptOutcome>,
    ) -> Result<()> {
        for (i, mut task) in tasks.into_iter().enumerate() {
            self.enter(RunPhase::Executing(i));

            if self.config.template_enabled {
                let rendered = self
                    .renderer
                    .render(&task.raw_text, &self.context)
                    .map_err(|e| RunnerError::template(&task.identifier, e.to_string()))?;
                task.rendered_text = Some(rendered);
            }

            let start = Instant::now();
            connection
                .execute(task.sql())
                .await
                .map_err(|e| RunnerError::query(&task.identifier, e.to_string()))?;
            let duration_ms = start.elapsed().as_millis() as u64;

            info!("Executed sql file '{}' in {}ms.", task.identifier, duration_ms);
            outcomes.push(ScriptOutcome {
                identifier: task.identifier,
                duration_ms,
                success: true,
            });
        }

        Ok(())
    }
}
