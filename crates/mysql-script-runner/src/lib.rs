//! # mysql-script-runner
//!
//! Run an ordered batch of SQL scripts against a MySQL database.
//!
//! - **Fail-fast**: the first failing script stops the batch
//! - **Single connection**, closed exactly once on every path
//! - **Per-script timing** in the log and in the [`RunResult`]
//! - **Optional templating** of each script before it is executed
//! - **Layered configuration**: defaults, inline options, external JSON file
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use mysql_script_runner::{MysqlConnector, RunConfig, ScriptRunner, TaskOptions};
//!
//! #[tokio::main]
//! async fn main() -> mysql_script_runner::Result<()> {
//!     let options = TaskOptions {
//!         config_path: Some("db.json".into()),
//!         user: Some("deploy".into()),
//!         ..Default::default()
//!     };
//!     let config = RunConfig::resolve(&options)?;
//!     let runner = ScriptRunner::new(config, Arc::new(MysqlConnector));
//!     let result = runner
//!         .run_files(&[PathBuf::from("001_schema.sql"), PathBuf::from("002_seed.sql")])
//!         .await
//!         .into_result()?;
//!     println!("Ran {} scripts", result.outcomes.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod runner;
pub mod source;
pub mod template;

// Re-exports for convenient access
pub use config::{RunConfig, TaskOptions};
pub use connection::{Connection, Connector, DriverError, MysqlConnection, MysqlConnector};
pub use error::{Result, RunnerError};
pub use runner::{RunPhase, RunResult, ScriptOutcome, ScriptRunner};
pub use source::{load_scripts, ScriptTask};
pub use template::{InterpolationRenderer, TemplateContext, TemplateError, TemplateRenderer};
