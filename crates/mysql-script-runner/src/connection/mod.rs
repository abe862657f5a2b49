//! Database connection contract.
//!
//! The runner drives a single connection through connect, execute and close.
//! [`Connector`] opens it; [`Connection`] is the open handle. Both are traits so
//! the runner can be exercised without a live server.
//!
//! Implementations report failures as a plain [`DriverError`]; the runner
//! decides whether it is a connect, query or close failure and attaches the
//! script name.
//!
//! - **MySQL**: [`MysqlConnector`] / [`MysqlConnection`] in `mysql.rs`

mod mysql;

pub use mysql::{MysqlConnection, MysqlConnector};

use async_trait::async_trait;
use thiserror::Error;

use crate::config::RunConfig;

/// Failure reported by a database driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DriverError(pub String);

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        DriverError(message.into())
    }
}

impl From<mysql_async::Error> for DriverError {
    fn from(e: mysql_async::Error) -> Self {
        DriverError(e.to_string())
    }
}

/// Result type for driver operations.
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Opens connections for a run.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a connection.
    async fn connect(&self, config: &RunConfig) -> DriverResult<Box<dyn Connection>>;
}

/// An open database connection.
///
/// The runner calls [`close`](Connection::close) exactly once and then drops
/// the handle.
#[async_trait]
pub trait Connection: Send {
    /// Execute the full text of one script.
    async fn execute(&mut self, sql: &str) -> DriverResult<()>;

    /// Close the connection.
    async fn close(&mut self) -> DriverResult<()>;
}
