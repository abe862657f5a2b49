//! MySQL/MariaDB connection implementation.
//!
//! Uses a single `mysql_async` connection, no pool. Scripts go through the
//! text protocol so multi-statement scripts run as one request.

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder, SslOpts};
use tracing::{debug, info, warn};

use super::{Connection, Connector, DriverError, DriverResult};
use crate::config::RunConfig;

/// Opens [`MysqlConnection`]s from a [`RunConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlConnector;

impl MysqlConnector {
    fn ssl_opts(mode: Option<&str>) -> Option<SslOpts> {
        let mode = mode?;
        match mode.to_lowercase().as_str() {
            "disable" => {
                warn!("MySQL TLS is disabled. Credentials will be transmitted in plaintext.");
                None
            }
            "prefer" | "require" => Some(SslOpts::default().with_danger_accept_invalid_certs(true)),
            "verify-ca" | "verify_ca" => Some(SslOpts::default().with_danger_skip_domain_validation(true)),
            "verify-full" | "verify_identity" => Some(SslOpts::default()),
            _ => {
                warn!("Unknown ssl_mode '{}', defaulting to Preferred", mode);
                Some(SslOpts::default().with_danger_accept_invalid_certs(true))
            }
        }
    }

    /// Build driver options from the run configuration.
    pub fn opts(config: &RunConfig) -> Opts {
        let mut builder = OptsBuilder::default()
            .ip_or_hostname(config.host.as_str())
            .tcp_port(config.port)
            .db_name(config.database.as_deref())
            .user(config.user.as_deref())
            .pass(config.password.as_deref())
            // Use utf8mb4 for full Unicode support
            .init(vec!["SET NAMES utf8mb4"]);

        if let Some(ssl) = Self::ssl_opts(config.ssl_mode.as_deref()) {
            builder = builder.ssl_opts(ssl);
        }

        builder.into()
    }
}

#[async_trait]
impl Connector for MysqlConnector {
    async fn connect(&self, config: &RunConfig) -> DriverResult<Box<dyn Connection>> {
        let conn = Conn::new(Self::opts(config)).await?;

        info!(
            "Connected to MySQL: {}/{}",
            config.endpoint(),
            config.database.as_deref().unwrap_or("")
        );

        Ok(Box::new(MysqlConnection { conn: Some(conn) }))
    }
}

/// An open MySQL connection.
pub struct MysqlConnection {
    conn: Option<Conn>,
}

#[async_trait]
impl Connection for MysqlConnection {
    async fn execute(&mut self, sql: &str) -> DriverResult<()> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| DriverError::new("connection is already closed"))?;
        conn.query_drop(sql).await?;
        Ok(())
    }

    async fn close(&mut self) -> DriverResult<()> {
        if let Some(conn) = self.conn.take() {
            conn.disconnect().await?;
            debug!("MySQL connection closed");
        }
        Ok(())
    }
}
