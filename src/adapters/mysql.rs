//! MySQL driver adapter.
//!
//! Same shape as the PostgreSQL adapter: one short-lived
//! `sqlx::MySqlConnection` per validation attempt, closed on every path.

use async_trait::async_trait;
use sqlx::{Connection, MySqlConnection};

use super::{ConnectionHandle, DriverAdapter};
use crate::Result;
use crate::error::DbProbeError;
use crate::models::BackendKind;

/// MySQL driver adapter backed by sqlx.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDriver;

#[async_trait]
impl DriverAdapter for MySqlDriver {
    fn kind(&self) -> BackendKind {
        BackendKind::MySql
    }

    async fn open(&self, connection_string: &str) -> Result<Box<dyn ConnectionHandle>> {
        let conn = MySqlConnection::connect(connection_string)
            .await
            .map_err(|e| DbProbeError::connection_failed("mysql connection rejected", e))?;

        Ok(Box::new(MySqlHandle { conn }))
    }
}

struct MySqlHandle {
    conn: MySqlConnection,
}

#[async_trait]
impl ConnectionHandle for MySqlHandle {
    async fn probe(&mut self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&mut self.conn)
            .await
            .map(|_| ())
            .map_err(|e| DbProbeError::probe_failed("mysql liveness query failed", e))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| DbProbeError::connection_failed("mysql close failed", e))
    }
}
