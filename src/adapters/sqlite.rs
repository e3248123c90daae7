//! SQLite driver adapter.
//!
//! SQLite is file-backed rather than networked, but it goes through the
//! same open/probe contract as the other backends so the validator stays
//! backend-agnostic.

use async_trait::async_trait;
use sqlx::{Connection, SqliteConnection};

use super::{ConnectionHandle, DriverAdapter};
use crate::Result;
use crate::error::DbProbeError;
use crate::models::BackendKind;

/// SQLite driver adapter backed by sqlx.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

#[async_trait]
impl DriverAdapter for SqliteDriver {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    async fn open(&self, connection_string: &str) -> Result<Box<dyn ConnectionHandle>> {
        let conn = SqliteConnection::connect(connection_string)
            .await
            .map_err(|e| DbProbeError::connection_failed("sqlite open rejected", e))?;

        Ok(Box::new(SqliteHandle { conn }))
    }
}

struct SqliteHandle {
    conn: SqliteConnection,
}

#[async_trait]
impl ConnectionHandle for SqliteHandle {
    async fn probe(&mut self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&mut self.conn)
            .await
            .map(|_| ())
            .map_err(|e| DbProbeError::probe_failed("sqlite liveness query failed", e))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| DbProbeError::connection_failed("sqlite close failed", e))
    }
}
