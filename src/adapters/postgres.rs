//! PostgreSQL driver adapter.
//!
//! Opens a single short-lived `sqlx::PgConnection` per validation attempt.
//! No pooling: the handle exists only for the duration of one probe and is
//! closed before the outcome is returned.

use async_trait::async_trait;
use sqlx::{Connection, PgConnection};

use super::{ConnectionHandle, DriverAdapter};
use crate::Result;
use crate::error::DbProbeError;
use crate::models::BackendKind;

/// PostgreSQL driver adapter backed by sqlx.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDriver;

#[async_trait]
impl DriverAdapter for PostgresDriver {
    fn kind(&self) -> BackendKind {
        BackendKind::Postgres
    }

    async fn open(&self, connection_string: &str) -> Result<Box<dyn ConnectionHandle>> {
        let conn = PgConnection::connect(connection_string)
            .await
            .map_err(|e| DbProbeError::connection_failed("postgres connection rejected", e))?;

        Ok(Box::new(PostgresHandle { conn }))
    }
}

struct PostgresHandle {
    conn: PgConnection,
}

#[async_trait]
impl ConnectionHandle for PostgresHandle {
    async fn probe(&mut self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&mut self.conn)
            .await
            .map(|_| ())
            .map_err(|e| DbProbeError::probe_failed("postgres liveness query failed", e))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| DbProbeError::connection_failed("postgres close failed", e))
    }
}
