//! Driver adapter traits and the backend registry.
//!
//! Every database backend family is wrapped in one [`DriverAdapter`] that
//! knows how to open a single short-lived connection and hand back a
//! [`ConnectionHandle`] for the liveness probe. The traits are object-safe
//! so the registry can hold `Arc<dyn DriverAdapter>` and dispatch by
//! [`BackendKind`] at runtime; adding a backend is a registration, not a
//! branch in the validator.
//!
//! # Cancellation
//! `open` and `probe` futures are raced against the caller's deadline and
//! cancellation token by the validator; cancellation is delivered by
//! dropping the in-flight future. Implementations must therefore only block
//! at `.await` points.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::models::BackendKind;

/// An open, live connection to one backend.
///
/// Created at the start of a validation attempt and closed on every exit
/// path of that attempt. Never shared across concurrent validations.
#[async_trait]
pub trait ConnectionHandle: Send {
    /// Runs a minimal liveness round trip that requires no schema
    /// knowledge and returns no meaningful payload (`SELECT 1` for SQL
    /// backends).
    ///
    /// # Errors
    /// Returns a probe error if the backend accepted the connection but is
    /// not serving queries.
    async fn probe(&mut self) -> Result<()>;

    /// Closes the connection, releasing the backend-side slot.
    ///
    /// # Errors
    /// Returns a connection error if graceful shutdown fails; the handle is
    /// consumed either way.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Wraps one database backend family behind a uniform open capability.
///
/// Adapters are stateless per call: each validation attempt performs one
/// `open` and works only with the returned handle. No pooling or reuse.
#[async_trait]
pub trait DriverAdapter: Send + Sync {
    /// The backend kind this adapter serves; used as its registry key.
    fn kind(&self) -> BackendKind;

    /// Opens a fresh connection from a resolved connection string.
    ///
    /// # Security
    /// The connection string may carry credentials; implementations must
    /// sanitize it out of any error they return.
    ///
    /// # Errors
    /// Returns a connection error for network, authentication, or driver
    /// level failures.
    async fn open(&self, connection_string: &str) -> Result<Box<dyn ConnectionHandle>>;
}

/// Registry of driver adapters keyed by backend kind.
///
/// # Example
/// ```rust
/// use dbprobe::adapters::AdapterRegistry;
/// use dbprobe::models::BackendKind;
///
/// let registry = AdapterRegistry::with_defaults();
/// assert!(registry.get(BackendKind::Odbc).is_none());
/// ```
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: BTreeMap<BackendKind, Arc<dyn DriverAdapter>>,
}

impl AdapterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the compiled-in sqlx adapters registered.
    ///
    /// Which adapters are present depends on the cargo features this crate
    /// was built with (`postgresql`, `mysql`, `sqlite`). Kinds without a
    /// built-in adapter (SQL Server, ODBC) validate as unsupported until
    /// the caller registers one.
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(feature = "postgresql")]
        registry.register(Arc::new(postgres::PostgresDriver));

        #[cfg(feature = "mysql")]
        registry.register(Arc::new(mysql::MySqlDriver));

        #[cfg(feature = "sqlite")]
        registry.register(Arc::new(sqlite::SqliteDriver));

        registry
    }

    /// Registers an adapter under its declared kind, replacing any
    /// previous registration for that kind.
    pub fn register(&mut self, adapter: Arc<dyn DriverAdapter>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    /// Looks up the adapter for a backend kind.
    pub fn get(&self, kind: BackendKind) -> Option<Arc<dyn DriverAdapter>> {
        self.adapters.get(&kind).cloned()
    }

    /// The backend kinds currently registered, in stable order.
    pub fn kinds(&self) -> Vec<BackendKind> {
        self.adapters.keys().copied().collect()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

// Database-specific adapter modules
#[cfg(feature = "postgresql")]
pub mod postgres;

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(feature = "sqlite")]
pub mod sqlite;
