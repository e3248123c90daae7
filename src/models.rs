//! Core data types: backend kinds, data source descriptors, and validation
//! outcomes.
//!
//! # Security
//! Descriptor `Display` implementations never include credentials, so values
//! of these types are safe to log as-is.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DbProbeError, ProbeStage};

/// Supported database backend families.
///
/// A kind is a routing tag, not a promise of a built-in driver: `SqlServer`
/// and `Odbc` ship without a default adapter and validate as
/// [`FailureKind::UnsupportedBackend`] unless the caller registers one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// PostgreSQL
    Postgres,
    /// MySQL / MariaDB
    MySql,
    /// SQLite (file-backed or in-memory)
    Sqlite,
    /// Microsoft SQL Server
    SqlServer,
    /// Generic ODBC-reachable SQL engine, addressed by DSN
    Odbc,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
            Self::SqlServer => "sqlserver",
            Self::Odbc => "odbc",
        };
        write!(f, "{name}")
    }
}

impl BackendKind {
    /// Whether this backend is reached over the network.
    ///
    /// Non-networked backends (SQLite) have no host requirement in
    /// descriptor validation.
    pub fn is_networked(&self) -> bool {
        !matches!(self, Self::Sqlite)
    }
}

/// Identifies a configured data source and how to reach it.
///
/// Owned by configuration storage outside this crate; the validator borrows
/// a descriptor for the duration of one call and neither persists nor
/// mutates it.
///
/// # Security
/// The `Display` implementation omits username and password. Serialized
/// forms do include the password field, so serialized descriptors belong in
/// the same trust domain as the configuration store they came from.
///
/// # Example
/// ```rust
/// use dbprobe::models::{BackendKind, DataSourceDescriptor};
///
/// let descriptor = DataSourceDescriptor::new("orders", BackendKind::Postgres)
///     .with_host("db.internal")
///     .with_port(5432)
///     .with_database("orders")
///     .with_username("reporting");
///
/// assert!(descriptor.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceDescriptor {
    /// Human-readable name of the data source
    pub name: String,
    /// Backend family this source belongs to
    pub kind: BackendKind,
    /// Host address (ignored for non-networked backends)
    pub host: String,
    /// Optional port number
    pub port: Option<u16>,
    /// Optional database / catalog name (the file path for SQLite)
    pub database: Option<String>,
    /// Optional username
    pub username: Option<String>,
    /// Optional password
    pub password: Option<String>,
    /// Backend-specific extra parameters (e.g. `dsn` for ODBC sources)
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl DataSourceDescriptor {
    /// Creates a descriptor with the given name and kind.
    pub fn new(name: impl Into<String>, kind: BackendKind) -> Self {
        Self {
            name: name.into(),
            kind,
            host: "localhost".to_string(),
            port: None,
            database: None,
            username: None,
            password: None,
            extra: BTreeMap::new(),
        }
    }

    /// Builder method to set the host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Builder method to set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Builder method to set the database name.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Builder method to set the username.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Builder method to set the password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Builder method to set one extra backend-specific parameter.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Validates descriptor parameters.
    ///
    /// # Errors
    /// Returns a configuration error if a networked backend has an empty
    /// host or a zero port.
    pub fn validate(&self) -> crate::Result<()> {
        if self.kind.is_networked() && self.host.is_empty() {
            return Err(DbProbeError::configuration("host cannot be empty"));
        }

        if let Some(port) = self.port {
            if port == 0 {
                return Err(DbProbeError::configuration(
                    "port must be greater than 0",
                ));
            }
        }

        Ok(())
    }
}

impl std::fmt::Display for DataSourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}://{}{}{})",
            self.name,
            self.kind,
            self.host,
            self.port.map_or_else(String::new, |p| format!(":{p}")),
            self.database
                .as_ref()
                .map_or_else(String::new, |db| format!("/{db}"))
        )
        // Intentionally omit username and never include credentials
    }
}

/// Classification of a failed validation attempt.
///
/// Kinds are checked in declaration order and each is terminal: once an
/// attempt is classified it never falls through to a later kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Descriptor could not be resolved into a usable connection string
    Configuration,
    /// No driver adapter registered for the descriptor's kind
    UnsupportedBackend,
    /// Connection establishment failed (network, auth, driver rejection)
    ConnectionFailed,
    /// Connection established but the liveness query did not succeed
    ProbeFailed,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::UnsupportedBackend => "unsupported backend",
            Self::ConnectionFailed => "connection failed",
            Self::ProbeFailed => "probe failed",
        };
        write!(f, "{name}")
    }
}

/// Result of one connectivity validation attempt.
///
/// Returned once per [`crate::validator::ConnectivityValidator::validate`]
/// call and never stored by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationOutcome {
    /// The liveness round trip succeeded
    Success,
    /// The attempt failed; `kind` says at which stage, `detail` carries the
    /// underlying resolver/driver diagnostic
    Failure {
        /// Stage classification of the failure
        kind: FailureKind,
        /// Human-readable diagnostic from the underlying error chain
        detail: String,
    },
}

impl ValidationOutcome {
    /// Whether this outcome is `Success`.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// The failure kind, if this outcome is a failure.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Classifies an internal error into a failure outcome.
    ///
    /// Timeouts and cancellations are attributed to the stage that was in
    /// flight: a deadline during `open` reports `ConnectionFailed`, during
    /// `probe` it reports `ProbeFailed`.
    pub fn from_error(error: &DbProbeError) -> Self {
        let kind = match error {
            DbProbeError::Configuration { .. } => FailureKind::Configuration,
            DbProbeError::UnsupportedBackend { .. } => FailureKind::UnsupportedBackend,
            DbProbeError::Connection { .. } => FailureKind::ConnectionFailed,
            DbProbeError::Probe { .. } => FailureKind::ProbeFailed,
            DbProbeError::Timeout { stage, .. } | DbProbeError::Cancelled { stage } => {
                match stage {
                    ProbeStage::Open => FailureKind::ConnectionFailed,
                    ProbeStage::Probe => FailureKind::ProbeFailed,
                }
            }
        };

        Self::Failure {
            kind,
            detail: error.detail(),
        }
    }
}
