//! Multi-backend database connectivity validation.
//!
//! This crate answers one question for a configured data source: can we
//! reach it and is it serving queries right now? A descriptor (backend kind
//! plus connection parameters) is resolved into a connection string, the
//! matching driver adapter opens a fresh connection, a trivial liveness
//! query runs, and the connection is closed. Every attempt is a
//! short-lived probe with no pooling or reuse.
//!
//! Failures are classified, not collapsed: a malformed descriptor, an
//! unregistered backend kind, a refused connection, and a backend that
//! accepts connections but cannot serve queries each report a distinct
//! failure kind, so callers can surface actionable diagnostics.
//!
//! # Architecture
//! - Object-safe adapter traits behind a kind-keyed registry; adding a
//!   backend is a registration, not a new branch in the validator.
//! - Every blocking stage honors a caller-supplied deadline and
//!   cancellation token; a hung peer cannot stall the caller, and the
//!   connection is released on every exit path.
//! - Connection strings never reach logs or error text unredacted.
//!
//! [`vector::GrowableVec`] is an independent utility for incremental result
//! accumulation with no relationship to the validator.

pub mod adapters;
pub mod error;
pub mod logging;
pub mod models;
pub mod resolver;
pub mod validator;
pub mod vector;

// Re-export commonly used types
pub use adapters::{AdapterRegistry, ConnectionHandle, DriverAdapter};
pub use error::{DbProbeError, Result};
pub use logging::init_logging;
pub use models::{BackendKind, DataSourceDescriptor, FailureKind, ValidationOutcome};
pub use resolver::{ConnectionResolver, ResolvedConnection, UrlResolver};
pub use validator::{ConnectivityValidator, ValidateOptions};
pub use vector::GrowableVec;
