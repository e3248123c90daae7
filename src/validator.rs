//! Connectivity validation orchestration.
//!
//! One [`ConnectivityValidator::validate`] call is one fresh, short-lived
//! probe: resolve the descriptor, pick the adapter for its kind, open a
//! connection, run the liveness query, close. Each step is terminal on
//! failure and the connection is released on every exit path, including
//! timeout and cancellation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::Result;
use crate::adapters::AdapterRegistry;
use crate::error::{DbProbeError, ProbeStage};
use crate::models::{DataSourceDescriptor, ValidationOutcome};
use crate::resolver::{ConnectionResolver, UrlResolver};

/// Caller-supplied bounds for one validation attempt.
///
/// The timeout is converted into one absolute deadline at the start of the
/// attempt and covers all of its blocking stages (open, probe, close);
/// resolution is non-blocking and is not bounded. The cancellation token
/// unblocks an in-flight stage promptly when triggered.
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    /// Overall deadline for the blocking stages of the attempt
    pub timeout: Duration,
    /// Cooperative cancellation signal for the whole attempt
    pub cancel: CancellationToken,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            cancel: CancellationToken::new(),
        }
    }
}

impl ValidateOptions {
    /// Options with the given per-stage timeout and no cancellation token.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// Validates connectivity of configured data sources.
///
/// Safe to share across tasks and call concurrently: each call creates its
/// own connection handle and touches no shared mutable state. No pooling,
/// no reuse, no internal retries. A single failed attempt is reported
/// immediately and retry policy stays with the caller.
///
/// # Example
/// ```rust,no_run
/// use dbprobe::models::{BackendKind, DataSourceDescriptor};
/// use dbprobe::validator::{ConnectivityValidator, ValidateOptions};
///
/// # async fn run() {
/// let validator = ConnectivityValidator::with_defaults();
/// let descriptor = DataSourceDescriptor::new("scratch", BackendKind::Sqlite)
///     .with_database(":memory:");
///
/// let outcome = validator
///     .validate(&descriptor, &ValidateOptions::default())
///     .await;
/// assert!(outcome.is_success());
/// # }
/// ```
pub struct ConnectivityValidator {
    resolver: Arc<dyn ConnectionResolver>,
    registry: AdapterRegistry,
}

impl ConnectivityValidator {
    /// Creates a validator from a resolver and an adapter registry.
    pub fn new(resolver: Arc<dyn ConnectionResolver>, registry: AdapterRegistry) -> Self {
        Self { resolver, registry }
    }

    /// Creates a validator with the stock [`UrlResolver`] and the
    /// compiled-in default adapters.
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(UrlResolver), AdapterRegistry::with_defaults())
    }

    /// The adapter registry backing this validator.
    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Validates connectivity of one data source.
    ///
    /// Performs exactly one resolve → open → probe → close sequence and
    /// maps the result to a [`ValidationOutcome`]. Never returns `Err` and
    /// never panics on backend failures; every failure mode is classified
    /// into the outcome.
    pub async fn validate(
        &self,
        descriptor: &DataSourceDescriptor,
        options: &ValidateOptions,
    ) -> ValidationOutcome {
        match self.try_validate(descriptor, options).await {
            Ok(()) => {
                debug!(source = %descriptor, "connectivity validated");
                ValidationOutcome::Success
            }
            Err(error) => {
                debug!(source = %descriptor, error = %error, "connectivity validation failed");
                ValidationOutcome::from_error(&error)
            }
        }
    }

    async fn try_validate(
        &self,
        descriptor: &DataSourceDescriptor,
        options: &ValidateOptions,
    ) -> Result<()> {
        // One absolute deadline covers every blocking stage, matching the
        // caller's view of "this attempt takes at most `timeout`".
        let deadline = tokio::time::Instant::now() + options.timeout;

        // Step 1: resolution is pure data work; failure means the
        // descriptor itself is unusable and no I/O is attempted.
        let resolved = self.resolver.resolve(descriptor)?;

        // Step 2: adapter lookup by declared kind.
        let adapter = self
            .registry
            .get(descriptor.kind)
            .ok_or_else(|| DbProbeError::unsupported_backend(descriptor.kind))?;

        debug!(source = %descriptor, url = %resolved.display, "opening connection");
        let mut handle = bounded(
            ProbeStage::Open,
            options,
            deadline,
            adapter.open(&resolved.connection_string),
        )
        .await?;

        // Step 3: liveness round trip. The handle is released below
        // whether or not this succeeds, so a hung or failing probe cannot
        // leak a backend-side connection slot.
        let probe_result = bounded(ProbeStage::Probe, options, deadline, handle.probe()).await;

        // Graceful close is attempted even after cancellation, but only up
        // to the same deadline; a peer that hangs on close must not stall
        // the caller either. Abandoning the close drops the handle, which
        // releases the connection on the client side.
        match tokio::time::timeout_at(deadline, handle.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(close_error)) => {
                // The probe outcome is the sole success criterion; a close
                // failure after a completed probe only gets logged.
                debug!(source = %descriptor, error = %close_error, "connection close failed");
            }
            Err(_) => {
                debug!(source = %descriptor, "connection close abandoned at deadline");
            }
        }

        probe_result
    }
}

impl std::fmt::Debug for ConnectivityValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectivityValidator")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Races a blocking stage against the attempt's absolute deadline and the
/// caller's cancellation token.
///
/// Dropping the in-flight future is the cancellation mechanism: when the
/// token fires or the deadline elapses, the stage future is dropped and the
/// corresponding timeout/cancelled error is returned promptly. The deadline
/// is shared by all stages of one attempt, so a slow open shrinks the time
/// left for the probe.
async fn bounded<T>(
    stage: ProbeStage,
    options: &ValidateOptions,
    deadline: tokio::time::Instant,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = options.cancel.cancelled() => Err(DbProbeError::Cancelled { stage }),
        result = tokio::time::timeout_at(deadline, fut) => match result {
            Ok(inner) => inner,
            Err(_) => Err(DbProbeError::Timeout {
                stage,
                limit: options.timeout,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ConnectionHandle, DriverAdapter};
    use crate::models::{BackendKind, FailureKind};
    use crate::resolver::ResolvedConnection;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingResolver;

    impl ConnectionResolver for FailingResolver {
        fn resolve(&self, _descriptor: &DataSourceDescriptor) -> Result<ResolvedConnection> {
            Err(DbProbeError::configuration("descriptor is incomplete"))
        }
    }

    #[derive(Clone, Copy)]
    enum MockBehavior {
        OpenFails,
        OpenHangs,
        SlowOpenThenProbeHangs,
        ProbeSucceeds,
        ProbeFails,
        ProbeHangs,
        ProbeAndCloseHang,
    }

    struct MockAdapter {
        kind: BackendKind,
        behavior: MockBehavior,
        opens: Arc<AtomicUsize>,
        closes: Arc<AtomicUsize>,
    }

    impl MockAdapter {
        fn new(kind: BackendKind, behavior: MockBehavior) -> Self {
            Self {
                kind,
                behavior,
                opens: Arc::new(AtomicUsize::new(0)),
                closes: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    struct MockHandle {
        behavior: MockBehavior,
        closes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DriverAdapter for MockAdapter {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        async fn open(&self, _connection_string: &str) -> Result<Box<dyn ConnectionHandle>> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                MockBehavior::OpenFails => Err(DbProbeError::connection_failed(
                    "host unreachable",
                    std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
                )),
                MockBehavior::OpenHangs => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    unreachable!("open should have been cancelled or timed out")
                }
                MockBehavior::SlowOpenThenProbeHangs => {
                    tokio::time::sleep(Duration::from_millis(1900)).await;
                    Ok(Box::new(MockHandle {
                        behavior: MockBehavior::ProbeHangs,
                        closes: Arc::clone(&self.closes),
                    }))
                }
                _ => Ok(Box::new(MockHandle {
                    behavior: self.behavior,
                    closes: Arc::clone(&self.closes),
                })),
            }
        }
    }

    #[async_trait]
    impl ConnectionHandle for MockHandle {
        async fn probe(&mut self) -> Result<()> {
            match self.behavior {
                MockBehavior::ProbeSucceeds => Ok(()),
                MockBehavior::ProbeFails => Err(DbProbeError::probe_failed(
                    "backend rejects all queries",
                    std::io::Error::other("quota exhausted"),
                )),
                MockBehavior::ProbeHangs | MockBehavior::ProbeAndCloseHang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(())
                }
                _ => unreachable!("open-stage behaviors never produce a handle"),
            }
        }

        async fn close(self: Box<Self>) -> Result<()> {
            if matches!(self.behavior, MockBehavior::ProbeAndCloseHang) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn validator_with(adapter: MockAdapter) -> (ConnectivityValidator, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let opens = Arc::clone(&adapter.opens);
        let closes = Arc::clone(&adapter.closes);
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(adapter));
        (
            ConnectivityValidator::new(Arc::new(UrlResolver), registry),
            opens,
            closes,
        )
    }

    fn odbc_descriptor() -> DataSourceDescriptor {
        DataSourceDescriptor::new("warehouse", BackendKind::Odbc)
            .with_extra("dsn", "odbc://warehouse-host")
    }

    #[tokio::test]
    async fn test_unregistered_kind_reports_unsupported_backend() {
        let adapter = MockAdapter::new(BackendKind::Postgres, MockBehavior::ProbeSucceeds);
        let (validator, opens, _) = validator_with(adapter);

        // Descriptor kind has no registration; the postgres adapter must
        // not be touched.
        let outcome = validator
            .validate(&odbc_descriptor(), &ValidateOptions::default())
            .await;

        assert_eq!(outcome.failure_kind(), Some(FailureKind::UnsupportedBackend));
        assert_eq!(opens.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolver_error_reports_configuration_without_open() {
        let adapter = MockAdapter::new(BackendKind::Odbc, MockBehavior::ProbeSucceeds);
        let opens = Arc::clone(&adapter.opens);
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(adapter));
        let validator = ConnectivityValidator::new(Arc::new(FailingResolver), registry);

        let outcome = validator
            .validate(&odbc_descriptor(), &ValidateOptions::default())
            .await;

        assert_eq!(outcome.failure_kind(), Some(FailureKind::Configuration));
        assert_eq!(opens.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_closes_exactly_once() {
        let adapter = MockAdapter::new(BackendKind::Odbc, MockBehavior::ProbeSucceeds);
        let (validator, opens, closes) = validator_with(adapter);

        let outcome = validator
            .validate(&odbc_descriptor(), &ValidateOptions::default())
            .await;

        assert!(outcome.is_success());
        assert_eq!(opens.load(Ordering::SeqCst), 1);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_probe_failure_still_closes_exactly_once() {
        let adapter = MockAdapter::new(BackendKind::Odbc, MockBehavior::ProbeFails);
        let (validator, _, closes) = validator_with(adapter);

        let outcome = validator
            .validate(&odbc_descriptor(), &ValidateOptions::default())
            .await;

        assert_eq!(outcome.failure_kind(), Some(FailureKind::ProbeFailed));
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        match outcome {
            ValidationOutcome::Failure { detail, .. } => {
                assert!(detail.contains("backend rejects all queries"));
            }
            ValidationOutcome::Success => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_open_failure_reports_connection_failed() {
        let adapter = MockAdapter::new(BackendKind::Odbc, MockBehavior::OpenFails);
        let (validator, _, closes) = validator_with(adapter);

        let outcome = validator
            .validate(&odbc_descriptor(), &ValidateOptions::default())
            .await;

        assert_eq!(outcome.failure_kind(), Some(FailureKind::ConnectionFailed));
        // Open never produced a handle, so there is nothing to close.
        assert_eq!(closes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_host_times_out_within_bound() {
        let adapter = MockAdapter::new(BackendKind::Odbc, MockBehavior::OpenHangs);
        let (validator, _, closes) = validator_with(adapter);

        let options = ValidateOptions::with_timeout(Duration::from_secs(2));
        let started = tokio::time::Instant::now();
        let outcome = validator.validate(&odbc_descriptor(), &options).await;

        assert_eq!(outcome.failure_kind(), Some(FailureKind::ConnectionFailed));
        assert_eq!(started.elapsed(), Duration::from_secs(2));
        assert_eq!(closes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_timeout_reports_probe_failed_and_closes() {
        let adapter = MockAdapter::new(BackendKind::Odbc, MockBehavior::ProbeHangs);
        let (validator, _, closes) = validator_with(adapter);

        let options = ValidateOptions::with_timeout(Duration::from_secs(2));
        let outcome = validator.validate(&odbc_descriptor(), &options).await;

        assert_eq!(outcome.failure_kind(), Some(FailureKind::ProbeFailed));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_mid_probe_returns_promptly_and_closes() {
        let adapter = MockAdapter::new(BackendKind::Odbc, MockBehavior::ProbeHangs);
        let (validator, _, closes) = validator_with(adapter);

        let descriptor = odbc_descriptor();
        let options = ValidateOptions::with_timeout(Duration::from_secs(3600));
        let cancel = options.cancel.clone();
        let started = tokio::time::Instant::now();

        let (outcome, ()) = tokio::join!(validator.validate(&descriptor, &options), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            cancel.cancel();
        });

        assert_eq!(outcome.failure_kind(), Some(FailureKind::ProbeFailed));
        // Unblocked by the token, not the hour-long sleep or the timeout.
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_close_does_not_stall_past_deadline() {
        let adapter = MockAdapter::new(BackendKind::Odbc, MockBehavior::ProbeAndCloseHang);
        let (validator, _, closes) = validator_with(adapter);

        let options = ValidateOptions::with_timeout(Duration::from_secs(2));
        let started = tokio::time::Instant::now();
        let outcome = validator.validate(&odbc_descriptor(), &options).await;

        assert_eq!(outcome.failure_kind(), Some(FailureKind::ProbeFailed));
        // The deadline had already elapsed when close started, so the
        // graceful close is abandoned rather than waited on.
        assert_eq!(started.elapsed(), Duration::from_secs(2));
        assert_eq!(closes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_spans_open_and_probe_stages() {
        let adapter = MockAdapter::new(BackendKind::Odbc, MockBehavior::SlowOpenThenProbeHangs);
        let (validator, _, _) = validator_with(adapter);

        // Open consumes 1.9s of the 2s budget; the hung probe gets only
        // the remaining 100ms, not a fresh 2s of its own.
        let options = ValidateOptions::with_timeout(Duration::from_secs(2));
        let started = tokio::time::Instant::now();
        let outcome = validator.validate(&odbc_descriptor(), &options).await;

        assert_eq!(outcome.failure_kind(), Some(FailureKind::ProbeFailed));
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_concurrent_validations_are_independent() {
        let ok = MockAdapter::new(BackendKind::Odbc, MockBehavior::ProbeSucceeds);
        let bad = MockAdapter::new(BackendKind::SqlServer, MockBehavior::OpenFails);
        let ok_closes = Arc::clone(&ok.closes);

        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(ok));
        registry.register(Arc::new(bad));
        let validator =
            Arc::new(ConnectivityValidator::new(Arc::new(UrlResolver), registry));

        let good = odbc_descriptor();
        let broken = DataSourceDescriptor::new("legacy", BackendKind::SqlServer)
            .with_host("legacy.internal");
        let options = ValidateOptions::default();

        let (a, b) = tokio::join!(
            validator.validate(&good, &options),
            validator.validate(&broken, &options),
        );

        assert!(a.is_success());
        assert_eq!(b.failure_kind(), Some(FailureKind::ConnectionFailed));
        assert_eq!(ok_closes.load(Ordering::SeqCst), 1);
    }
}
