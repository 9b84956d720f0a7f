//! The `WafTester` facade.

use std::sync::Arc;

use crate::batch::{check_unique_ids, BatchHandle, BatchOrchestrator};
use crate::catalog::{PatternCatalog, PatternSource, SessionCatalog};
use crate::config::Config;
use crate::error_handling::{CatalogError, ConfigurationError, EngineError, InitializationError};
use crate::probe::{ProbeExecutor, ReqwestTransport, Transport, WafTestResult};
use crate::target::{TargetSelection, TestTarget};

/// Session-scoped entry point to the engine.
///
/// Owns the session's pattern catalog (loaded on first use and cached), the
/// probe executor, and the batch orchestrator. Cheap operations take `&self`,
/// so a tester can be shared behind an `Arc`.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use waf_tester::{BatchEvent, BuiltinSource, Config, TestTarget, WafTester};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tester = WafTester::new(Config::default(), Arc::new(BuiltinSource))?;
/// let target = TestTarget::new("http://127.0.0.1:8080", "shop.example.com");
///
/// let mut batch = tester.run_batch(&target, 5).await?;
/// while let Some(event) = batch.next_event().await {
///     if let BatchEvent::Finished { summary, .. } = event {
///         println!("{} of {} attacks blocked", summary.blocked, summary.total);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct WafTester {
    config: Config,
    catalog: SessionCatalog,
    executor: Arc<ProbeExecutor>,
    orchestrator: BatchOrchestrator,
}

impl WafTester {
    /// Creates a tester sending probes with a `reqwest` client built from `config`.
    ///
    /// # Errors
    ///
    /// `InitializationError` if the HTTP client or the block policy cannot be built.
    pub fn new(config: Config, source: Arc<dyn PatternSource>) -> Result<Self, InitializationError> {
        let transport = ReqwestTransport::from_config(&config)?;
        Self::with_transport(config, source, Arc::new(transport))
    }

    /// Creates a tester over a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// `InitializationError::BlockPatternError` if the block policy does not compile.
    pub fn with_transport(
        config: Config,
        source: Arc<dyn PatternSource>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, InitializationError> {
        let executor = Arc::new(ProbeExecutor::new(transport, &config)?);
        Ok(Self {
            orchestrator: BatchOrchestrator::new(Arc::clone(&executor)),
            catalog: SessionCatalog::new(source),
            executor,
            config,
        })
    }

    /// The configuration the tester was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A target selection starting from the configured base URL.
    pub fn new_selection(&self) -> TargetSelection {
        TargetSelection::new(&self.config.base_url)
    }

    /// The session's pattern catalog, loading it on first use.
    ///
    /// # Errors
    ///
    /// `CatalogError::Unavailable` if the source cannot be loaded. The next
    /// call tries again.
    pub async fn list_patterns(&self) -> Result<Arc<PatternCatalog>, CatalogError> {
        self.catalog.get_or_load().await
    }

    /// Runs one pattern against `target` with the configured timeout.
    ///
    /// # Errors
    ///
    /// `EngineError::Configuration` if the target is not runnable,
    /// `EngineError::Catalog` if the catalog is unavailable or has no such id.
    /// Transport failures are not errors; they are in the returned result.
    pub async fn run_one(
        &self,
        pattern_id: &str,
        target: &TestTarget,
    ) -> Result<WafTestResult, EngineError> {
        let target = target.validate()?;
        let catalog = self.list_patterns().await?;
        let pattern = catalog.get(pattern_id)?;
        Ok(self.executor.execute(pattern, &target).await)
    }

    /// Runs the whole catalog against `target`.
    ///
    /// The target is checked before the catalog is loaded, so a bad target
    /// never causes source I/O.
    ///
    /// # Errors
    ///
    /// `EngineError::Configuration` for a non-runnable target, an empty
    /// catalog or zero concurrency; `EngineError::Catalog` if the catalog is
    /// unavailable.
    pub async fn run_batch(
        &self,
        target: &TestTarget,
        concurrency: usize,
    ) -> Result<BatchHandle, EngineError> {
        let target = check_run_request(target, concurrency)?;
        let catalog = self.list_patterns().await?;
        Ok(self
            .orchestrator
            .start(catalog.list().to_vec(), &target, concurrency)?)
    }

    /// Runs the whole catalog against `target` with the configured
    /// `default_concurrency`.
    ///
    /// # Errors
    ///
    /// As [`WafTester::run_batch`].
    pub async fn run_batch_default(&self, target: &TestTarget) -> Result<BatchHandle, EngineError> {
        self.run_batch(target, self.config.default_concurrency).await
    }

    /// Runs the listed patterns against `target`, in catalog order.
    ///
    /// # Errors
    ///
    /// As [`WafTester::run_batch`], plus `EngineError::Configuration` for an
    /// empty or repeating id list and `EngineError::Catalog` for an unknown id.
    pub async fn run_batch_subset(
        &self,
        ids: &[String],
        target: &TestTarget,
        concurrency: usize,
    ) -> Result<BatchHandle, EngineError> {
        let target = check_run_request(target, concurrency)?;
        if ids.is_empty() {
            return Err(ConfigurationError::EmptyPatternSet.into());
        }
        check_unique_ids(ids.iter().map(String::as_str))?;
        let catalog = self.list_patterns().await?;
        let patterns = catalog.select(ids)?;
        Ok(self.orchestrator.start(patterns, &target, concurrency)?)
    }

    /// Cancels a batch started by this tester. Never blocks on the network.
    pub fn cancel_batch(&self, handle: &BatchHandle) {
        handle.cancel();
    }
}

fn check_run_request(
    target: &TestTarget,
    concurrency: usize,
) -> Result<TestTarget, ConfigurationError> {
    let target = target.validate()?;
    if concurrency == 0 {
        return Err(ConfigurationError::ZeroConcurrency);
    }
    Ok(target)
}
