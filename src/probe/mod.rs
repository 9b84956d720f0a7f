//! Single-probe execution.
//!
//! A probe sends one crafted request for one attack pattern to one target and
//! classifies the outcome:
//! 1. Build the request from the pattern template (`Host` = target header)
//! 2. Send it through the [`Transport`] with a bounded timeout
//! 3. Classify a received response with the [`BlockClassifier`]
//! 4. Turn a missing response into an error result, never into "passed"
//!
//! Every call is independent; the executor holds no per-probe state.

mod classify;
mod request;
mod result;
mod transport;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_retry::RetryIf;

use crate::catalog::AttackPattern;
use crate::config::Config;
use crate::error_handling::{get_retry_strategy, InitializationError, TransportErrorKind};
use crate::target::TestTarget;
use crate::utils::duration_to_ms;

pub use classify::BlockClassifier;
pub use request::ProbeRequest;
pub use result::{ProbeError, ProbeOutcome, WafTestResult};
pub use transport::{ReqwestTransport, Transport, TransportResponse};

/// Executes probes through a transport.
pub struct ProbeExecutor {
    transport: Arc<dyn Transport>,
    classifier: BlockClassifier,
    timeout: Duration,
    max_attempts: usize,
}

impl ProbeExecutor {
    /// Creates an executor over `transport`, classifying with `config.block_policy`.
    ///
    /// # Errors
    ///
    /// `InitializationError::BlockPatternError` if a block-signal pattern does
    /// not compile.
    pub fn new(transport: Arc<dyn Transport>, config: &Config) -> Result<Self, InitializationError> {
        Ok(Self {
            transport,
            classifier: BlockClassifier::from_policy(&config.block_policy)?,
            timeout: config.probe_timeout(),
            max_attempts: config.max_attempts.max(1),
        })
    }

    /// Creates an executor sending through a `reqwest` client built from `config`.
    ///
    /// # Errors
    ///
    /// `InitializationError` if the client or the block policy cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, InitializationError> {
        let transport = ReqwestTransport::from_config(config)?;
        Self::new(Arc::new(transport), config)
    }

    /// Default per-probe timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs one probe with the default timeout.
    pub async fn execute(&self, pattern: &AttackPattern, target: &TestTarget) -> WafTestResult {
        self.execute_with_timeout(pattern, target, self.timeout).await
    }

    /// Runs one probe.
    ///
    /// Transport failures are retried up to the configured attempt count; the
    /// last attempt's result is returned. Received responses and invalid
    /// templates are never retried.
    pub async fn execute_with_timeout(
        &self,
        pattern: &AttackPattern,
        target: &TestTarget,
        timeout: Duration,
    ) -> WafTestResult {
        let request = match ProbeRequest::build(&pattern.template, target) {
            Ok(request) => request,
            Err(error) => {
                log::warn!("Pattern {} cannot be sent: {}", pattern.id, error);
                return WafTestResult::failed(&pattern.id, error, 0);
            }
        };

        let outcome = RetryIf::spawn(
            get_retry_strategy(self.max_attempts),
            || {
                let request = request.clone();
                async move {
                    let result = self.attempt(&pattern.id, request, timeout).await;
                    if result.is_error() {
                        Err(result)
                    } else {
                        Ok(result)
                    }
                }
            },
            |result: &WafTestResult| {
                let retriable = result
                    .error
                    .as_ref()
                    .is_some_and(|e| e.kind.is_retriable());
                if retriable {
                    log::debug!("Retrying pattern {} after transport error", result.attack_id);
                }
                retriable
            },
        )
        .await;

        let result = match outcome {
            Ok(result) | Err(result) => result,
        };
        match &result.error {
            Some(error) => log::warn!("Pattern {} failed: {}", pattern.id, error),
            None => log::debug!(
                "Pattern {} -> {} ({}) in {}ms",
                pattern.id,
                result.status_code,
                if result.blocked { "blocked" } else { "passed" },
                result.response_time_ms
            ),
        }
        result
    }

    async fn attempt(&self, attack_id: &str, request: ProbeRequest, timeout: Duration) -> WafTestResult {
        let start = Instant::now();
        // The outer timer covers transports that ignore the timeout they are given
        let sent = tokio::time::timeout(timeout, self.transport.send(request, timeout)).await;
        let elapsed = duration_to_ms(start.elapsed());

        match sent {
            Ok(Ok(response)) => WafTestResult::answered(
                attack_id,
                response.status,
                self.classifier.is_blocked(&response),
                elapsed,
            ),
            Ok(Err(error)) => WafTestResult::failed(attack_id, error, elapsed),
            Err(_) => WafTestResult::failed(
                attack_id,
                ProbeError::new(
                    TransportErrorKind::Timeout,
                    format!("no response within {}ms", duration_to_ms(timeout)),
                ),
                elapsed,
            ),
        }
    }
}
