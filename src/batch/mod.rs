//! Batch orchestration.
//!
//! A batch runs a set of attack patterns against one target:
//! 1. Validate the request (target, pattern set, concurrency) before any I/O
//! 2. Dispatch probes in pattern order, at most `concurrency` at a time
//! 3. Record each result in the shared [`BatchRun`] as it arrives and emit it
//!    as a [`BatchEvent`]
//! 4. Finish as `Completed` once every pattern has a result, or as
//!    `Cancelled` when the caller cancels
//!
//! A single driver task is the only writer of the run. Probes run in their
//! own tasks and report back over a channel; a probe's transport error is just
//! another result and never stops the batch.

mod run;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::aggregate::Summary;
use crate::app::{log_progress, log_summary};
use crate::catalog::AttackPattern;
use crate::config::LOGGING_INTERVAL;
use crate::error_handling::{ConfigurationError, TransportErrorKind};
use crate::initialization::init_semaphore;
use crate::probe::{ProbeError, ProbeExecutor, WafTestResult};
use crate::target::TestTarget;
use crate::utils::duration_to_ms;

pub use run::{BatchRun, BatchState};

/// Something observable that happened in a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchEvent {
    /// A probe finished and its result was recorded.
    Result {
        /// Attack pattern id
        attack_id: String,
        /// The recorded result
        result: WafTestResult,
    },
    /// The batch reached a terminal state. Always the last event.
    Finished {
        /// `Completed` or `Cancelled`
        state: BatchState,
        /// Summary over every recorded result
        summary: Summary,
    },
}

/// Caller's view of a running batch.
///
/// Dropping the handle does not stop the batch; call [`BatchHandle::cancel`].
pub struct BatchHandle {
    run: Arc<RwLock<BatchRun>>,
    cancel: CancellationToken,
    events: mpsc::UnboundedReceiver<BatchEvent>,
    driver: JoinHandle<()>,
}

impl BatchHandle {
    /// Waits for the next event. `None` once `Finished` has been delivered.
    pub async fn next_event(&mut self) -> Option<BatchEvent> {
        self.events.recv().await
    }

    /// Copy of the run as it is now.
    pub fn snapshot(&self) -> BatchRun {
        self.run.read().clone()
    }

    /// Summary of the results recorded so far.
    pub fn summary(&self) -> Summary {
        self.run.read().summary()
    }

    /// Current state.
    pub fn state(&self) -> BatchState {
        self.run.read().state()
    }

    /// Cancels the batch.
    ///
    /// Takes effect immediately: no result is recorded after this returns and
    /// no new probe starts. In-flight probes are aborted in the background.
    /// A no-op on a finished batch.
    pub fn cancel(&self) {
        if self.run.write().cancel() {
            log::info!("Batch cancelled by caller");
        }
        self.cancel.cancel();
    }

    /// Waits for the batch to finish and returns the final run.
    pub async fn wait(self) -> BatchRun {
        let BatchHandle { run, driver, .. } = self;
        if let Err(e) = driver.await {
            log::error!("Batch driver task failed: {}", e);
        }
        let run = run.read().clone();
        run
    }
}

/// Starts batch runs on a shared probe executor.
#[derive(Clone)]
pub struct BatchOrchestrator {
    executor: Arc<ProbeExecutor>,
}

impl BatchOrchestrator {
    /// Creates an orchestrator.
    pub fn new(executor: Arc<ProbeExecutor>) -> Self {
        Self { executor }
    }

    /// Starts running `patterns` against `target`.
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// A `ConfigurationError` if the target is not runnable, `patterns` is
    /// empty or has a repeated id, or `concurrency` is zero. Nothing is sent
    /// in that case.
    pub fn start(
        &self,
        patterns: Vec<AttackPattern>,
        target: &TestTarget,
        concurrency: usize,
    ) -> Result<BatchHandle, ConfigurationError> {
        let target = target.validate()?;
        if patterns.is_empty() {
            return Err(ConfigurationError::EmptyPatternSet);
        }
        if concurrency == 0 {
            return Err(ConfigurationError::ZeroConcurrency);
        }
        check_unique_ids(patterns.iter().map(|p| p.id.as_str()))?;

        let mut run = BatchRun::new(&patterns);
        run.start();
        let run = Arc::new(RwLock::new(run));
        let cancel = CancellationToken::new();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        log::info!(
            "Starting batch of {} probes against {} (Host: {}) with concurrency {}",
            patterns.len(),
            target.base_url,
            target.host_header,
            concurrency
        );

        let driver = tokio::spawn(drive(
            Arc::clone(&self.executor),
            patterns,
            target,
            concurrency,
            Arc::clone(&run),
            cancel.clone(),
            events_tx,
        ));

        Ok(BatchHandle {
            run,
            cancel,
            events: events_rx,
            driver,
        })
    }
}

/// Fails with `DuplicatePatternId` on the first repeated id.
pub(crate) fn check_unique_ids<'a>(
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<(), ConfigurationError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ConfigurationError::DuplicatePatternId(id.to_string()));
        }
    }
    Ok(())
}

async fn drive(
    executor: Arc<ProbeExecutor>,
    patterns: Vec<AttackPattern>,
    target: TestTarget,
    concurrency: usize,
    run: Arc<RwLock<BatchRun>>,
    cancel: CancellationToken,
    events: mpsc::UnboundedSender<BatchEvent>,
) {
    let start_time = Instant::now();
    let total = patterns.len();
    let target = Arc::new(target);
    let semaphore = init_semaphore(concurrency);
    let (result_tx, mut result_rx) = mpsc::unbounded_channel::<WafTestResult>();
    let mut queue = patterns.into_iter().peekable();
    let mut recorded = 0usize;

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            Some(result) = result_rx.recv() => {
                let attack_id = result.attack_id.clone();
                let (accepted, state) = {
                    let mut run = run.write();
                    let accepted = run.record(result.clone());
                    (accepted, run.state())
                };
                if accepted {
                    recorded += 1;
                    // Receiver gone means nobody is listening, not a failure
                    let _ = events.send(BatchEvent::Result { attack_id, result });
                    if recorded % LOGGING_INTERVAL == 0 && recorded < total {
                        log_progress(start_time, recorded, total);
                    }
                }
                if state.is_terminal() {
                    break;
                }
            }

            permit = Arc::clone(&semaphore).acquire_owned(), if queue.peek().is_some() => {
                let permit = match permit {
                    Ok(permit) => permit,
                    Err(e) => {
                        log::error!("Concurrency semaphore closed: {}", e);
                        run.write().cancel();
                        break;
                    }
                };
                let Some(pattern) = queue.next() else {
                    continue;
                };
                let executor = Arc::clone(&executor);
                let target = Arc::clone(&target);
                let cancel = cancel.clone();
                let result_tx = result_tx.clone();
                tokio::spawn(async move {
                    let _permit = permit;
                    if let Some(result) = run_probe(executor, pattern, target, cancel).await {
                        let _ = result_tx.send(result);
                    }
                });
            }
        }
    }

    // Wake any probe supervisors still waiting so they abort their probes
    cancel.cancel();
    drop(result_rx);

    let (state, summary) = {
        let mut run = run.write();
        run.cancel();
        (run.state(), run.summary())
    };
    log_summary(state, &summary, start_time.elapsed().as_secs_f64());
    let _ = events.send(BatchEvent::Finished { state, summary });
}

/// Runs one probe in its own task so a panic becomes an error result.
///
/// Returns `None` when the batch was cancelled first.
async fn run_probe(
    executor: Arc<ProbeExecutor>,
    pattern: AttackPattern,
    target: Arc<TestTarget>,
    cancel: CancellationToken,
) -> Option<WafTestResult> {
    if cancel.is_cancelled() {
        return None;
    }
    let attack_id = pattern.id.clone();
    let start = Instant::now();
    let mut probe = tokio::spawn(async move { executor.execute(&pattern, &target).await });

    tokio::select! {
        biased;

        _ = cancel.cancelled() => {
            probe.abort();
            log::debug!("Abandoned in-flight probe {}", attack_id);
            None
        }

        joined = &mut probe => match joined {
            Ok(result) => Some(result),
            Err(e) if e.is_panic() => {
                log::error!("Probe task for {} panicked", attack_id);
                Some(WafTestResult::failed(
                    &attack_id,
                    ProbeError::new(TransportErrorKind::Other, "probe task panicked"),
                    duration_to_ms(start.elapsed()),
                ))
            }
            Err(_) => None,
        },
    }
}
