//! Batch run state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::{summarize, Summary};
use crate::catalog::{AttackCategory, AttackPattern};
use crate::probe::WafTestResult;

/// Lifecycle of a batch run.
///
/// `Idle -> Running -> {Completed | Cancelled}`. There are no transitions out
/// of the two terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    /// Created, nothing dispatched yet
    Idle,
    /// Probes are being dispatched or awaited
    Running,
    /// Every requested pattern has a result
    Completed,
    /// Stopped by the caller before completion
    Cancelled,
}

impl BatchState {
    /// Returns the state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchState::Idle => "idle",
            BatchState::Running => "running",
            BatchState::Completed => "completed",
            BatchState::Cancelled => "cancelled",
        }
    }

    /// Whether the state is `Completed` or `Cancelled`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchState::Completed | BatchState::Cancelled)
    }
}

impl std::fmt::Display for BatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested patterns, results received so far, and run state.
///
/// Only the orchestrator's collector mutates a run; callers see clones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRun {
    requested: Vec<String>,
    categories: HashMap<String, AttackCategory>,
    results: HashMap<String, WafTestResult>,
    state: BatchState,
}

impl BatchRun {
    /// Creates an idle run over `patterns`.
    pub fn new(patterns: &[AttackPattern]) -> Self {
        Self {
            requested: patterns.iter().map(|p| p.id.clone()).collect(),
            categories: patterns
                .iter()
                .map(|p| (p.id.clone(), p.category))
                .collect(),
            results: HashMap::with_capacity(patterns.len()),
            state: BatchState::Idle,
        }
    }

    /// Requested pattern ids, in dispatch order.
    pub fn requested(&self) -> &[String] {
        &self.requested
    }

    /// Current state.
    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Result for `attack_id`, if it has completed.
    pub fn result(&self, attack_id: &str) -> Option<&WafTestResult> {
        self.results.get(attack_id)
    }

    /// All results received so far, keyed by attack id.
    pub fn results(&self) -> &HashMap<String, WafTestResult> {
        &self.results
    }

    /// Results received so far, in requested order.
    pub fn ordered_results(&self) -> Vec<&WafTestResult> {
        self.requested
            .iter()
            .filter_map(|id| self.results.get(id))
            .collect()
    }

    /// Requested ids without a result yet.
    pub fn pending(&self) -> Vec<&str> {
        self.requested
            .iter()
            .filter(|id| !self.results.contains_key(id.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Number of results received.
    pub fn completed(&self) -> usize {
        self.results.len()
    }

    /// Number of requested patterns.
    pub fn total(&self) -> usize {
        self.requested.len()
    }

    /// Category of a requested pattern.
    pub fn category_of(&self, attack_id: &str) -> Option<AttackCategory> {
        self.categories.get(attack_id).copied()
    }

    /// Summary of the results received so far.
    pub fn summary(&self) -> Summary {
        summarize(self.results.values(), |id| self.category_of(id))
    }

    pub(crate) fn start(&mut self) {
        if self.state == BatchState::Idle {
            self.state = BatchState::Running;
        }
    }

    /// Records a result while running. Completes the run when it was the last one.
    ///
    /// Returns `false` (and records nothing) if the run is not running, the id
    /// was not requested, or it already has a result.
    pub(crate) fn record(&mut self, result: WafTestResult) -> bool {
        if self.state != BatchState::Running {
            return false;
        }
        if !self.categories.contains_key(&result.attack_id) {
            log::warn!("Dropping result for unrequested attack id {}", result.attack_id);
            return false;
        }
        if self.results.contains_key(&result.attack_id) {
            log::warn!("Dropping second result for attack id {}", result.attack_id);
            return false;
        }
        self.results.insert(result.attack_id.clone(), result);
        if self.results.len() == self.requested.len() {
            self.state = BatchState::Completed;
        }
        true
    }

    /// Moves a running run to `Cancelled`. Returns whether it did.
    pub(crate) fn cancel(&mut self) -> bool {
        if self.state == BatchState::Running {
            self.state = BatchState::Cancelled;
            true
        } else {
            false
        }
    }
}
