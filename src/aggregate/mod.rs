//! Result aggregation.
//!
//! [`summarize`] is a pure fold over probe results. It can run at any point
//! of a batch and gives the same answer regardless of arrival order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::AttackCategory;
use crate::error_handling::TransportErrorKind;
use crate::probe::{ProbeOutcome, WafTestResult};

/// Blocked/passed/errored counts for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    /// Probes classified as blocked
    pub blocked: usize,
    /// Probes answered and not blocked
    pub passed: usize,
    /// Probes with no response
    pub errored: usize,
}

impl CategoryCounts {
    /// Sum of all three counts.
    pub fn total(&self) -> usize {
        self.blocked + self.passed + self.errored
    }

    fn record(&mut self, outcome: ProbeOutcome) {
        match outcome {
            ProbeOutcome::Blocked => self.blocked += 1,
            ProbeOutcome::Passed => self.passed += 1,
            ProbeOutcome::Errored => self.errored += 1,
        }
    }
}

/// Aggregate statistics over a set of probe results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of results
    pub total: usize,
    /// Results classified as blocked
    pub blocked: usize,
    /// Results answered and not blocked
    pub passed: usize,
    /// Results with a transport error
    pub errored: usize,
    /// Per-category breakdown, for results whose category is known
    pub by_category: BTreeMap<AttackCategory, CategoryCounts>,
    /// Errored results per transport error kind
    pub errors_by_kind: BTreeMap<TransportErrorKind, usize>,
    /// Mean response time of answered probes, 0 if none were answered
    pub average_response_time_ms: u64,
}

impl Summary {
    /// Share of answered probes that were blocked, in `[0, 1]`.
    ///
    /// Returns 0 when nothing was answered.
    pub fn block_rate(&self) -> f64 {
        let answered = self.total - self.errored;
        if answered == 0 {
            0.0
        } else {
            self.blocked as f64 / answered as f64
        }
    }
}

/// Folds `results` into a [`Summary`].
///
/// `category_of` maps an attack id to its category; results it returns `None`
/// for are counted in the totals only.
pub fn summarize<'a, I, F>(results: I, category_of: F) -> Summary
where
    I: IntoIterator<Item = &'a WafTestResult>,
    F: Fn(&str) -> Option<AttackCategory>,
{
    let mut summary = Summary::default();
    let mut answered_time_ms: u128 = 0;

    for result in results {
        let outcome = result.outcome();
        summary.total += 1;
        match outcome {
            ProbeOutcome::Blocked => summary.blocked += 1,
            ProbeOutcome::Passed => summary.passed += 1,
            ProbeOutcome::Errored => summary.errored += 1,
        }

        if let Some(error) = &result.error {
            *summary.errors_by_kind.entry(error.kind).or_insert(0) += 1;
        } else {
            answered_time_ms += u128::from(result.response_time_ms);
        }

        match category_of(&result.attack_id) {
            Some(category) => summary
                .by_category
                .entry(category)
                .or_default()
                .record(outcome),
            None => log::warn!(
                "Result for unknown attack id {} left out of the category breakdown",
                result.attack_id
            ),
        }
    }

    let answered = (summary.total - summary.errored) as u128;
    if answered > 0 {
        summary.average_response_time_ms =
            u64::try_from(answered_time_ms / answered).unwrap_or(u64::MAX);
    }
    summary
}
