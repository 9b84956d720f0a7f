//! End-of-run summary logging.

use log::info;
use strum::IntoEnumIterator;

use crate::aggregate::Summary;
use crate::batch::BatchState;
use crate::catalog::AttackCategory;
use crate::error_handling::TransportErrorKind;

/// Logs the final summary of a batch.
pub fn log_summary(state: BatchState, summary: &Summary, elapsed_seconds: f64) {
    info!(
        "Batch {}: {} probe{} ({} blocked, {} passed, {} errored) in {:.1}s, block rate {:.1}%",
        state,
        summary.total,
        if summary.total == 1 { "" } else { "s" },
        summary.blocked,
        summary.passed,
        summary.errored,
        elapsed_seconds,
        summary.block_rate() * 100.0
    );

    for category in AttackCategory::iter() {
        if let Some(counts) = summary.by_category.get(&category) {
            info!(
                "   {}: {} blocked, {} passed, {} errored",
                category.as_str(),
                counts.blocked,
                counts.passed,
                counts.errored
            );
        }
    }

    log_error_statistics(summary);
}

/// Logs errored probes per transport error kind.
pub fn log_error_statistics(summary: &Summary) {
    if summary.errored == 0 {
        return;
    }
    info!("Error Counts ({} total):", summary.errored);
    for kind in TransportErrorKind::iter() {
        let count = summary.errors_by_kind.get(&kind).copied().unwrap_or(0);
        if count > 0 {
            info!("   {}: {}", kind.as_str(), count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::CategoryCounts;

    #[test]
    fn test_log_summary_empty() {
        // Should not panic when there are no results
        log_summary(BatchState::Cancelled, &Summary::default(), 0.0);
    }

    #[test]
    fn test_log_summary_with_breakdown_and_errors() {
        let mut summary = Summary {
            total: 3,
            blocked: 1,
            passed: 1,
            errored: 1,
            ..Default::default()
        };
        summary.by_category.insert(
            AttackCategory::Xss,
            CategoryCounts {
                blocked: 1,
                passed: 1,
                errored: 1,
            },
        );
        summary.errors_by_kind.insert(TransportErrorKind::Timeout, 1);
        log_summary(BatchState::Completed, &summary, 1.5);
    }
}
