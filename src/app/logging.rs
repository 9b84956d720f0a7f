//! Progress logging utilities.

use log::info;

/// Logs progress of a running batch.
///
/// # Arguments
///
/// * `start_time` - When the batch started
/// * `completed` - Probes finished so far
/// * `total` - Probes requested
pub fn log_progress(start_time: std::time::Instant, completed: usize, total: usize) {
    let elapsed_secs = start_time.elapsed().as_secs_f64();
    let rate = if elapsed_secs > 0.0 {
        completed as f64 / elapsed_secs
    } else {
        0.0
    };
    info!(
        "Completed {}/{} probes in {:.2} seconds (~{:.2} probes/sec)",
        completed, total, elapsed_secs, rate
    );
}
