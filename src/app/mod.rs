//! Run reporting.
//!
//! This module provides the progress and end-of-run summary logging used by
//! the batch orchestrator.

pub mod logging;
pub mod statistics;

// Re-export public API
pub use logging::log_progress;
pub use statistics::log_summary;
