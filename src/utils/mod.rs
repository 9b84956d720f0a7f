//! Utility functions.
//!
//! This module provides:
//! - Error message sanitization
//! - Duration conversion for probe timings

pub mod sanitize;
mod timing;

pub use sanitize::sanitize_and_truncate_error_message;
pub use timing::duration_to_ms;
