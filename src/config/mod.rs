//! Engine configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, limits, blocking policy defaults)
//! - The `Config` struct and the enums it uses

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{BlockPolicy, Config, LogFormat, LogLevel};
