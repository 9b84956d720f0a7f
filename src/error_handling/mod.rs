//! Error handling.
//!
//! This module provides:
//! - The typed errors returned to callers (`ConfigurationError`,
//!   `CatalogError`, `InitializationError`, `EngineError`)
//! - Transport error kinds recorded inside probe results
//! - Categorization of `reqwest` errors into those kinds
//! - Retry strategy configuration
//!
//! Configuration and catalog errors are returned as `Err` values. Transport
//! errors never are: the probe executor turns them into result data so batch
//! control flow does not depend on per-probe outcome.

mod categorization;
mod types;

// Re-export public API
pub use categorization::{categorize_reqwest_error, get_retry_strategy};
pub use types::{
    CatalogError, ConfigurationError, EngineError, InitializationError, TransportErrorKind,
};
