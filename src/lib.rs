//! waf_tester library: attack-pattern validation for web application firewalls
//!
//! This library replays a fixed, auditable catalog of crafted attack requests
//! (SQL injection, XSS, path traversal, command injection, scanner
//! fingerprints, RCE, protocol abuse) against a host sitting behind a WAF, and
//! reports which of them were blocked.
//!
//! Probes are sent to a base URL with the `Host` header of the protected
//! virtual host, so the WAF can be tested directly at its edge address.
//! Each probe ends in one of three ways: blocked, passed, or errored. A
//! network failure (timeout, refused connection, DNS) is always an error and
//! never counted as a pass.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use waf_tester::{BatchEvent, BuiltinSource, Config, TestTarget, WafTester};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     base_url: "http://10.0.0.5".to_string(),
//!     timeout_seconds: 5,
//!     ..Default::default()
//! };
//! waf_tester::initialization::init_logger(&config)?;
//! let tester = WafTester::new(config, Arc::new(BuiltinSource))?;
//!
//! let mut selection = tester.new_selection();
//! selection.set_host_header("shop.example.com");
//!
//! let mut batch = tester.run_batch(&selection.target(), 5).await?;
//! while let Some(event) = batch.next_event().await {
//!     match event {
//!         BatchEvent::Result { attack_id, result } => {
//!             println!("{attack_id}: {:?}", result.outcome());
//!         }
//!         BatchEvent::Finished { summary, .. } => {
//!             println!("{} blocked, {} passed, {} errored",
//!                      summary.blocked, summary.passed, summary.errored);
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

pub mod aggregate;
mod app;
pub mod batch;
pub mod catalog;
pub mod config;
mod engine;
mod error_handling;
pub mod initialization;
pub mod probe;
pub mod target;
mod utils;

// Re-export public API
pub use aggregate::{summarize, CategoryCounts, Summary};
pub use batch::{BatchEvent, BatchHandle, BatchOrchestrator, BatchRun, BatchState};
pub use catalog::{
    AttackCategory, AttackPattern, BuiltinSource, FileSource, PatternCatalog, PatternSource,
    RequestTemplate, UrlSource,
};
pub use config::{BlockPolicy, Config, LogFormat, LogLevel};
pub use engine::WafTester;
pub use error_handling::{
    CatalogError, ConfigurationError, EngineError, InitializationError, TransportErrorKind,
};
pub use probe::{ProbeError, ProbeExecutor, ProbeOutcome, Transport, WafTestResult};
pub use target::{selectable_hosts, HostRecord, TargetSelection, TestTarget};
