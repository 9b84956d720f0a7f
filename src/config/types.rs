//! Configuration types.
//!
//! This module defines the library configuration struct and the enums it uses.
//! Everything here can be constructed programmatically or deserialized from an
//! embedding application's own configuration file.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::constants::{
    DEFAULT_BASE_URL, DEFAULT_BLOCKED_STATUS_CODES, DEFAULT_BLOCK_SIGNAL_PATTERNS,
    DEFAULT_CONCURRENCY, DEFAULT_MAX_ATTEMPTS, DEFAULT_PROBE_TIMEOUT_SECS,
    DEFAULT_SIGNAL_STATUS_CODES, DEFAULT_USER_AGENT,
};

/// Logging level for the engine.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Tunable blocked/passed classification policy.
///
/// A received status in `blocked_status_codes` is a block. A status in
/// `signal_status_codes` is a block only when one of `block_signal_patterns`
/// (case-insensitive regular expressions) matches the response body sample or
/// a response header value. Every other received status is a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockPolicy {
    /// Status codes that mean "blocked" on their own
    pub blocked_status_codes: BTreeSet<u16>,
    /// Status codes that mean "blocked" only with a block signal present
    pub signal_status_codes: BTreeSet<u16>,
    /// Regular expressions searched for in body and header values
    pub block_signal_patterns: Vec<String>,
}

impl Default for BlockPolicy {
    fn default() -> Self {
        Self {
            blocked_status_codes: DEFAULT_BLOCKED_STATUS_CODES.iter().copied().collect(),
            signal_status_codes: DEFAULT_SIGNAL_STATUS_CODES.iter().copied().collect(),
            block_signal_patterns: DEFAULT_BLOCK_SIGNAL_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

/// Library configuration.
///
/// # Examples
///
/// ```no_run
/// use waf_tester::Config;
///
/// let config = Config {
///     base_url: "https://proxy.example.net".to_string(),
///     default_concurrency: 10,
///     timeout_seconds: 5,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL probes are sent to when a target does not override it
    pub base_url: String,

    /// Per-probe timeout in seconds
    pub timeout_seconds: u64,

    /// Concurrency used by `run_batch` callers that do not pick their own
    pub default_concurrency: usize,

    /// HTTP User-Agent header value
    pub user_agent: String,

    /// Accept self-signed or mismatched TLS certificates on the target
    pub accept_invalid_certs: bool,

    /// Attempts per probe when the transport fails (1 = no retry)
    pub max_attempts: usize,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Blocked/passed classification policy
    pub block_policy: BlockPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_PROBE_TIMEOUT_SECS,
            default_concurrency: DEFAULT_CONCURRENCY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_invalid_certs: false,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            block_policy: BlockPolicy::default(),
        }
    }
}

impl Config {
    /// Per-probe timeout as a `Duration`.
    pub fn probe_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds)
    }
}
