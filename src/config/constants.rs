//! Configuration constants.
//!
//! This module defines the constants used throughout the engine, including
//! timeouts, size limits, retry backoff, and the default blocking policy.

use std::time::Duration;

// Probe dispatch
/// Default number of probes allowed in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 5;
/// Default per-probe timeout in seconds.
///
/// Covers DNS, connect, TLS, and reading the response head. A WAF that
/// tarpits a request past this point is reported as a timeout error, not a block.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;
/// TCP connection timeout in seconds
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;
/// Emit a progress line every N completed probes.
pub const LOGGING_INTERVAL: usize = 5;

/// Default User-Agent string for probe requests.
///
/// Patterns that test scanner detection set their own `User-Agent` in the
/// request template, which replaces this value for that probe only.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Base URL used when the caller does not supply one.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1";

// Response and body size limits
/// Maximum number of response body bytes kept for block-signal matching (64KB)
pub const MAX_BODY_SAMPLE_SIZE: usize = 64 * 1024;
/// Maximum number of headers on a probe request, and of response headers kept for block-signal matching
pub const MAX_HEADER_COUNT: usize = 100;
/// Maximum URL length (2048 characters), matching common browser and server limits
pub const MAX_URL_LENGTH: usize = 2048;

// Error message limits
/// Maximum error message length in characters (500 chars)
/// Messages longer than this are truncated with a note about the original length
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 500;

// Retry strategy
/// Base of the exponential backoff, multiplied by `RETRY_FACTOR` per attempt.
/// With a base of 2 and a factor of 100 the delays are 200ms, 400ms, 800ms...
pub const RETRY_BASE_MS: u64 = 2;
/// Factor applied to each backoff step
pub const RETRY_FACTOR: u64 = 100;
/// Maximum delay between retries
pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(2);
/// Default number of attempts per probe (1 = no retry)
pub const DEFAULT_MAX_ATTEMPTS: usize = 1;

// Blocking policy defaults
/// Status codes that classify a probe as blocked on their own.
pub const DEFAULT_BLOCKED_STATUS_CODES: &[u16] = &[403, 406, 429];
/// Status codes that classify as blocked only when a block signal is present.
pub const DEFAULT_SIGNAL_STATUS_CODES: &[u16] = &[503];
/// Case-insensitive patterns that mark a signal-status response as a block.
pub const DEFAULT_BLOCK_SIGNAL_PATTERNS: &[&str] = &[
    r"request (was )?(blocked|rejected)",
    r"access denied",
    r"web application firewall",
    r"security polic(y|ies)",
    r"attention required",
    r"mod_?security",
];
