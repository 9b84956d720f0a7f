//! Probe result types.

use serde::{Deserialize, Serialize};

use crate::error_handling::{categorize_reqwest_error, TransportErrorKind};
use crate::utils::sanitize_and_truncate_error_message;

/// A transport failure recorded inside a probe result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeError {
    /// Failure category
    pub kind: TransportErrorKind,
    /// Sanitized, length-bounded description
    pub message: String,
}

impl ProbeError {
    /// Creates an error, sanitizing and truncating `message`.
    pub fn new(kind: TransportErrorKind, message: impl AsRef<str>) -> Self {
        Self {
            kind,
            message: sanitize_and_truncate_error_message(message.as_ref()),
        }
    }

    /// Categorizes a `reqwest` error.
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        Self::new(categorize_reqwest_error(error), describe_reqwest_error(error))
    }
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// One-line description of a `reqwest` error and its source chain, without the URL.
fn describe_reqwest_error(error: &reqwest::Error) -> String {
    let mut message = match error.url() {
        Some(url) => error.to_string().replace(&format!(" for url ({})", url), ""),
        None => error.to_string(),
    };
    let mut cause = std::error::Error::source(error);
    while let Some(current) = cause {
        message.push_str(": ");
        message.push_str(&current.to_string());
        cause = current.source();
    }
    message
}

/// How a probe ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// A response was received and classified as blocked
    Blocked,
    /// A response was received and classified as not blocked
    Passed,
    /// No response was received
    Errored,
}

/// Result of one probe attempt.
///
/// Built exactly once per attempt and never mutated; a retry produces a new
/// value. An errored result is never blocked and carries status code 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WafTestResult {
    /// Id of the attack pattern the probe was built from
    pub attack_id: String,
    /// Whether the response was classified as blocked
    pub blocked: bool,
    /// Received status code, 0 when no response was received
    pub status_code: u16,
    /// Wall-clock duration of the attempt
    pub response_time_ms: u64,
    /// Transport failure, if no response was received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ProbeError>,
}

impl WafTestResult {
    /// Result for a probe that received a response.
    pub fn answered(attack_id: &str, status_code: u16, blocked: bool, response_time_ms: u64) -> Self {
        Self {
            attack_id: attack_id.to_string(),
            blocked,
            status_code,
            response_time_ms,
            error: None,
        }
    }

    /// Result for a probe that received no response.
    pub fn failed(attack_id: &str, error: ProbeError, response_time_ms: u64) -> Self {
        Self {
            attack_id: attack_id.to_string(),
            blocked: false,
            status_code: 0,
            response_time_ms,
            error: Some(error),
        }
    }

    /// Whether the probe ended in a transport error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Classification of the result.
    pub fn outcome(&self) -> ProbeOutcome {
        if self.error.is_some() {
            ProbeOutcome::Errored
        } else if self.blocked {
            ProbeOutcome::Blocked
        } else {
            ProbeOutcome::Passed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_is_never_blocked() {
        let result = WafTestResult::failed(
            "sqli-1",
            ProbeError::new(TransportErrorKind::Timeout, "no response within 10s"),
            10_000,
        );
        assert!(!result.blocked);
        assert_eq!(result.status_code, 0);
        assert_eq!(result.outcome(), ProbeOutcome::Errored);
    }

    #[test]
    fn test_answered_outcomes() {
        assert_eq!(
            WafTestResult::answered("a", 403, true, 5).outcome(),
            ProbeOutcome::Blocked
        );
        assert_eq!(
            WafTestResult::answered("a", 200, false, 5).outcome(),
            ProbeOutcome::Passed
        );
    }

    #[test]
    fn test_probe_error_sanitizes_message() {
        let err = ProbeError::new(TransportErrorKind::Other, "bad\x00bytes\x1b[31m");
        assert_eq!(err.message, "badbytes[31m");
    }

    #[test]
    fn test_result_serializes_without_empty_error() {
        let json = serde_json::to_value(WafTestResult::answered("xss-1", 200, false, 12))
            .expect("Failed to serialize");
        assert_eq!(json["attack_id"], "xss-1");
        assert_eq!(json["status_code"], 200);
        assert!(json.get("error").is_none());

        let json = serde_json::to_value(WafTestResult::failed(
            "xss-1",
            ProbeError::new(TransportErrorKind::Dns, "lookup failed"),
            3,
        ))
        .expect("Failed to serialize");
        assert_eq!(json["error"]["kind"], "dns");
    }
}
