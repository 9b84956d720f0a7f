//! Blocked/passed classification.

use std::collections::BTreeSet;

use regex::{RegexSet, RegexSetBuilder};

use super::transport::TransportResponse;
use crate::config::BlockPolicy;

/// Compiled form of a [`BlockPolicy`].
#[derive(Debug, Clone)]
pub struct BlockClassifier {
    blocked_status_codes: BTreeSet<u16>,
    signal_status_codes: BTreeSet<u16>,
    signals: RegexSet,
}

impl BlockClassifier {
    /// Compiles the policy's block-signal patterns (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns the `regex::Error` of the first invalid pattern.
    pub fn from_policy(policy: &BlockPolicy) -> Result<Self, regex::Error> {
        let signals = RegexSetBuilder::new(&policy.block_signal_patterns)
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            blocked_status_codes: policy.blocked_status_codes.clone(),
            signal_status_codes: policy.signal_status_codes.clone(),
            signals,
        })
    }

    /// Whether a received response means the probe was blocked.
    pub fn is_blocked(&self, response: &TransportResponse) -> bool {
        if self.blocked_status_codes.contains(&response.status) {
            return true;
        }
        if self.signal_status_codes.contains(&response.status) {
            return self.has_block_signal(response);
        }
        false
    }

    fn has_block_signal(&self, response: &TransportResponse) -> bool {
        if self.signals.is_empty() {
            return false;
        }
        self.signals.is_match(&response.body_sample)
            || response
                .headers
                .iter()
                .any(|(_, value)| self.signals.is_match(value))
    }
}
