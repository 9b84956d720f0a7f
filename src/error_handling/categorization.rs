//! Transport error categorization and retry strategy.

use std::error::Error as StdError;
use std::io::ErrorKind as IoErrorKind;
use std::time::Duration;

use tokio_retry::strategy::ExponentialBackoff;

use super::types::TransportErrorKind;
use crate::config::{RETRY_BASE_MS, RETRY_FACTOR, RETRY_MAX_DELAY};

/// Creates the backoff strategy used between attempts of one probe.
///
/// `max_attempts` counts the initial attempt, so the iterator yields
/// `max_attempts - 1` delays (none at all for the default of 1).
pub fn get_retry_strategy(max_attempts: usize) -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(RETRY_BASE_MS)
        .factor(RETRY_FACTOR)
        .max_delay(RETRY_MAX_DELAY)
        .take(max_attempts.saturating_sub(1))
}

/// Categorizes a `reqwest::Error` into a `TransportErrorKind`.
///
/// The reqwest flags are checked first; DNS failures and connection resets
/// are only visible further down the source chain (hyper / io errors), so the
/// chain is inspected before falling back to the coarse `is_connect` flag.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> TransportErrorKind {
    if error.is_timeout() {
        return TransportErrorKind::Timeout;
    }
    if error.is_builder() {
        return TransportErrorKind::InvalidRequest;
    }
    if let Some(kind) = categorize_source_chain(error) {
        return kind;
    }
    if error.is_connect() {
        TransportErrorKind::Connect
    } else if error.is_body() || error.is_decode() {
        TransportErrorKind::Body
    } else {
        TransportErrorKind::Other
    }
}

fn categorize_source_chain(error: &(dyn StdError + 'static)) -> Option<TransportErrorKind> {
    let mut cause = error.source();
    while let Some(current) = cause {
        if let Some(io_err) = current.downcast_ref::<std::io::Error>() {
            match io_err.kind() {
                IoErrorKind::TimedOut => return Some(TransportErrorKind::Timeout),
                IoErrorKind::ConnectionReset
                | IoErrorKind::ConnectionAborted
                | IoErrorKind::BrokenPipe
                | IoErrorKind::UnexpectedEof => return Some(TransportErrorKind::ConnectionReset),
                IoErrorKind::ConnectionRefused => return Some(TransportErrorKind::Connect),
                _ => {}
            }
        }

        // hyper-util wraps resolver failures in an opaque error, so match on text
        let msg = current.to_string().to_lowercase();
        if msg.contains("dns error")
            || msg.contains("failed to lookup address")
            || msg.contains("name or service not known")
            || msg.contains("no such host")
        {
            return Some(TransportErrorKind::Dns);
        }
        if msg.contains("connection reset")
            || msg.contains("connection closed before message completed")
        {
            return Some(TransportErrorKind::ConnectionReset);
        }

        cause = current.source();
    }
    None
}
