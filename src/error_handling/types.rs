//! Error type definitions.
//!
//! This module defines the typed errors returned to callers and the transport
//! error kinds recorded inside probe results.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use serde::{Deserialize, Serialize};
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// A block-signal pattern in the policy is not a valid regular expression.
    #[error("Invalid block signal pattern: {0}")]
    BlockPatternError(#[from] regex::Error),
}

/// A run cannot start because the target or the pattern set is unusable.
///
/// Always reported before any probe is dispatched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The target has no base URL.
    #[error("Target base URL is empty")]
    MissingBaseUrl,

    /// The target has no host header.
    #[error("Target host header is empty")]
    MissingHostHeader,

    /// The base URL does not parse, is too long, or is not http(s).
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// The rejected URL
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// The run was asked to execute zero patterns.
    #[error("No attack patterns to run")]
    EmptyPatternSet,

    /// The same pattern id was requested more than once.
    #[error("Attack pattern '{0}' requested more than once")]
    DuplicatePatternId(String),

    /// Concurrency limit of zero.
    #[error("Concurrency must be at least 1")]
    ZeroConcurrency,

    /// A host id that is not in the host directory.
    #[error("Unknown host id {0}")]
    UnknownHost(u64),

    /// The selected host declares no domain names to impersonate.
    #[error("Host {0} has no domain names")]
    HostWithoutDomain(u64),
}

/// Pattern catalog errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The pattern source could not be loaded or its content is invalid.
    #[error("Pattern catalog unavailable from {origin}: {reason}")]
    Unavailable {
        /// Description of the source (path, URL, or "builtin")
        origin: String,
        /// What went wrong
        reason: String,
    },

    /// No pattern with the requested id exists in the catalog.
    #[error("Attack pattern not found: {0}")]
    NotFound(String),
}

/// Umbrella error for the `WafTester` facade.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The run could not start.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The catalog could not be loaded or did not contain the pattern.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Transport-level failure categories recorded in a probe result.
///
/// These are outcomes where no status code was received, so the probe can be
/// neither blocked nor passed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIterMacro,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    /// The pattern template could not be turned into a request
    InvalidRequest,
    /// No response within the probe timeout
    Timeout,
    /// Host name resolution failed
    Dns,
    /// TCP/TLS connection could not be established (refused, unreachable)
    Connect,
    /// The connection was reset or closed before a response arrived
    ConnectionReset,
    /// The response could not be read or decoded
    Body,
    /// Anything else the transport reported
    Other,
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TransportErrorKind {
    /// Returns a human-readable string representation of the error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorKind::InvalidRequest => "Invalid request template",
            TransportErrorKind::Timeout => "Request timeout",
            TransportErrorKind::Dns => "DNS resolution error",
            TransportErrorKind::Connect => "Connection error",
            TransportErrorKind::ConnectionReset => "Connection reset",
            TransportErrorKind::Body => "Response body error",
            TransportErrorKind::Other => "Transport error",
        }
    }

    /// Whether another attempt could plausibly succeed.
    pub fn is_retriable(&self) -> bool {
        !matches!(self, TransportErrorKind::InvalidRequest)
    }
}
