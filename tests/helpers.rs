// Shared test helpers: in-memory pattern sources and scripted transports.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use waf_tester::probe::{ProbeRequest, TransportResponse};
use waf_tester::{
    AttackCategory, AttackPattern, Config, LogFormat, LogLevel, PatternSource, ProbeError,
    RequestTemplate, Transport, TransportErrorKind,
};

/// Config with quiet logging and a short timeout.
#[allow(dead_code)] // Used by other test files
pub fn test_config() -> Config {
    Config {
        base_url: "http://127.0.0.1:9".to_string(),
        timeout_seconds: 2,
        log_level: LogLevel::Error,
        log_format: LogFormat::Plain,
        user_agent: "waf_tester_test/1.0".to_string(),
        ..Default::default()
    }
}

/// Pattern whose request path is `/<id>`, so transports can tell probes apart.
#[allow(dead_code)]
pub fn pattern(id: &str, category: AttackCategory) -> AttackPattern {
    AttackPattern::new(
        id,
        category,
        &format!("test pattern {}", id),
        RequestTemplate::get(&format!("/{}", id)),
    )
}

/// `count` XSS patterns named `p-00`, `p-01`, ...
#[allow(dead_code)]
pub fn numbered_patterns(count: usize) -> Vec<AttackPattern> {
    (0..count)
        .map(|i| pattern(&format!("p-{:02}", i), AttackCategory::Xss))
        .collect()
}

/// In-memory pattern source that counts fetches.
pub struct StaticSource {
    patterns: Option<Vec<AttackPattern>>,
    pub fetches: AtomicUsize,
}

#[allow(dead_code)]
impl StaticSource {
    pub fn new(patterns: Vec<AttackPattern>) -> Self {
        Self {
            patterns: Some(patterns),
            fetches: AtomicUsize::new(0),
        }
    }

    /// A source whose every fetch fails.
    pub fn failing() -> Self {
        Self {
            patterns: None,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PatternSource for StaticSource {
    fn describe(&self) -> String {
        "static test source".to_string()
    }

    async fn fetch(&self) -> anyhow::Result<Vec<AttackPattern>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match &self.patterns {
            Some(patterns) => Ok(patterns.clone()),
            None => anyhow::bail!("pattern store offline"),
        }
    }
}

/// What a [`CountingTransport`] answers for a path.
#[derive(Debug, Clone, Copy)]
#[allow(dead_code)]
pub enum Reply {
    Status(u16),
    Fail(TransportErrorKind),
}

/// Transport that answers from a path table, optionally after a delay, and
/// records how many requests it saw and how many overlapped.
pub struct CountingTransport {
    replies: HashMap<String, Reply>,
    default_reply: Reply,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    hosts: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl CountingTransport {
    pub fn new(default_reply: Reply) -> Self {
        Self {
            replies: HashMap::new(),
            default_reply,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            hosts: Mutex::new(Vec::new()),
        }
    }

    /// Answers `reply` for requests to `/<attack_id>`.
    pub fn with_reply(mut self, attack_id: &str, reply: Reply) -> Self {
        self.replies.insert(format!("/{}", attack_id), reply);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn hosts(&self) -> Vec<String> {
        self.hosts.lock().clone()
    }

    fn reply_for(&self, url: &str) -> Reply {
        self.replies
            .iter()
            .find(|(path, _)| url.ends_with(path.as_str()))
            .map(|(_, reply)| *reply)
            .unwrap_or(self.default_reply)
    }
}

/// Decrements the in-flight counter even when the probe is aborted mid-delay.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for CountingTransport {
    async fn send(
        &self,
        request: ProbeRequest,
        _timeout: Duration,
    ) -> Result<TransportResponse, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        if let Some(host) = request.header("host") {
            self.hosts.lock().push(host.to_string());
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.reply_for(&request.url) {
            Reply::Status(status) => Ok(TransportResponse {
                status,
                ..Default::default()
            }),
            Reply::Fail(kind) => Err(ProbeError::new(kind, "scripted failure")),
        }
    }
}

/// Transport that never answers.
pub struct HangingTransport {
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl HangingTransport {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Transport for HangingTransport {
    async fn send(
        &self,
        _request: ProbeRequest,
        _timeout: Duration,
    ) -> Result<TransportResponse, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}
