//! Attack pattern data types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::EnumIter as EnumIterMacro;

/// Attack category a pattern belongs to.
///
/// Serialized as the display name (`"SQL Injection"`, `"XSS"`, ...), which is
/// also the form pattern sources use.
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
pub enum AttackCategory {
    /// SQL injection
    #[serde(rename = "SQL Injection")]
    SqlInjection,
    /// Cross-site scripting
    #[serde(rename = "XSS")]
    Xss,
    /// Directory / path traversal and local file inclusion
    #[serde(rename = "Path Traversal")]
    PathTraversal,
    /// OS command injection
    #[serde(rename = "Command Injection")]
    CommandInjection,
    /// Known scanner and attack-tool fingerprints
    #[serde(rename = "Scanner Detection")]
    ScannerDetection,
    /// Remote code execution
    #[serde(rename = "RCE")]
    Rce,
    /// HTTP protocol abuse (CRLF injection, override headers, unusual methods)
    #[serde(rename = "Protocol Attack")]
    ProtocolAttack,
}

impl AttackCategory {
    /// Returns the category's display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttackCategory::SqlInjection => "SQL Injection",
            AttackCategory::Xss => "XSS",
            AttackCategory::PathTraversal => "Path Traversal",
            AttackCategory::CommandInjection => "Command Injection",
            AttackCategory::ScannerDetection => "Scanner Detection",
            AttackCategory::Rce => "RCE",
            AttackCategory::ProtocolAttack => "Protocol Attack",
        }
    }
}

impl std::fmt::Display for AttackCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_method() -> String {
    "GET".to_string()
}

/// Request template a probe is built from.
///
/// `path` is appended verbatim to the target's base URL and carries the query
/// string. A `.` or `..` segment before the query (also in `%2e` form) makes
/// the probe an `InvalidRequest` error, since URL parsing would resolve it;
/// traversal payloads go in the query or use encoded slashes (`..%2f`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTemplate {
    /// HTTP method (defaults to GET)
    #[serde(default = "default_method")]
    pub method: String,
    /// Path and query, starting with `/`
    pub path: String,
    /// Extra request headers
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl RequestTemplate {
    /// Creates a template with no headers and no body.
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Creates a GET template.
    pub fn get(path: &str) -> Self {
        Self::new("GET", path)
    }

    /// Adds a header to the template.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }
}

/// A named, categorized attack definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackPattern {
    /// Unique, stable identifier
    pub id: String,
    /// Attack category
    pub category: AttackCategory,
    /// Human-readable description
    pub description: String,
    /// Template the probe request is built from
    #[serde(rename = "request")]
    pub template: RequestTemplate,
}

impl AttackPattern {
    /// Creates a pattern.
    pub fn new(
        id: &str,
        category: AttackCategory,
        description: &str,
        template: RequestTemplate,
    ) -> Self {
        Self {
            id: id.to_string(),
            category,
            description: description.to_string(),
            template,
        }
    }
}
