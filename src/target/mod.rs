//! Test target resolution.
//!
//! A test target is the pair a probe needs: the base URL the request is
//! physically sent to, and the `Host` header naming the virtual host being
//! impersonated. Targets come either from a host in the host directory (its
//! first domain name becomes the header) or from a manually typed header.
//! [`TargetSelection`] keeps those two inputs mutually exclusive.
//!
//! Nothing in this module touches the network.

mod base_url;

use serde::{Deserialize, Serialize};

use crate::error_handling::ConfigurationError;

pub use base_url::normalize_base_url;

/// A protected host as supplied by the host directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    /// Directory identifier
    pub id: u64,
    /// Domain names served by the host; the first is the primary one
    #[serde(default)]
    pub domain_names: Vec<String>,
    /// Whether the host is active in the directory
    #[serde(default)]
    pub enabled: bool,
    /// Whether filtering is switched on for the host
    #[serde(default)]
    pub filtering_enabled: bool,
    /// Filtering mode label reported by the directory (for example "block" or "detect")
    #[serde(default)]
    pub filtering_mode: String,
}

impl HostRecord {
    /// First non-empty declared domain name.
    pub fn primary_domain(&self) -> Option<&str> {
        self.domain_names
            .iter()
            .map(|d| d.trim())
            .find(|d| !d.is_empty())
    }
}

/// Lists hosts that can be picked as a target: enabled ones, in directory order.
pub fn selectable_hosts(hosts: &[HostRecord]) -> Vec<&HostRecord> {
    hosts.iter().filter(|h| h.enabled).collect()
}

/// Concrete `(base URL, Host header)` pair a probe is sent to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestTarget {
    /// Scheme, host and optional port requests are sent to
    pub base_url: String,
    /// Value of the `Host` header on every probe
    pub host_header: String,
}

impl TestTarget {
    /// Creates a target.
    pub fn new(base_url: &str, host_header: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            host_header: host_header.to_string(),
        }
    }

    /// Whether both fields are non-empty.
    pub fn is_runnable(&self) -> bool {
        !self.base_url.trim().is_empty() && !self.host_header.trim().is_empty()
    }

    /// Checks the target and returns its normalized form.
    ///
    /// # Errors
    ///
    /// `MissingBaseUrl`, `MissingHostHeader` or `InvalidBaseUrl`.
    pub fn validate(&self) -> Result<TestTarget, ConfigurationError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigurationError::MissingBaseUrl);
        }
        let host_header = self.host_header.trim();
        if host_header.is_empty() {
            return Err(ConfigurationError::MissingHostHeader);
        }
        Ok(TestTarget {
            base_url: normalize_base_url(&self.base_url)?,
            host_header: host_header.to_string(),
        })
    }
}

/// Holds the caller's target choice.
///
/// Selecting a host overwrites any typed header; typing a header clears the
/// host selection. The base URL is independent of both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSelection {
    base_url: String,
    host_header: String,
    selected_host: Option<u64>,
}

impl TargetSelection {
    /// Creates a selection with a base URL and no host.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Default::default()
        }
    }

    /// Selects a host from the directory and takes its primary domain as header.
    ///
    /// # Errors
    ///
    /// `UnknownHost` if no host has `id`, `HostWithoutDomain` if it declares
    /// no domain names. The selection is unchanged on error.
    pub fn select_host(&mut self, hosts: &[HostRecord], id: u64) -> Result<(), ConfigurationError> {
        let host = hosts
            .iter()
            .find(|h| h.id == id)
            .ok_or(ConfigurationError::UnknownHost(id))?;
        let domain = host
            .primary_domain()
            .ok_or(ConfigurationError::HostWithoutDomain(id))?;
        if !host.enabled {
            log::warn!("Selected host {} ({}) is disabled in the directory", id, domain);
        }
        self.host_header = domain.to_string();
        self.selected_host = Some(id);
        Ok(())
    }

    /// Sets the header manually, clearing any host selection.
    pub fn set_host_header(&mut self, host_header: &str) {
        self.host_header = host_header.to_string();
        self.selected_host = None;
    }

    /// Sets the base URL probes are sent to.
    pub fn set_base_url(&mut self, base_url: &str) {
        self.base_url = base_url.to_string();
    }

    /// Id of the selected host, if the header came from one.
    pub fn selected_host(&self) -> Option<u64> {
        self.selected_host
    }

    /// Current host header.
    pub fn host_header(&self) -> &str {
        &self.host_header
    }

    /// The target as currently chosen. It may not be runnable yet.
    pub fn target(&self) -> TestTarget {
        TestTarget::new(&self.base_url, &self.host_header)
    }
}
