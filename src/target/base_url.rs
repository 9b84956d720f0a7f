//! Base URL validation and normalization.

use crate::config::MAX_URL_LENGTH;
use crate::error_handling::ConfigurationError;

fn invalid(url: &str, reason: impl Into<String>) -> ConfigurationError {
    // Keep the echoed URL short; the length check below may be what failed
    let shown: String = url.chars().take(80).collect();
    ConfigurationError::InvalidBaseUrl {
        url: shown,
        reason: reason.into(),
    }
}

/// Validates and normalizes a probe base URL.
///
/// Trims whitespace, adds an `http://` prefix if no scheme is given, strips
/// trailing slashes, then checks that the result parses, uses http or https,
/// has a host, and is at most `MAX_URL_LENGTH` characters.
///
/// # Errors
///
/// `MissingBaseUrl` for an empty (or all-whitespace) input, `InvalidBaseUrl`
/// for everything else that fails.
pub fn normalize_base_url(url: &str) -> Result<String, ConfigurationError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ConfigurationError::MissingBaseUrl);
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    let normalized = with_scheme.trim_end_matches('/').to_string();

    if normalized.len() > MAX_URL_LENGTH {
        return Err(invalid(
            trimmed,
            format!(
                "exceeds maximum length ({} > {})",
                normalized.len(),
                MAX_URL_LENGTH
            ),
        ));
    }

    let parsed = url::Url::parse(&normalized).map_err(|e| invalid(trimmed, e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(trimmed, format!("unsupported scheme '{other}'"))),
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid(trimmed, "missing host"));
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::normalize_base_url;
    use crate::error_handling::ConfigurationError;

    #[test]
    fn test_normalize_base_url_adds_http() {
        assert_eq!(
            normalize_base_url("10.0.0.5"),
            Ok("http://10.0.0.5".to_string())
        );
    }

    #[test]
    fn test_normalize_base_url_preserves_https() {
        assert_eq!(
            normalize_base_url("https://edge.example.net"),
            Ok("https://edge.example.net".to_string())
        );
    }

    #[test]
    fn test_normalize_base_url_trims_whitespace_and_slashes() {
        assert_eq!(
            normalize_base_url("  http://127.0.0.1:8080//  "),
            Ok("http://127.0.0.1:8080".to_string())
        );
    }

    #[test]
    fn test_normalize_base_url_with_port() {
        assert_eq!(
            normalize_base_url("proxy.local:8443"),
            Ok("http://proxy.local:8443".to_string())
        );
    }

    #[test]
    fn test_normalize_base_url_empty() {
        assert_eq!(
            normalize_base_url("   "),
            Err(ConfigurationError::MissingBaseUrl)
        );
    }

    #[test]
    fn test_normalize_base_url_rejects_unsupported_scheme() {
        let result = normalize_base_url("ftp://files.example.com");
        assert!(
            matches!(result, Err(ConfigurationError::InvalidBaseUrl { ref reason, .. }) if reason.contains("ftp")),
            "got {:?}",
            result
        );
    }

    #[test]
    fn test_normalize_base_url_rejects_invalid_url() {
        assert!(matches!(
            normalize_base_url("not a valid url!!!"),
            Err(ConfigurationError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_normalize_base_url_rejects_too_long() {
        let url = format!("http://example.com/{}", "a".repeat(crate::config::MAX_URL_LENGTH));
        let result = normalize_base_url(&url);
        match result {
            Err(ConfigurationError::InvalidBaseUrl { url, reason }) => {
                assert!(reason.contains("maximum length"));
                assert!(url.chars().count() <= 80);
            }
            other => panic!("Expected InvalidBaseUrl, got {:?}", other),
        }
    }
}
