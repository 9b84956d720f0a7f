//! Probe request construction.

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;

use super::result::ProbeError;
use crate::catalog::RequestTemplate;
use crate::config::{MAX_HEADER_COUNT, MAX_URL_LENGTH};
use crate::error_handling::TransportErrorKind;
use crate::target::TestTarget;

/// A concrete request built from a pattern template and a target.
///
/// Headers are kept as validated name/value strings in send order; `Host` is
/// always present and always last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute request URL
    pub url: String,
    /// Header name/value pairs
    pub headers: Vec<(String, String)>,
    /// Request body
    pub body: Option<String>,
}

fn invalid(message: String) -> ProbeError {
    ProbeError::new(TransportErrorKind::InvalidRequest, message)
}

impl ProbeRequest {
    /// Builds the request for `template` against `target`.
    ///
    /// The template path is appended to the base URL. Any `Host` header in the
    /// template is dropped in favor of `target.host_header`.
    ///
    /// # Errors
    ///
    /// A `ProbeError` of kind `InvalidRequest` if the method, URL or a header
    /// is not valid HTTP.
    pub fn build(template: &RequestTemplate, target: &TestTarget) -> Result<Self, ProbeError> {
        let method_name = template.method.trim().to_ascii_uppercase();
        let method = Method::from_bytes(method_name.as_bytes())
            .map_err(|_| invalid(format!("invalid HTTP method '{}'", template.method)))?;

        let base = target.base_url.trim().trim_end_matches('/');
        let url = if template.path.starts_with('/') {
            format!("{}{}", base, template.path)
        } else {
            format!("{}/{}", base, template.path)
        };
        if url.len() > MAX_URL_LENGTH {
            return Err(invalid(format!(
                "request URL exceeds maximum length ({} > {})",
                url.len(),
                MAX_URL_LENGTH
            )));
        }
        url::Url::parse(&url).map_err(|e| invalid(format!("invalid request URL: {}", e)))?;
        if let Some(segment) = find_dot_segment(&template.path) {
            return Err(invalid(format!(
                "path segment '{}' would be resolved away before sending",
                segment
            )));
        }

        if template.headers.len() >= MAX_HEADER_COUNT {
            return Err(invalid(format!(
                "too many headers ({} >= {})",
                template.headers.len(),
                MAX_HEADER_COUNT
            )));
        }

        let mut headers = Vec::with_capacity(template.headers.len() + 1);
        for (name, value) in &template.headers {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| invalid(format!("invalid header name '{}'", name)))?;
            HeaderValue::from_str(value)
                .map_err(|_| invalid(format!("invalid value for header '{}'", name)))?;
            if name.eq_ignore_ascii_case("host") {
                continue;
            }
            headers.push((name.clone(), value.clone()));
        }

        let host = target.host_header.trim();
        HeaderValue::from_str(host).map_err(|_| invalid(format!("invalid host header '{}'", host)))?;
        headers.push(("Host".to_string(), host.to_string()));

        Ok(Self {
            method,
            url,
            headers,
            body: template.body.clone(),
        })
    }

    /// Value of the first header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// First `.` or `..` segment (plain or `%2e`-encoded) in the path part of
/// `path`. URL parsing resolves these, so the request on the wire would differ
/// from the template.
fn find_dot_segment(path: &str) -> Option<&str> {
    let end = path.find(&['?', '#'][..]).unwrap_or(path.len());
    path[..end].split(&['/', '\\'][..]).find(|segment| {
        matches!(
            segment.to_ascii_lowercase().as_str(),
            "." | ".." | "%2e" | ".%2e" | "%2e." | "%2e%2e"
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> TestTarget {
        TestTarget::new("http://127.0.0.1:8080/", "shop.example.com")
    }

    #[test]
    fn test_build_joins_base_and_path() {
        let request = ProbeRequest::build(&RequestTemplate::get("/search?q=1"), &target())
            .expect("Request should build");
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.url, "http://127.0.0.1:8080/search?q=1");
    }

    #[test]
    fn test_build_path_without_leading_slash() {
        let request = ProbeRequest::build(&RequestTemplate::get("index.php"), &target())
            .expect("Request should build");
        assert_eq!(request.url, "http://127.0.0.1:8080/index.php");
    }

    #[test]
    fn test_host_header_from_target_wins() {
        let template = RequestTemplate::get("/")
            .with_header("host", "evil.example")
            .with_header("X-Test", "1");
        let request = ProbeRequest::build(&template, &target()).expect("Request should build");
        assert_eq!(request.header("Host"), Some("shop.example.com"));
        assert_eq!(
            request.headers.last(),
            Some(&("Host".to_string(), "shop.example.com".to_string()))
        );
        assert_eq!(
            request
                .headers
                .iter()
                .filter(|(n, _)| n.eq_ignore_ascii_case("host"))
                .count(),
            1
        );
        assert_eq!(request.header("x-test"), Some("1"));
    }

    #[test]
    fn test_method_is_normalized() {
        let request = ProbeRequest::build(&RequestTemplate::new("post", "/login"), &target())
            .expect("Request should build");
        assert_eq!(request.method, Method::POST);
    }

    #[test]
    fn test_invalid_method() {
        let err = ProbeRequest::build(&RequestTemplate::new("GE T", "/"), &target())
            .expect_err("Method with a space is invalid");
        assert_eq!(err.kind, TransportErrorKind::InvalidRequest);
    }

    #[test]
    fn test_invalid_header_name() {
        let template = RequestTemplate::get("/").with_header("Bad Header", "x");
        let err = ProbeRequest::build(&template, &target()).expect_err("Header name is invalid");
        assert_eq!(err.kind, TransportErrorKind::InvalidRequest);
        assert!(err.message.contains("Bad Header"));
    }

    #[test]
    fn test_invalid_header_value() {
        let template = RequestTemplate::get("/").with_header("X-Test", "line\nbreak");
        let err = ProbeRequest::build(&template, &target()).expect_err("Header value is invalid");
        assert_eq!(err.kind, TransportErrorKind::InvalidRequest);
    }

    #[test]
    fn test_unparseable_base_url() {
        let err = ProbeRequest::build(
            &RequestTemplate::get("/"),
            &TestTarget::new("", "shop.example.com"),
        )
        .expect_err("Empty base URL cannot build a request");
        assert_eq!(err.kind, TransportErrorKind::InvalidRequest);
    }

    #[test]
    fn test_body_is_carried() {
        let template = RequestTemplate::new("POST", "/comments").with_body("{\"a\":1}");
        let request = ProbeRequest::build(&template, &target()).expect("Request should build");
        assert_eq!(request.body.as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_dot_segments_in_path_are_rejected() {
        for path in ["/../../etc/passwd", "/static/./x", "/a/%2e%2e/b", "/a/.%2E", "\\..\\win.ini"] {
            let err = ProbeRequest::build(&RequestTemplate::get(path), &target())
                .expect_err("Dot segments must not be silently resolved");
            assert_eq!(err.kind, TransportErrorKind::InvalidRequest, "path {}", path);
        }
    }

    #[test]
    fn test_traversal_outside_path_segments_is_kept() {
        for path in [
            "/?file=../../../../etc/passwd",
            "/static/..%2f..%2fetc%2fpasswd",
            "/files/...",
            "/download#../x",
        ] {
            let request = ProbeRequest::build(&RequestTemplate::get(path), &target())
                .expect("Request should build");
            assert_eq!(request.url, format!("http://127.0.0.1:8080{}", path));
        }
    }
}
