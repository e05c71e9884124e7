// crates/tracker-contract-core/src/http.rs
// ============================================================================
// Module: HTTP Client Wrapper
// Description: Blocking HTTP client for tracker API contract checks.
// Purpose: Send request contracts and return status, headers, and raw bodies.
// Dependencies: reqwest, serde_json, url, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`ApiClient`] sends a [`RequestContract`] and blocks until a response or a
//! transport failure. HTTP error statuses are valid results, not failures:
//! they are returned as [`HttpResult`] values for the scenario to assert on.
//! Only connect, timeout, and body-read problems surface as
//! [`TransportError`].
//! Invariants:
//! - No retries are performed.
//! - Redirects are not followed.
//! - A request without an explicit timeout uses the configured default.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use std::time::Instant;

use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::AuthConfig;
use crate::config::ServiceConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// JSON content type sent on every request.
pub const CONTENT_TYPE_JSON: &str = "application/json";
/// Authorization header name.
pub const AUTHORIZATION: &str = "Authorization";
/// Content type header name.
pub const CONTENT_TYPE: &str = "Content-Type";
/// Placeholder written in place of secret header values.
pub const REDACTED: &str = "<redacted>";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Transport-level failures, distinct from HTTP error statuses.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP client could not be constructed.
    #[error("http client build failed: {0}")]
    Build(String),
    /// Request did not complete within the timeout.
    #[error("request to {url} timed out after {timeout_ms} ms")]
    Timeout {
        /// Target URL.
        url: String,
        /// Effective timeout in milliseconds.
        timeout_ms: u64,
    },
    /// Connection could not be established.
    #[error("connection to {url} failed: {message}")]
    Connect {
        /// Target URL.
        url: String,
        /// Underlying error message.
        message: String,
    },
    /// Request failed for another transport reason.
    #[error("request to {url} failed: {message}")]
    Request {
        /// Target URL.
        url: String,
        /// Underlying error message.
        message: String,
    },
    /// Response body could not be read.
    #[error("reading response body from {url} failed: {message}")]
    Body {
        /// Target URL.
        url: String,
        /// Underlying error message.
        message: String,
    },
}

// ============================================================================
// SECTION: Methods
// ============================================================================

/// HTTP methods used by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET request.
    Get,
    /// POST request.
    Post,
    /// DELETE request, used only for fixture teardown.
    Delete,
}

impl HttpMethod {
    /// Returns the method token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }

    /// Converts to the reqwest method type.
    const fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Headers
// ============================================================================

/// Ordered header map with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    /// Creates an empty header map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a header, matching existing names case-insensitively.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.remove(&name);
        self.0.insert(name, value.into());
    }

    /// Appends a value, joining with `, ` when the header already exists.
    pub fn append(&mut self, name: &str, value: &str) {
        match self.key_for(name) {
            Some(key) => {
                if let Some(existing) = self.0.get_mut(&key) {
                    existing.push_str(", ");
                    existing.push_str(value);
                }
            }
            None => {
                self.0.insert(name.to_string(), value.to_string());
            }
        }
    }

    /// Removes a header by case-insensitive name and returns its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let key = self.key_for(name)?;
        self.0.remove(&key)
    }

    /// Returns a header value by case-insensitive name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns true when the header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates over headers in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Returns the number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no headers are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a copy with the authorization value replaced by [`REDACTED`].
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.contains(AUTHORIZATION) {
            copy.insert(AUTHORIZATION, REDACTED);
        }
        copy
    }

    /// Finds the stored key matching `name` case-insensitively.
    fn key_for(&self, name: &str) -> Option<String> {
        self.0.keys().find(|key| key.eq_ignore_ascii_case(name)).cloned()
    }
}

/// Header policy applied when rendering a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderPolicy {
    /// Authorization, organization, and content type headers.
    Authenticated,
    /// Content type only; no credentials.
    Anonymous,
    /// Authenticated headers with the organization value replaced.
    OrgOverride(String),
}

/// Credentials used to build authenticated headers.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Authorization scheme prefix.
    scheme: String,
    /// Authorization token.
    token: String,
    /// Organization identifier.
    org_id: String,
    /// Organization header name.
    org_header: String,
}

impl Credentials {
    /// Creates credentials from explicit parts.
    #[must_use]
    pub fn new(
        scheme: impl Into<String>,
        token: impl Into<String>,
        org_header: impl Into<String>,
        org_id: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            token: token.into(),
            org_id: org_id.into(),
            org_header: org_header.into(),
        }
    }

    /// Creates credentials from the auth configuration section.
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.scheme, &config.token, &config.org_header, &config.org_id)
    }

    /// Returns the organization header name.
    #[must_use]
    pub fn org_header(&self) -> &str {
        &self.org_header
    }

    /// Builds request headers for the given policy.
    #[must_use]
    pub fn headers(&self, policy: &HeaderPolicy) -> Headers {
        let mut headers = Headers::new();
        headers.insert(CONTENT_TYPE, CONTENT_TYPE_JSON);
        match policy {
            HeaderPolicy::Anonymous => {}
            HeaderPolicy::Authenticated => {
                headers.insert(AUTHORIZATION, format!("{} {}", self.scheme, self.token));
                headers.insert(self.org_header.clone(), self.org_id.clone());
            }
            HeaderPolicy::OrgOverride(org_id) => {
                headers.insert(AUTHORIZATION, format!("{} {}", self.scheme, self.token));
                headers.insert(self.org_header.clone(), org_id.clone());
            }
        }
        headers
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("scheme", &self.scheme)
            .field("token", &REDACTED)
            .field("org_header", &self.org_header)
            .field("org_id", &self.org_id)
            .finish()
    }
}

// ============================================================================
// SECTION: Request / Response
// ============================================================================

/// Fully resolved request ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContract {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute request URL.
    pub url: Url,
    /// Request headers.
    pub headers: Headers,
    /// Optional JSON body; `None` sends no body at all.
    pub body: Option<Value>,
    /// Optional per-request timeout overriding the client default.
    pub timeout: Option<Duration>,
}

impl RequestContract {
    /// Renders a human-readable description with redacted credentials.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut out = format!("URL: {}\nMethod: {}\n", self.url, self.method);
        for (name, value) in self.headers.redacted().iter() {
            out.push_str(&format!("{name}: {value}\n"));
        }
        if let Some(timeout) = self.timeout {
            out.push_str(&format!("Timeout (ms): {}\n", timeout.as_millis()));
        }
        out
    }
}

/// Response returned by the service, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResult {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Headers,
    /// Raw response body.
    pub text: String,
    /// Wall-clock time spent on the exchange.
    pub elapsed: Duration,
}

impl HttpResult {
    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the JSON parse error when the body is not valid JSON.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.text)
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns the response content type, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE)
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Blocking HTTP client with a default timeout.
///
/// # Invariants
/// - One request is in flight at a time per caller.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// Underlying reqwest client.
    client: Client,
    /// Timeout used when the request does not set one.
    default_timeout: Duration,
}

impl ApiClient {
    /// Builds a client from the service configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Build`] when the HTTP client cannot be created.
    pub fn new(config: &ServiceConfig) -> Result<Self, TransportError> {
        let default_timeout = config.timeout();
        let client = Client::builder()
            .timeout(default_timeout)
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|err| TransportError::Build(err.to_string()))?;
        Ok(Self {
            client,
            default_timeout,
        })
    }

    /// Returns the default timeout.
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Sends a request and returns the response regardless of status.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on connect, timeout, or body-read failures.
    pub fn send(&self, request: &RequestContract) -> Result<HttpResult, TransportError> {
        let url = request.url.to_string();
        let timeout = request.timeout.unwrap_or(self.default_timeout);
        let mut builder =
            self.client.request(request.method.to_reqwest(), request.url.as_str()).timeout(timeout);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            let bytes = serde_json::to_vec(body).map_err(|err| TransportError::Request {
                url: url.clone(),
                message: format!("body serialization failed: {err}"),
            })?;
            builder = builder.body(bytes);
        }

        let started = Instant::now();
        let response = builder.send().map_err(|err| classify(&url, timeout, &err))?;
        let status = response.status().as_u16();
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            headers.append(name.as_str(), value.to_str().unwrap_or("<non-utf8>"));
        }
        let text = response.text().map_err(|err| {
            if err.is_timeout() {
                TransportError::Timeout {
                    url: url.clone(),
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                }
            } else {
                TransportError::Body {
                    url: url.clone(),
                    message: err.to_string(),
                }
            }
        })?;
        let elapsed = started.elapsed();
        tracing::debug!(
            method = request.method.as_str(),
            url = %url,
            status,
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "http exchange completed"
        );
        Ok(HttpResult {
            status,
            headers,
            text,
            elapsed,
        })
    }
}

/// Maps a reqwest send error onto the transport taxonomy.
fn classify(url: &str, timeout: Duration, err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    } else if err.is_connect() {
        TransportError::Connect {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else {
        TransportError::Request {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::use_debug, reason = "Test-only assertions.")]

    use super::*;

    fn credentials() -> Credentials {
        Credentials::new("OAuth", "tok", "X-Cloud-Org-ID", "org-1")
    }

    #[test]
    fn authenticated_headers_carry_credentials() {
        let headers = credentials().headers(&HeaderPolicy::Authenticated);
        assert_eq!(headers.get("authorization"), Some("OAuth tok"));
        assert_eq!(headers.get("x-cloud-org-id"), Some("org-1"));
        assert_eq!(headers.get(CONTENT_TYPE), Some(CONTENT_TYPE_JSON));
    }

    #[test]
    fn anonymous_headers_only_set_content_type() {
        let headers = credentials().headers(&HeaderPolicy::Anonymous);
        assert_eq!(headers.len(), 1);
        assert!(!headers.contains(AUTHORIZATION));
    }

    #[test]
    fn org_override_replaces_org_only() {
        let headers =
            credentials().headers(&HeaderPolicy::OrgOverride("wrong_org_id".to_string()));
        assert_eq!(headers.get("X-Cloud-Org-ID"), Some("wrong_org_id"));
        assert_eq!(headers.get(AUTHORIZATION), Some("OAuth tok"));
    }

    #[test]
    fn insert_replaces_case_insensitively() {
        let mut headers = Headers::new();
        headers.insert("content-type", "text/plain");
        headers.insert("Content-Type", "application/json");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("CONTENT-TYPE"), Some("application/json"));
    }

    #[test]
    fn append_joins_repeated_headers() {
        let mut headers = Headers::new();
        headers.append("set-cookie", "a=1");
        headers.append("Set-Cookie", "b=2");
        assert_eq!(headers.get("set-cookie"), Some("a=1, b=2"));
    }

    #[test]
    fn describe_redacts_authorization() {
        let request = RequestContract {
            method: HttpMethod::Get,
            url: Url::parse("https://tracker.example.test/v2/issues/1").unwrap(),
            headers: credentials().headers(&HeaderPolicy::Authenticated),
            body: None,
            timeout: Some(Duration::from_secs(5)),
        };
        let text = request.describe();
        assert!(text.contains("Method: GET"));
        assert!(text.contains("Authorization: <redacted>"));
        assert!(!text.contains("tok"));
        assert!(text.contains("Timeout (ms): 5000"));
    }

    #[test]
    fn credentials_debug_redacts_token() {
        let rendered = format!("{:?}", credentials());
        assert!(!rendered.contains("\"tok\""));
        assert!(rendered.contains(REDACTED));
    }

    #[test]
    fn success_range_is_2xx() {
        let mut result = HttpResult {
            status: 201,
            headers: Headers::new(),
            text: "{}".to_string(),
            elapsed: Duration::ZERO,
        };
        assert!(result.is_success());
        result.status = 404;
        assert!(!result.is_success());
        assert_eq!(result.json().unwrap(), serde_json::json!({}));
    }
}
