// crates/tracker-contract-core/src/template.rs
// ============================================================================
// Module: Request Templates
// Description: Declarative request templates with variable placeholders.
// Purpose: Render immutable request contracts from scenario variables.
// Dependencies: serde_json, url, thiserror
// ============================================================================

//! ## Overview
//! A [`RequestTemplate`] describes a request relative to the service base URL.
//! Path segments and query values may reference scenario variables using
//! `{name}` placeholders; variables come from provisioned fixtures and values
//! captured from earlier responses. Rendering produces a
//! [`RequestContract`] and never mutates the template.
//! Invariants:
//! - Every placeholder must resolve; unresolved names fail rendering.
//! - Placeholder names are ASCII alphanumerics or `_`.
//! - Path values are percent-encoded; query values go through the URL
//!   serializer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use url::Url;
use url::form_urlencoded;

use crate::http::Credentials;
use crate::http::HeaderPolicy;
use crate::http::HttpMethod;
use crate::http::RequestContract;

/// Scenario variables keyed by name.
pub type Vars = BTreeMap<String, String>;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while rendering templates.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A placeholder references an unknown variable.
    #[error("unresolved placeholder `{{{name}}}` in `{template}`")]
    UnresolvedPlaceholder {
        /// Placeholder name.
        name: String,
        /// Template text.
        template: String,
    },
    /// A placeholder is malformed (unterminated or invalid name).
    #[error("malformed placeholder in `{0}`")]
    MalformedPlaceholder(String),
    /// Rendered URL did not parse.
    #[error("invalid url `{url}`: {message}")]
    InvalidUrl {
        /// Rendered URL text.
        url: String,
        /// Parser diagnostic.
        message: String,
    },
}

// ============================================================================
// SECTION: Template
// ============================================================================

/// Request template resolved against a base URL and variables.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTemplate {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path relative to the base URL, with `{var}` placeholders.
    pub path: String,
    /// Query pairs; values may contain placeholders.
    pub query: Vec<(String, String)>,
    /// Header policy.
    pub headers: HeaderPolicy,
    /// Extra headers applied after the policy.
    pub extra_headers: Vec<(String, String)>,
    /// Optional JSON body.
    pub body: Option<Value>,
    /// Optional per-request timeout.
    pub timeout: Option<Duration>,
}

impl RequestTemplate {
    /// Creates an authenticated template for the given method and path.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderPolicy::Authenticated,
            extra_headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    /// Creates a GET template.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a POST template with an optional JSON body.
    #[must_use]
    pub fn post(path: impl Into<String>, body: Option<Value>) -> Self {
        let mut template = Self::new(HttpMethod::Post, path);
        template.body = body;
        template
    }

    /// Adds a query pair.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Sets the header policy.
    #[must_use]
    pub fn with_headers(mut self, policy: HeaderPolicy) -> Self {
        self.headers = policy;
        self
    }

    /// Adds an extra header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    /// Sets a per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Renders the template into a request contract.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] when a placeholder cannot be resolved or the
    /// resulting URL is invalid.
    pub fn render(
        &self,
        base: &Url,
        credentials: &Credentials,
        vars: &Vars,
    ) -> Result<RequestContract, TemplateError> {
        let path = resolve_path_placeholders(&self.path, vars)?;
        let mut query = Vec::with_capacity(self.query.len());
        for (name, value) in &self.query {
            query.push((name.clone(), resolve_placeholders(value, vars)?));
        }
        let url = join_url(base, &path, &query)?;
        let mut headers = credentials.headers(&self.headers);
        for (name, value) in &self.extra_headers {
            headers.insert(name.clone(), resolve_placeholders(value, vars)?);
        }
        Ok(RequestContract {
            method: self.method,
            url,
            headers,
            body: self.body.clone(),
            timeout: self.timeout,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Joins a relative path and query pairs onto the base URL.
///
/// # Errors
///
/// Returns [`TemplateError::InvalidUrl`] when the joined URL does not parse.
pub fn join_url(
    base: &Url,
    path: &str,
    query: &[(String, String)],
) -> Result<Url, TemplateError> {
    let mut joined = base.as_str().trim_end_matches('/').to_string();
    if !path.is_empty() && !path.starts_with('/') {
        joined.push('/');
    }
    joined.push_str(path);
    let mut url = Url::parse(&joined).map_err(|err| TemplateError::InvalidUrl {
        url: joined.clone(),
        message: err.to_string(),
    })?;
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in query {
            pairs.append_pair(name, value);
        }
    }
    Ok(url)
}

/// Substitutes `{name}` placeholders with variable values.
///
/// A lone `}` is copied through unchanged.
///
/// # Errors
///
/// Returns [`TemplateError`] for unterminated placeholders, invalid names,
/// or names that are not present in `vars`.
pub fn resolve_placeholders(template: &str, vars: &Vars) -> Result<String, TemplateError> {
    substitute(template, vars, str::to_string)
}

/// Substitutes `{name}` placeholders in a URL path.
///
/// Values are percent-encoded as single path segments, so `/`, `?`, and `#`
/// inside a value cannot change the request target.
///
/// # Errors
///
/// Same as [`resolve_placeholders`].
pub fn resolve_path_placeholders(template: &str, vars: &Vars) -> Result<String, TemplateError> {
    substitute(template, vars, encode_path_segment)
}

/// Percent-encodes a value for use inside one path segment.
fn encode_path_segment(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect::<String>().replace('+', "%20")
}

/// Placeholder substitution with a value encoder.
fn substitute(
    template: &str,
    vars: &Vars,
    encode: impl Fn(&str) -> String,
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close =
            after.find('}').ok_or_else(|| TemplateError::MalformedPlaceholder(template.into()))?;
        let name = &after[..close];
        if !is_valid_name(name) {
            return Err(TemplateError::MalformedPlaceholder(template.to_string()));
        }
        let value = vars.get(name).ok_or_else(|| TemplateError::UnresolvedPlaceholder {
            name: name.to_string(),
            template: template.to_string(),
        })?;
        out.push_str(&encode(value));
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Returns true for non-empty ASCII alphanumeric/underscore names.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
