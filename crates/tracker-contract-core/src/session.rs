// crates/tracker-contract-core/src/session.rs
// ============================================================================
// Module: Tracker Session
// Description: Configured client, base URL, and credentials for one run.
// Purpose: Bind an injected configuration to the HTTP client wrapper.
// Dependencies: serde_json, url, thiserror
// ============================================================================

//! ## Overview
//! [`TrackerSession`] is built once from a validated [`HarnessConfig`] and
//! passed to fixtures and the runner. It renders templates against the
//! configured base URL and credentials, and exposes the two fixture calls
//! (create and delete) that the harness itself needs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::ConfigError;
use crate::config::HarnessConfig;
use crate::http::ApiClient;
use crate::http::Credentials;
use crate::http::HttpMethod;
use crate::http::HttpResult;
use crate::http::RequestContract;
use crate::http::TransportError;
use crate::template::RequestTemplate;
use crate::template::TemplateError;
use crate::template::Vars;

/// Issue collection path relative to the base URL.
pub const ISSUES_PATH: &str = "/issues";
/// Single-issue path template relative to the base URL.
pub const ISSUE_PATH: &str = "/issues/{id}";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while building a session.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// HTTP client could not be built.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// Connection context shared by fixtures and scenarios.
#[derive(Debug, Clone)]
pub struct TrackerSession {
    /// HTTP client wrapper.
    client: ApiClient,
    /// Parsed service base URL.
    base: Url,
    /// Auth and organization credentials.
    credentials: Credentials,
}

impl TrackerSession {
    /// Builds a session from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when validation fails or the client cannot be
    /// constructed.
    pub fn new(config: &HarnessConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let base = config.base_url()?;
        let client = ApiClient::new(&config.service)?;
        Ok(Self {
            client,
            base,
            credentials: Credentials::from_config(&config.auth),
        })
    }

    /// Returns the service base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// Returns the configured credentials.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns the underlying client.
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Renders a template against this session.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] when rendering fails.
    pub fn render(
        &self,
        template: &RequestTemplate,
        vars: &Vars,
    ) -> Result<RequestContract, TemplateError> {
        template.render(&self.base, &self.credentials, vars)
    }

    /// Sends a rendered request.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on transport failure.
    pub fn send(&self, request: &RequestContract) -> Result<HttpResult, TransportError> {
        self.client.send(request)
    }

    /// Creates an issue with authenticated headers.
    ///
    /// # Errors
    ///
    /// Returns [`SessionCallError`] when rendering or transport fails.
    pub fn create_issue(&self, payload: &Value) -> Result<HttpResult, SessionCallError> {
        let template = RequestTemplate::post(ISSUES_PATH, Some(payload.clone()));
        let request = self.render(&template, &Vars::new())?;
        Ok(self.send(&request)?)
    }

    /// Deletes an issue by identifier with authenticated headers.
    ///
    /// # Errors
    ///
    /// Returns [`SessionCallError`] when rendering or transport fails.
    pub fn delete_issue(&self, id: &str) -> Result<HttpResult, SessionCallError> {
        let mut vars = Vars::new();
        vars.insert("id".to_string(), id.to_string());
        let template = RequestTemplate::new(HttpMethod::Delete, ISSUE_PATH);
        let request = self.render(&template, &vars)?;
        Ok(self.send(&request)?)
    }
}

/// Errors raised by session-level fixture calls.
#[derive(Debug, Error)]
pub enum SessionCallError {
    /// Request could not be rendered.
    #[error(transparent)]
    Template(#[from] TemplateError),
    /// Request could not be delivered.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
