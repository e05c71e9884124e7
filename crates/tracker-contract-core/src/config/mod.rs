// crates/tracker-contract-core/src/config/mod.rs
// ============================================================================
// Module: Harness Configuration
// Description: Typed configuration for the contract-test harness.
// Purpose: Load TOML configuration, apply env overrides, and validate.
// Dependencies: serde, toml, url, thiserror
// ============================================================================

//! ## Overview
//! Configuration is an explicit [`HarnessConfig`] value that is injected into
//! the session and runner at construction. Nothing is read from ambient
//! module-level state after loading, so independent runs can target
//! different environments.
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML
//! file, then `TRACKER_CONTRACT_*` environment overrides.
//!
//! Security posture: the auth token is a secret; [`AuthConfig`] redacts it in
//! `Debug` output.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod env;

// ============================================================================
// SECTION: Tests
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use env::EnvOverrides;
pub use env::HarnessEnv;
pub use env::read_env_strict;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading or validating configuration.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Configuration file is not valid TOML for the schema.
    #[error("invalid config file {origin}: {message}")]
    Parse {
        /// File path or `<inline>` for in-memory sources.
        origin: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Environment override is malformed.
    #[error("{0}")]
    Env(String),
    /// Configuration failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Fixture cleanup policy applied when a scenario ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupPolicy {
    /// Delete provisioned issues at teardown.
    #[default]
    Delete,
    /// Keep provisioned issues for manual inspection.
    Keep,
}

impl CleanupPolicy {
    /// Returns a stable label for the policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Keep => "keep",
        }
    }
}

/// Remote service connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Base URL; endpoints are resolved as `{base_url}/issues...`.
    pub base_url: String,
    /// Default request timeout in milliseconds.
    pub timeout_ms: u64,
    /// User agent for outbound requests.
    pub user_agent: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_ms: 10_000,
            user_agent: concat!("tracker-contract/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ServiceConfig {
    /// Returns the default request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Authentication and organization headers.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Authorization token.
    pub token: String,
    /// Authorization scheme prefix (for example `OAuth`).
    pub scheme: String,
    /// Organization identifier.
    pub org_id: String,
    /// Header carrying the organization identifier.
    pub org_header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            scheme: "OAuth".to_string(),
            org_id: String::new(),
            org_header: "X-Cloud-Org-ID".to_string(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &"<redacted>")
            .field("scheme", &self.scheme)
            .field("org_id", &self.org_id)
            .field("org_header", &self.org_header)
            .finish()
    }
}

/// Fixture provisioning settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixtureConfig {
    /// Queue that fixture and scenario issues are created in.
    pub queue: String,
    /// Cleanup policy applied at scenario teardown.
    pub cleanup: CleanupPolicy,
    /// Well-formed identifier that is known not to exist.
    pub missing_issue_id: String,
    /// Response key holding the created issue identifier.
    pub id_key: String,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            queue: "TESTAEV".to_string(),
            cleanup: CleanupPolicy::Delete,
            missing_issue_id: "6242ed6156158c35daaa5b56".to_string(),
            id_key: "id".to_string(),
        }
    }
}

/// Service-specific messages asserted by negative scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExpectationConfig {
    /// Message reported for an unknown issue.
    pub issue_not_found_message: String,
    /// Message reported for an unavailable organization.
    pub org_unavailable_message: String,
    /// Exact plaintext body of a 401 response.
    pub unauthorized_body: String,
}

impl Default for ExpectationConfig {
    fn default() -> Self {
        Self {
            issue_not_found_message: "Задача не существует.".to_string(),
            org_unavailable_message: "Organization is not available, not ready or not found"
                .to_string(),
            unauthorized_body: "Authorization required".to_string(),
        }
    }
}

/// Report output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Root directory for run reports.
    pub root: PathBuf,
    /// Write reports to disk when true.
    pub enabled: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("target/tracker-contract"),
            enabled: true,
        }
    }
}

/// Complete harness configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Remote service settings.
    pub service: ServiceConfig,
    /// Auth and organization settings.
    pub auth: AuthConfig,
    /// Fixture settings.
    pub fixtures: FixtureConfig,
    /// Expected service messages.
    pub expectations: ExpectationConfig,
    /// Report settings.
    pub report: ReportConfig,
}

impl HarnessConfig {
    /// Loads configuration from an optional file and the process environment.
    ///
    /// When `path` is `None`, `TRACKER_CONTRACT_CONFIG` is consulted; when
    /// neither is set, defaults plus env overrides are used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, an env
    /// override is malformed, or the result fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let overrides = EnvOverrides::from_process()?;
        let file = path.map(Path::to_path_buf).or_else(|| overrides.config_path.clone());
        let base = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        let config = base.with_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML configuration file without validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw, &path.display().to_string())
    }

    /// Parses TOML text without validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text does not match the schema.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Self::parse(raw, "<inline>")
    }

    /// Parses TOML text, labeling errors with `origin`.
    fn parse(raw: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|err| ConfigError::Parse {
            origin: origin.to_string(),
            message: err.to_string(),
        })
    }

    /// Applies environment overrides on top of this configuration.
    #[must_use]
    pub fn with_overrides(mut self, overrides: EnvOverrides) -> Self {
        if let Some(base_url) = overrides.base_url {
            self.service.base_url = base_url;
        }
        if let Some(token) = overrides.token {
            self.auth.token = token;
        }
        if let Some(org_id) = overrides.org_id {
            self.auth.org_id = org_id;
        }
        if let Some(timeout) = overrides.timeout {
            self.service.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        }
        if let Some(root) = overrides.report_root {
            self.report.root = root;
        }
        if let Some(keep) = overrides.keep_fixtures {
            self.fixtures.cleanup = if keep { CleanupPolicy::Keep } else { CleanupPolicy::Delete };
        }
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first failed rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;
        require_nonempty("auth.token", &self.auth.token)?;
        require_nonempty("auth.scheme", &self.auth.scheme)?;
        require_nonempty("auth.org_id", &self.auth.org_id)?;
        require_nonempty("auth.org_header", &self.auth.org_header)?;
        require_nonempty("fixtures.queue", &self.fixtures.queue)?;
        require_nonempty("fixtures.id_key", &self.fixtures.id_key)?;
        require_nonempty("fixtures.missing_issue_id", &self.fixtures.missing_issue_id)?;
        if self.service.timeout_ms == 0 {
            return Err(ConfigError::Invalid("service.timeout_ms must be greater than zero".into()));
        }
        Ok(())
    }

    /// Parses and checks the service base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the URL is missing, malformed,
    /// not http(s), or carries embedded credentials.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let raw = self.service.base_url.trim();
        if raw.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "service.base_url is required (or set {})",
                HarnessEnv::BaseUrl.as_str()
            )));
        }
        let url = Url::parse(raw)
            .map_err(|err| ConfigError::Invalid(format!("service.base_url: {err}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid("service.base_url must be http or https".into()));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(ConfigError::Invalid(
                "service.base_url must not embed credentials".into(),
            ));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(ConfigError::Invalid(
                "service.base_url must not carry a query or fragment".into(),
            ));
        }
        Ok(url)
    }
}

/// Rejects empty or whitespace-only settings.
fn require_nonempty(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{name} must not be empty")));
    }
    Ok(())
}
