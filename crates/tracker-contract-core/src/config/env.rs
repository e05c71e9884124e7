// crates/tracker-contract-core/src/config/env.rs
// ============================================================================
// Module: Harness Environment
// Description: Environment-backed overrides for harness configuration.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Invalid UTF-8 fails closed. Parsing goes through an
//! injectable lookup so callers never have to mutate the process environment.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use super::ConfigError;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys for harness configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessEnv {
    /// Optional path to a TOML configuration file.
    ConfigPath,
    /// Base URL of the tracker API (for example `https://host/v2`).
    BaseUrl,
    /// Authorization token.
    Token,
    /// Organization identifier.
    OrgId,
    /// Request timeout override in seconds (positive integer).
    TimeoutSeconds,
    /// Report root directory override.
    ReportRoot,
    /// Keep fixtures after each scenario (`true`/`false` or `1`/`0`).
    KeepFixtures,
}

impl HarnessEnv {
    /// All recognized environment keys.
    pub const ALL: [Self; 7] = [
        Self::ConfigPath,
        Self::BaseUrl,
        Self::Token,
        Self::OrgId,
        Self::TimeoutSeconds,
        Self::ReportRoot,
        Self::KeepFixtures,
    ];

    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigPath => "TRACKER_CONTRACT_CONFIG",
            Self::BaseUrl => "TRACKER_CONTRACT_BASE_URL",
            Self::Token => "TRACKER_CONTRACT_TOKEN",
            Self::OrgId => "TRACKER_CONTRACT_ORG_ID",
            Self::TimeoutSeconds => "TRACKER_CONTRACT_TIMEOUT_SEC",
            Self::ReportRoot => "TRACKER_CONTRACT_REPORT_ROOT",
            Self::KeepFixtures => "TRACKER_CONTRACT_KEEP_FIXTURES",
        }
    }
}

// ============================================================================
// SECTION: Override Types
// ============================================================================

/// Typed overrides derived from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvOverrides {
    /// Optional configuration file path.
    pub config_path: Option<PathBuf>,
    /// Optional base URL override.
    pub base_url: Option<String>,
    /// Optional token override.
    pub token: Option<String>,
    /// Optional organization identifier override.
    pub org_id: Option<String>,
    /// Optional timeout override.
    pub timeout: Option<Duration>,
    /// Optional report root override.
    pub report_root: Option<PathBuf>,
    /// Optional fixture retention override.
    pub keep_fixtures: Option<bool>,
}

impl EnvOverrides {
    /// Reads overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] when a value is not valid UTF-8, is empty,
    /// or fails validation.
    pub fn from_process() -> Result<Self, ConfigError> {
        Self::from_lookup(read_env_strict)
    }

    /// Reads overrides through the provided lookup function.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] when a value is empty or fails validation.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<Option<String>, ConfigError>,
    {
        let read = |key: HarnessEnv| -> Result<Option<String>, ConfigError> {
            reject_empty(key.as_str(), lookup(key.as_str())?)
        };
        let timeout = read(HarnessEnv::TimeoutSeconds)?
            .map(|value| parse_timeout_seconds(HarnessEnv::TimeoutSeconds.as_str(), &value))
            .transpose()?;
        let keep_fixtures = read(HarnessEnv::KeepFixtures)?
            .map(|value| parse_bool(HarnessEnv::KeepFixtures.as_str(), &value))
            .transpose()?;
        Ok(Self {
            config_path: read(HarnessEnv::ConfigPath)?.map(PathBuf::from),
            base_url: read(HarnessEnv::BaseUrl)?,
            token: read(HarnessEnv::Token)?,
            org_id: read(HarnessEnv::OrgId)?,
            timeout,
            report_root: read(HarnessEnv::ReportRoot)?.map(PathBuf::from),
            keep_fixtures,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, ConfigError> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string()
            .map(Some)
            .map_err(|_| ConfigError::Env(format!("{name} must be valid UTF-8")))
    })
}

/// Rejects values that are set but empty or whitespace.
fn reject_empty(name: &str, value: Option<String>) -> Result<Option<String>, ConfigError> {
    match value {
        Some(value) if value.trim().is_empty() => {
            Err(ConfigError::Env(format!("{name} must not be empty")))
        }
        other => Ok(other),
    }
}

/// Parses a positive timeout value from an environment variable string.
///
/// # Errors
///
/// Returns an error when the value is non-numeric or zero.
fn parse_timeout_seconds(name: &str, raw: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = raw.trim().parse().map_err(|_| {
        ConfigError::Env(format!("{name} must be a positive integer number of seconds"))
    })?;
    if secs == 0 {
        return Err(ConfigError::Env(format!("{name} must be greater than zero")));
    }
    Ok(Duration::from_secs(secs))
}

/// Parses a boolean literal.
///
/// # Errors
///
/// Returns an error when the value is not a recognized boolean literal.
fn parse_bool(name: &str, raw: &str) -> Result<bool, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") || trimmed == "1" {
        return Ok(true);
    }
    if trimmed.eq_ignore_ascii_case("false") || trimmed == "0" {
        return Ok(false);
    }
    Err(ConfigError::Env(format!("{name} must be 1, 0, true, or false")))
}
