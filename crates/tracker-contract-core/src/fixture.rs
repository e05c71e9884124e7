// crates/tracker-contract-core/src/fixture.rs
// ============================================================================
// Module: Fixture Lifecycle
// Description: Provisioning and teardown of issues created by scenarios.
// Purpose: Guarantee scenario preconditions and release them on every path.
// Dependencies: serde, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! A [`FixtureScope`] owns every issue a scenario execution creates, whether
//! provisioned up front ([`FixtureScope::provision`]) or created by the
//! scenario body and adopted afterwards ([`FixtureScope::adopt`]).
//! [`FixtureScope::release`] deletes them in reverse creation order and
//! returns a [`CleanupReport`]; dropping an unreleased scope releases too.
//! Invariants:
//! - Provisioning fails fast: non-2xx, non-JSON, or a missing id key is an error.
//! - Cleanup failures are reported, never raised.
//! - With [`CleanupPolicy::Keep`] nothing is deleted and ids are reported as kept.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::config::CleanupPolicy;
use crate::session::SessionCallError;
use crate::session::TrackerSession;
use crate::template::Vars;

/// Maximum number of body characters kept in fixture errors.
const ERROR_BODY_CHARS: usize = 256;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while provisioning fixtures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// Creation request could not be rendered or delivered.
    #[error("fixture request failed: {0}")]
    Request(#[from] SessionCallError),
    /// Creation returned a non-2xx status.
    #[error("fixture creation returned status {status}: {body}")]
    Status {
        /// Actual status.
        status: u16,
        /// Body excerpt.
        body: String,
    },
    /// Creation returned a body that is not JSON.
    #[error("fixture creation returned invalid JSON: {message}")]
    NotJson {
        /// Parser diagnostic.
        message: String,
    },
    /// Creation response lacks the identifier key.
    #[error("fixture creation response has no `{key}` field")]
    MissingKey {
        /// Missing key.
        key: String,
    },
}

// ============================================================================
// SECTION: Specs and Handles
// ============================================================================

/// Declarative fixture: a creation payload bound to a variable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureSpec {
    /// Variable receiving the created identifier.
    pub var: String,
    /// Creation payload.
    pub payload: Value,
}

impl FixtureSpec {
    /// Builds an issue fixture in `queue`.
    #[must_use]
    pub fn issue(
        var: impl Into<String>,
        queue: &str,
        summary: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            var: var.into(),
            payload: json!({
                "queue": queue,
                "summary": summary.into(),
                "description": description.into(),
            }),
        }
    }
}

/// Issue owned by a fixture scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueHandle {
    /// Variable name the id is exposed as.
    pub var: String,
    /// Issue identifier.
    pub id: String,
    /// Issue key, when the service returned one.
    pub key: Option<String>,
}

impl IssueHandle {
    /// Adds the handle's variables: `{var}` and, when known, `{var}_key`.
    pub fn export(&self, vars: &mut Vars) {
        vars.insert(self.var.clone(), self.id.clone());
        if let Some(key) = &self.key {
            vars.insert(format!("{}_key", self.var), key.clone());
        }
    }
}

/// Cleanup failure for one issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupFailure {
    /// Issue identifier.
    pub id: String,
    /// Failure description.
    pub reason: String,
}

/// Outcome of releasing a fixture scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Identifiers deleted successfully.
    pub released: Vec<String>,
    /// Identifiers retained by policy.
    pub kept: Vec<String>,
    /// Identifiers that could not be deleted.
    pub failed: Vec<CleanupFailure>,
}

impl CleanupReport {
    /// Returns the number of leaked issues.
    #[must_use]
    pub const fn leaked(&self) -> usize {
        self.failed.len()
    }

    /// Returns true when nothing was touched.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.released.is_empty() && self.kept.is_empty() && self.failed.is_empty()
    }

    /// Renders a one-line summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut line = format!(
            "released {}, kept {}, failed {}",
            self.released.len(),
            self.kept.len(),
            self.failed.len()
        );
        for failure in &self.failed {
            line.push_str(&format!("; {}: {}", failure.id, failure.reason));
        }
        line
    }
}

// ============================================================================
// SECTION: Provisioning
// ============================================================================

/// Creates one issue and extracts its identifier.
///
/// # Errors
///
/// Returns [`FixtureError`] on transport failure, non-2xx status, non-JSON
/// body, or a missing identifier key.
pub fn provision(
    session: &TrackerSession,
    spec: &FixtureSpec,
    id_key: &str,
) -> Result<IssueHandle, FixtureError> {
    let response = session.create_issue(&spec.payload)?;
    if !response.is_success() {
        return Err(FixtureError::Status {
            status: response.status,
            body: response.text.chars().take(ERROR_BODY_CHARS).collect(),
        });
    }
    let body = response.json().map_err(|err| FixtureError::NotJson {
        message: err.to_string(),
    })?;
    let id = body.get(id_key).and_then(scalar_text).ok_or_else(|| FixtureError::MissingKey {
        key: id_key.to_string(),
    })?;
    let key = body.get("key").and_then(scalar_text);
    tracing::debug!(var = %spec.var, id = %id, "fixture issue provisioned");
    Ok(IssueHandle {
        var: spec.var.clone(),
        id,
        key,
    })
}

/// Returns strings and numbers as text.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

// ============================================================================
// SECTION: Scope
// ============================================================================

/// Owner of all issues created during one scenario execution.
#[derive(Debug)]
pub struct FixtureScope<'a> {
    /// Session used for provisioning and teardown.
    session: &'a TrackerSession,
    /// Cleanup policy.
    policy: CleanupPolicy,
    /// Response key holding created identifiers.
    id_key: String,
    /// Owned issues in creation order.
    handles: Vec<IssueHandle>,
}

impl<'a> FixtureScope<'a> {
    /// Creates an empty scope.
    #[must_use]
    pub fn new(
        session: &'a TrackerSession,
        policy: CleanupPolicy,
        id_key: impl Into<String>,
    ) -> Self {
        Self {
            session,
            policy,
            id_key: id_key.into(),
            handles: Vec::new(),
        }
    }

    /// Returns the owned handles in creation order.
    #[must_use]
    pub fn handles(&self) -> &[IssueHandle] {
        &self.handles
    }

    /// Returns the variables exported by every owned handle.
    #[must_use]
    pub fn vars(&self) -> Vars {
        let mut vars = Vars::new();
        for handle in &self.handles {
            handle.export(&mut vars);
        }
        vars
    }

    /// Provisions a fixture and takes ownership of it.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when provisioning fails; nothing is registered.
    pub fn provision(&mut self, spec: &FixtureSpec) -> Result<&IssueHandle, FixtureError> {
        let handle = provision(self.session, spec, &self.id_key)?;
        self.handles.push(handle);
        Ok(&self.handles[self.handles.len() - 1])
    }

    /// Takes ownership of an issue created outside the scope.
    pub fn adopt(&mut self, var: impl Into<String>, id: impl Into<String>) {
        let id = id.into();
        if self.handles.iter().any(|handle| handle.id == id) {
            return;
        }
        self.handles.push(IssueHandle {
            var: var.into(),
            id,
            key: None,
        });
    }

    /// Releases every owned issue in reverse creation order.
    pub fn release(&mut self) -> CleanupReport {
        let mut report = CleanupReport::default();
        while let Some(handle) = self.handles.pop() {
            match self.policy {
                CleanupPolicy::Keep => {
                    tracing::info!(id = %handle.id, "fixture issue kept by policy");
                    report.kept.push(handle.id);
                }
                CleanupPolicy::Delete => match self.session.delete_issue(&handle.id) {
                    Ok(response) if response.is_success() => report.released.push(handle.id),
                    Ok(response) => {
                        let reason = format!("delete returned status {}", response.status);
                        tracing::warn!(
                            id = %handle.id,
                            status = response.status,
                            "fixture cleanup failed"
                        );
                        report.failed.push(CleanupFailure {
                            id: handle.id,
                            reason,
                        });
                    }
                    Err(err) => {
                        tracing::warn!(id = %handle.id, error = %err, "fixture cleanup failed");
                        report.failed.push(CleanupFailure {
                            id: handle.id,
                            reason: err.to_string(),
                        });
                    }
                },
            }
        }
        report
    }
}

impl Drop for FixtureScope<'_> {
    fn drop(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        let report = self.release();
        tracing::warn!(summary = %report.summary(), "fixture scope dropped before release");
    }
}
