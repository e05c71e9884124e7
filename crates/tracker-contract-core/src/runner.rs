// crates/tracker-contract-core/src/runner.rs
// ============================================================================
// Module: Scenario Runner
// Description: Sequential execution of scenario templates.
// Purpose: Drive fixtures, requests, artifacts, and contract evaluation.
// Dependencies: thiserror, tracing
// ============================================================================

//! ## Overview
//! [`ScenarioRunner`] executes one scenario at a time:
//! instantiate, provision fixtures, then for each exchange render the
//! request, send it, attach request/response artifacts, apply cleanup
//! captures, evaluate the expectation, and apply the remaining captures.
//! Fixtures are released on every path before the record is published.
//! Invariants:
//! - Setup failures are reported as [`BrokenCause::Setup`], never as
//!   contract failures, and the action under test is not attempted.
//! - The first failing exchange ends the scenario.
//! - Cleanup results never change a scenario's outcome.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::config::HarnessConfig;
use crate::contract::ContractMismatch;
use crate::contract::select_path;
use crate::datagen::TextGenerator;
use crate::fixture::CleanupReport;
use crate::fixture::FixtureScope;
use crate::fixture::scalar_text;
use crate::http::HttpResult;
use crate::report::ArtifactKind;
use crate::report::ReportSink;
use crate::report::ScenarioRecord;
use crate::report::ScenarioRecorder;
use crate::report::ScenarioStatus;
use crate::report::SuiteSummary;
use crate::scenario::Capture;
use crate::scenario::Exchange;
use crate::scenario::ScenarioBody;
use crate::scenario::ScenarioInputs;
use crate::scenario::ScenarioTemplate;
use crate::session::SessionError;
use crate::session::TrackerSession;
use crate::template::TemplateError;
use crate::template::Vars;

// ============================================================================
// SECTION: Errors and Outcomes
// ============================================================================

/// Harness-side failures that prevent evaluating a scenario.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    /// Request template could not be rendered.
    #[error(transparent)]
    Template(#[from] TemplateError),
    /// A required capture found no value.
    #[error("capture `{path}` into `{var}` failed: {message}")]
    Capture {
        /// Response field.
        path: String,
        /// Target variable.
        var: String,
        /// Failure description.
        message: String,
    },
}

/// Reason a scenario could not be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokenCause {
    /// Fixture provisioning failed before the action under test.
    Setup,
    /// The request could not be delivered.
    Transport,
    /// Rendering or capture failed.
    Harness,
}

impl BrokenCause {
    /// Returns a stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Transport => "transport",
            Self::Harness => "harness",
        }
    }
}

impl fmt::Display for BrokenCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one scenario execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioOutcome {
    /// Every expectation held.
    Passed,
    /// The response violated its contract.
    Failed(ContractMismatch),
    /// The scenario could not be evaluated.
    Broken {
        /// Failure category.
        cause: BrokenCause,
        /// Failure description.
        message: String,
    },
}

impl ScenarioOutcome {
    /// Builds a broken outcome.
    fn broken(cause: BrokenCause, message: impl fmt::Display) -> Self {
        Self::Broken {
            cause,
            message: message.to_string(),
        }
    }

    /// Returns the report status.
    #[must_use]
    pub const fn status(&self) -> ScenarioStatus {
        match self {
            Self::Passed => ScenarioStatus::Passed,
            Self::Failed(_) => ScenarioStatus::Failed,
            Self::Broken {
                ..
            } => ScenarioStatus::Broken,
        }
    }

    /// Returns the failure category label, if any.
    #[must_use]
    pub const fn failure_kind(&self) -> Option<&'static str> {
        match self {
            Self::Passed => None,
            Self::Failed(_) => Some("contract"),
            Self::Broken {
                cause, ..
            } => Some(cause.as_str()),
        }
    }

    /// Returns the failure message, if any.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Passed => None,
            Self::Failed(mismatch) => Some(mismatch.to_string()),
            Self::Broken {
                message, ..
            } => Some(message.clone()),
        }
    }
}

/// Result of one scenario execution.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Outcome.
    pub outcome: ScenarioOutcome,
    /// Fixture cleanup report.
    pub cleanup: CleanupReport,
    /// Published record.
    pub record: ScenarioRecord,
}

/// Suite run options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Only run scenarios whose id contains this substring.
    pub filter: Option<String>,
    /// Seed for generated data; entropy when unset.
    pub seed: Option<u64>,
}

impl RunOptions {
    /// Returns true when the scenario id passes the filter.
    #[must_use]
    pub fn matches(&self, id: &str) -> bool {
        self.filter.as_deref().is_none_or(|filter| id.contains(filter))
    }
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Executes scenario templates against a tracker session.
pub struct ScenarioRunner {
    /// Connection context.
    session: TrackerSession,
    /// Harness configuration.
    config: HarnessConfig,
    /// Report destination.
    sink: Arc<dyn ReportSink>,
}

impl ScenarioRunner {
    /// Builds a runner and its session from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the session cannot be built.
    pub fn new(config: HarnessConfig, sink: Arc<dyn ReportSink>) -> Result<Self, SessionError> {
        let session = TrackerSession::new(&config)?;
        Ok(Self {
            session,
            config,
            sink,
        })
    }

    /// Returns the session.
    #[must_use]
    pub const fn session(&self) -> &TrackerSession {
        &self.session
    }

    /// Runs every template passing the filter and publishes the suite summary.
    pub fn run_all(&self, templates: &[ScenarioTemplate], options: &RunOptions) -> SuiteSummary {
        let mut text = options.seed.map_or_else(TextGenerator::new, TextGenerator::seeded);
        let mut summary = SuiteSummary::default();
        for template in templates.iter().filter(|template| options.matches(template.id())) {
            let result = self.run_one(template, &mut text);
            summary.record(&result.record, result.cleanup.leaked());
        }
        self.sink.publish_suite(&summary);
        tracing::info!(
            total = summary.total(),
            passed = summary.passed,
            failed = summary.failed,
            broken = summary.broken,
            leaked = summary.leaked,
            "contract suite finished"
        );
        summary
    }

    /// Runs a single scenario.
    pub fn run_one(&self, template: &ScenarioTemplate, text: &mut TextGenerator) -> ScenarioResult {
        let meta = &template.meta;
        let body = template.instantiate(&mut ScenarioInputs {
            config: &self.config,
            text,
        });
        let recorder = ScenarioRecorder::new(
            Arc::clone(&self.sink),
            &meta.id,
            &meta.title,
            meta.severity,
            &meta.feature,
            &meta.story,
        );
        for (name, value) in &body.parameters {
            recorder.parameter(name, value);
        }

        let policy = self.config.fixtures.cleanup;
        let mut scope = FixtureScope::new(&self.session, policy, &self.config.fixtures.id_key);
        let outcome = self.execute(&body, &recorder, &mut scope);
        let cleanup = if scope.handles().is_empty() {
            scope.release()
        } else {
            let mut step = recorder.step("Release fixtures");
            let cleanup = scope.release();
            if cleanup.leaked() > 0 {
                step.broken();
            }
            cleanup
        };
        if !cleanup.is_empty() {
            recorder.note(format!("cleanup ({}): {}", policy.as_str(), cleanup.summary()));
        }

        let record = recorder.finish(
            outcome.status(),
            outcome.failure_kind().map(str::to_string),
            outcome.message(),
        );
        match &outcome {
            ScenarioOutcome::Passed => {
                tracing::info!(scenario = %record.id, "scenario passed");
            }
            other => tracing::info!(
                scenario = %record.id,
                status = other.status().as_str(),
                kind = other.failure_kind().unwrap_or_default(),
                "scenario did not pass"
            ),
        }
        ScenarioResult {
            outcome,
            cleanup,
            record,
        }
    }

    /// Provisions fixtures and performs every exchange.
    fn execute(
        &self,
        body: &ScenarioBody,
        recorder: &ScenarioRecorder,
        scope: &mut FixtureScope<'_>,
    ) -> ScenarioOutcome {
        if !body.fixtures.is_empty() {
            let mut step = recorder.step("Provision fixtures");
            for spec in &body.fixtures {
                recorder.attach_json(format!("Fixture {} payload", spec.var), &spec.payload);
                if let Err(err) = scope.provision(spec) {
                    step.broken();
                    return ScenarioOutcome::broken(BrokenCause::Setup, err);
                }
            }
        }

        let mut vars = scope.vars();
        for exchange in &body.exchanges {
            if let Some(outcome) = self.perform(exchange, recorder, scope, &mut vars) {
                return outcome;
            }
        }
        ScenarioOutcome::Passed
    }

    /// Performs one exchange; returns an outcome when the scenario must stop.
    fn perform(
        &self,
        exchange: &Exchange,
        recorder: &ScenarioRecorder,
        scope: &mut FixtureScope<'_>,
        vars: &mut Vars,
    ) -> Option<ScenarioOutcome> {
        let mut step = recorder.step(&exchange.description);
        let request = match self.session.render(&exchange.request, vars) {
            Ok(request) => request,
            Err(err) => {
                step.broken();
                let err = HarnessError::from(err);
                return Some(ScenarioOutcome::broken(BrokenCause::Harness, err));
            }
        };
        recorder.attach("Request", request.describe(), ArtifactKind::Text);
        if let Some(payload) = &request.body {
            recorder.attach_json("Request payload", payload);
        }

        let response = match self.session.send(&request) {
            Ok(response) => response,
            Err(err) => {
                step.broken();
                return Some(ScenarioOutcome::broken(BrokenCause::Transport, err));
            }
        };
        let document = response.json().ok();
        let kind = if document.is_some() { ArtifactKind::Json } else { ArtifactKind::Text };
        recorder.attach(format!("Response {}", response.status), response.text.clone(), kind);

        for capture in exchange.captures.iter().filter(|capture| capture.cleanup) {
            if let Ok(Some(id)) = capture_value(document.as_ref(), capture) {
                scope.adopt(&capture.var, id);
            }
        }

        if let Err(mismatch) = exchange.expect.evaluate(&response, vars) {
            step.fail();
            recorder.attach("Contract mismatch", mismatch.to_string(), ArtifactKind::Text);
            return Some(ScenarioOutcome::Failed(mismatch));
        }

        match apply_captures(&exchange.captures, document.as_ref(), &response, vars) {
            Ok(()) => None,
            Err(err) => {
                step.broken();
                Some(ScenarioOutcome::broken(BrokenCause::Harness, err))
            }
        }
    }
}

impl fmt::Debug for ScenarioRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioRunner")
            .field("session", &self.session)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Captures
// ============================================================================

/// Stores captured values into `vars`.
fn apply_captures(
    captures: &[Capture],
    document: Option<&Value>,
    response: &HttpResult,
    vars: &mut Vars,
) -> Result<(), HarnessError> {
    for capture in captures {
        match capture_value(document, capture)? {
            Some(value) => {
                vars.insert(capture.var.clone(), value);
            }
            None if capture.required => {
                return Err(HarnessError::Capture {
                    path: capture.path.clone(),
                    var: capture.var.clone(),
                    message: format!("no scalar value in response (status {})", response.status),
                });
            }
            None => {}
        }
    }
    Ok(())
}

/// Extracts the first scalar value at the capture path.
fn capture_value(
    document: Option<&Value>,
    capture: &Capture,
) -> Result<Option<String>, HarnessError> {
    let Some(document) = document else {
        return Ok(None);
    };
    let selected =
        select_path(document, &capture.path).map_err(|mismatch| HarnessError::Capture {
            path: capture.path.clone(),
            var: capture.var.clone(),
            message: mismatch.to_string(),
        })?;
    Ok(selected.first().copied().and_then(scalar_text))
}
