// crates/tracker-contract-core/src/report/mod.rs
// ============================================================================
// Module: Scenario Reporting
// Description: Scenario records, suite summaries, and report sinks.
// Purpose: Capture artifacts and step narration independent of outcomes.
// Dependencies: serde, serde_jcs, tracing
// ============================================================================

//! ## Overview
//! Reporting is purely additive. A [`ScenarioRecorder`] collects steps,
//! artifacts, parameters, and notes while a scenario runs, then publishes a
//! [`ScenarioRecord`] to a [`ReportSink`]. After all scenarios run, the
//! runner publishes a [`SuiteSummary`].
//! Invariants:
//! - Artifacts are append-only and never mutated after attachment.
//! - Sink failures are logged and never change a scenario outcome.
//! - A recorder dropped without an explicit outcome publishes as broken.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod recorder;
mod sink;


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use recorder::ScenarioRecorder;
pub use recorder::Step;
pub use sink::DirectorySink;
pub use sink::MemorySink;
pub use sink::ReportSink;

// ============================================================================
// SECTION: Labels
// ============================================================================

/// Scenario severity label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Blocks the core workflow.
    Blocker,
    /// Breaks a primary contract.
    Critical,
    /// Regular contract.
    Normal,
    /// Secondary contract.
    Minor,
    /// Cosmetic.
    Trivial,
}

impl Severity {
    /// Returns a stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blocker => "blocker",
            Self::Critical => "critical",
            Self::Normal => "normal",
            Self::Minor => "minor",
            Self::Trivial => "trivial",
        }
    }
}

/// Artifact content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Plain text.
    Text,
    /// JSON document.
    Json,
}

impl ArtifactKind {
    /// Returns the file extension for the kind.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Json => "json",
        }
    }
}

/// Named artifact attached to a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Display name.
    pub name: String,
    /// Content type.
    pub kind: ArtifactKind,
    /// Raw content.
    pub body: String,
}

/// Status of a step or scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    /// All expectations held.
    Passed,
    /// An expectation did not hold.
    Failed,
    /// The scenario could not be evaluated.
    Broken,
}

impl ScenarioStatus {
    /// Returns a stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Broken => "broken",
        }
    }
}

/// Recorded step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    /// Step narration.
    pub description: String,
    /// Step status.
    pub status: ScenarioStatus,
    /// Step start, in milliseconds since the Unix epoch.
    pub started_at_ms: u64,
    /// Step duration in milliseconds.
    pub duration_ms: u64,
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Finished scenario record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioRecord {
    /// Scenario identifier, including the variant suffix.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Severity label.
    pub severity: Severity,
    /// Feature label.
    pub feature: String,
    /// Story label.
    pub story: String,
    /// Instantiation parameters (for example generated payload values).
    pub parameters: BTreeMap<String, String>,
    /// Final status.
    pub status: ScenarioStatus,
    /// Failure category for non-passing scenarios.
    pub failure_kind: Option<String>,
    /// Failure message for non-passing scenarios.
    pub message: Option<String>,
    /// Steps in execution order.
    pub steps: Vec<StepRecord>,
    /// Artifacts in attachment order.
    pub artifacts: Vec<Artifact>,
    /// Free-form notes (cleanup results, warnings).
    pub notes: Vec<String>,
    /// Start, in milliseconds since the Unix epoch.
    pub started_at_ms: u64,
    /// End, in milliseconds since the Unix epoch.
    pub ended_at_ms: u64,
    /// Duration in milliseconds.
    pub duration_ms: u64,
}

/// One line of the suite summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteEntry {
    /// Scenario identifier.
    pub id: String,
    /// Severity label.
    pub severity: Severity,
    /// Final status.
    pub status: ScenarioStatus,
    /// Failure category, if any.
    pub failure_kind: Option<String>,
    /// Failure message, if any.
    pub message: Option<String>,
    /// Issues that could not be cleaned up.
    pub leaked: usize,
}

/// Aggregate result of a suite run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SuiteSummary {
    /// Per-scenario entries in run order.
    pub entries: Vec<SuiteEntry>,
    /// Passed count.
    pub passed: usize,
    /// Failed count.
    pub failed: usize,
    /// Broken count.
    pub broken: usize,
    /// Total leaked fixture issues.
    pub leaked: usize,
}

impl SuiteSummary {
    /// Adds a finished scenario.
    pub fn record(&mut self, record: &ScenarioRecord, leaked: usize) {
        match record.status {
            ScenarioStatus::Passed => self.passed += 1,
            ScenarioStatus::Failed => self.failed += 1,
            ScenarioStatus::Broken => self.broken += 1,
        }
        self.leaked += leaked;
        self.entries.push(SuiteEntry {
            id: record.id.clone(),
            severity: record.severity,
            status: record.status,
            failure_kind: record.failure_kind.clone(),
            message: record.message.clone(),
            leaked,
        });
    }

    /// Returns the number of scenarios.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when every scenario passed.
    ///
    /// Leaked fixtures do not affect success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed == 0 && self.broken == 0
    }

    /// Returns the process exit code for the suite: 0 on success, 1 otherwise.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }

    /// Renders the summary as markdown.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Contract Suite Summary\n\n");
        out.push_str(&format!(
            "- Total: {}\n- Passed: {}\n- Failed: {}\n- Broken: {}\n- Leaked fixtures: {}\n",
            self.total(),
            self.passed,
            self.failed,
            self.broken,
            self.leaked
        ));
        out.push_str("\n## Scenarios\n\n");
        if self.entries.is_empty() {
            out.push_str("- None\n");
        }
        for entry in &self.entries {
            out.push_str(&format!(
                "- {} [{}]: {}",
                entry.id,
                entry.severity.as_str(),
                entry.status.as_str()
            ));
            if let Some(kind) = &entry.failure_kind {
                out.push_str(&format!(" ({kind})"));
            }
            out.push('\n');
        }
        out
    }
}

/// Returns the current time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Renders a scenario record as markdown.
pub(crate) fn record_markdown(record: &ScenarioRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", record.title));
    out.push_str("## Status\n\n");
    out.push_str(&format!("- Scenario: {}\n", record.id));
    out.push_str(&format!("- Severity: {}\n", record.severity.as_str()));
    out.push_str(&format!("- Feature: {} / {}\n", record.feature, record.story));
    out.push_str(&format!("- Status: {}\n", record.status.as_str()));
    if let Some(kind) = &record.failure_kind {
        out.push_str(&format!("- Failure: {kind}\n"));
    }
    out.push_str(&format!("- Duration (ms): {}\n", record.duration_ms));
    if let Some(message) = &record.message {
        out.push_str(&format!("\n## Message\n\n```\n{message}\n```\n"));
    }
    out.push_str("\n## Steps\n\n");
    if record.steps.is_empty() {
        out.push_str("- None\n");
    }
    for step in &record.steps {
        out.push_str(&format!("- [{}] {}\n", step.status.as_str(), step.description));
    }
    push_list(&mut out, "Parameters", record.parameters.iter().map(|(k, v)| format!("{k}: {v}")));
    push_list(&mut out, "Notes", record.notes.iter().cloned());
    push_list(&mut out, "Artifacts", record.artifacts.iter().map(|artifact| artifact.name.clone()));
    out
}

/// Appends a markdown bullet list section.
fn push_list(out: &mut String, title: &str, items: impl Iterator<Item = String>) {
    out.push_str(&format!("\n## {title}\n\n"));
    let mut empty = true;
    for item in items {
        empty = false;
        out.push_str(&format!("- {item}\n"));
    }
    if empty {
        out.push_str("- None\n");
    }
}
