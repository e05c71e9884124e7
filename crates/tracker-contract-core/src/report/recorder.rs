// crates/tracker-contract-core/src/report/recorder.rs
// ============================================================================
// Module: Scenario Recorder
// Description: Per-scenario collector of steps, artifacts, and notes.
// Purpose: Publish a record on every exit path, including early drops.
// Dependencies: std
// ============================================================================

//! ## Overview
//! [`ScenarioRecorder`] uses interior mutability so a [`Step`] guard can be
//! open while artifacts are attached. Recorders are single-threaded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use super::Artifact;
use super::ArtifactKind;
use super::ReportSink;
use super::ScenarioRecord;
use super::ScenarioStatus;
use super::Severity;
use super::StepRecord;
use super::now_millis;

// ============================================================================
// SECTION: Recorder
// ============================================================================

/// Mutable recorder state.
#[derive(Debug, Default)]
struct RecorderState {
    /// Instantiation parameters.
    parameters: BTreeMap<String, String>,
    /// Recorded steps.
    steps: Vec<StepRecord>,
    /// Attached artifacts.
    artifacts: Vec<Artifact>,
    /// Notes.
    notes: Vec<String>,
    /// Set once the record has been published.
    finished: bool,
}

/// Collects one scenario's narration and publishes it to a sink.
pub struct ScenarioRecorder {
    /// Destination sink.
    sink: Arc<dyn ReportSink>,
    /// Scenario identifier.
    id: String,
    /// Scenario title.
    title: String,
    /// Severity label.
    severity: Severity,
    /// Feature label.
    feature: String,
    /// Story label.
    story: String,
    /// Start timestamp in epoch milliseconds.
    started_at_ms: u64,
    /// Mutable state.
    state: RefCell<RecorderState>,
}

impl ScenarioRecorder {
    /// Starts recording a scenario.
    #[must_use]
    pub fn new(
        sink: Arc<dyn ReportSink>,
        id: impl Into<String>,
        title: impl Into<String>,
        severity: Severity,
        feature: impl Into<String>,
        story: impl Into<String>,
    ) -> Self {
        Self {
            sink,
            id: id.into(),
            title: title.into(),
            severity,
            feature: feature.into(),
            story: story.into(),
            started_at_ms: now_millis(),
            state: RefCell::new(RecorderState::default()),
        }
    }

    /// Returns the scenario identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Records an instantiation parameter.
    pub fn parameter(&self, name: impl Into<String>, value: impl Into<String>) {
        self.state.borrow_mut().parameters.insert(name.into(), value.into());
    }

    /// Attaches an artifact.
    pub fn attach(&self, name: impl Into<String>, body: impl Into<String>, kind: ArtifactKind) {
        self.state.borrow_mut().artifacts.push(Artifact {
            name: name.into(),
            kind,
            body: body.into(),
        });
    }

    /// Attaches a JSON value, pretty-printed.
    pub fn attach_json(&self, name: impl Into<String>, value: &serde_json::Value) {
        let body = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        self.attach(name, body, ArtifactKind::Json);
    }

    /// Adds a free-form note.
    pub fn note(&self, note: impl Into<String>) {
        self.state.borrow_mut().notes.push(note.into());
    }

    /// Opens a step; the step closes when the guard drops.
    #[must_use = "the step closes when the guard is dropped"]
    pub fn step(&self, description: impl Into<String>) -> Step<'_> {
        let index = {
            let mut state = self.state.borrow_mut();
            state.steps.push(StepRecord {
                description: description.into(),
                status: ScenarioStatus::Broken,
                started_at_ms: now_millis(),
                duration_ms: 0,
            });
            state.steps.len() - 1
        };
        Step {
            recorder: self,
            index,
            status: ScenarioStatus::Passed,
            started: Instant::now(),
        }
    }

    /// Publishes the record with the given outcome and returns it.
    pub fn finish(
        self,
        status: ScenarioStatus,
        failure_kind: Option<String>,
        message: Option<String>,
    ) -> ScenarioRecord {
        let record = self.build(status, failure_kind, message);
        self.sink.publish(&record);
        record
    }

    /// Snapshots state into a record and marks the recorder finished.
    fn build(
        &self,
        status: ScenarioStatus,
        failure_kind: Option<String>,
        message: Option<String>,
    ) -> ScenarioRecord {
        let mut state = self.state.borrow_mut();
        state.finished = true;
        let ended_at_ms = now_millis();
        ScenarioRecord {
            id: self.id.clone(),
            title: self.title.clone(),
            severity: self.severity,
            feature: self.feature.clone(),
            story: self.story.clone(),
            parameters: state.parameters.clone(),
            status,
            failure_kind,
            message,
            steps: state.steps.clone(),
            artifacts: state.artifacts.clone(),
            notes: state.notes.clone(),
            started_at_ms: self.started_at_ms,
            ended_at_ms,
            duration_ms: ended_at_ms.saturating_sub(self.started_at_ms),
        }
    }
}

impl Drop for ScenarioRecorder {
    fn drop(&mut self) {
        if self.state.borrow().finished {
            return;
        }
        let kind = if std::thread::panicking() { "panic" } else { "harness" };
        let record = self.build(
            ScenarioStatus::Broken,
            Some(kind.to_string()),
            Some("scenario terminated without a recorded outcome".to_string()),
        );
        self.sink.publish(&record);
    }
}

// ============================================================================
// SECTION: Step Guard
// ============================================================================

/// Open step; sets its status and duration when dropped.
pub struct Step<'a> {
    /// Owning recorder.
    recorder: &'a ScenarioRecorder,
    /// Index into the recorder's steps.
    index: usize,
    /// Status applied on close.
    status: ScenarioStatus,
    /// Start instant.
    started: Instant,
}

impl Step<'_> {
    /// Marks the step failed.
    pub fn fail(&mut self) {
        self.status = ScenarioStatus::Failed;
    }

    /// Marks the step broken.
    pub fn broken(&mut self) {
        self.status = ScenarioStatus::Broken;
    }
}

impl Drop for Step<'_> {
    fn drop(&mut self) {
        let status =
            if std::thread::panicking() { ScenarioStatus::Broken } else { self.status };
        let mut state = self.recorder.state.borrow_mut();
        if let Some(step) = state.steps.get_mut(self.index) {
            step.status = status;
            step.duration_ms =
                u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        }
    }
}
