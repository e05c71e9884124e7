// crates/tracker-contract-core/src/report/sink.rs
// ============================================================================
// Module: Report Sinks
// Description: Destinations for scenario records and suite summaries.
// Purpose: Persist reports to disk or keep them in memory.
// Dependencies: serde, serde_jcs, tracing
// ============================================================================

//! ## Overview
//! [`ReportSink`] receives finished records. [`DirectorySink`] writes a
//! deterministic tree per run:
//!
//! ```text
//! {root}/run_{millis}/
//!   suite.json, suite.md
//!   {scenario_id}/record.json, summary.md, 01-Request.txt, 02-Response_200.json, ...
//! ```
//!
//! JSON files use canonical JCS serialization. Write failures are logged with
//! `tracing::warn!` and otherwise ignored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::PoisonError;

use serde::Serialize;

use super::ScenarioRecord;
use super::SuiteSummary;
use super::now_millis;
use super::record_markdown;

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Receives finished scenario records and the suite summary.
pub trait ReportSink: Send + Sync {
    /// Publishes a finished scenario record.
    fn publish(&self, record: &ScenarioRecord);

    /// Publishes the suite summary after all scenarios ran.
    fn publish_suite(&self, summary: &SuiteSummary);
}

// ============================================================================
// SECTION: Directory Sink
// ============================================================================

/// Writes records to a per-run directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    /// Run directory (`{root}/run_{millis}`).
    run_root: PathBuf,
}

impl DirectorySink {
    /// Creates `{root}/run_{millis}`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the run directory cannot be created.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let run_root = root.as_ref().join(format!("run_{}", now_millis()));
        fs::create_dir_all(&run_root)?;
        Ok(Self {
            run_root,
        })
    }

    /// Returns the run directory.
    #[must_use]
    pub fn run_root(&self) -> &Path {
        &self.run_root
    }

    /// Returns the directory for a scenario.
    #[must_use]
    pub fn scenario_dir(&self, id: &str) -> PathBuf {
        self.run_root.join(sanitize(id))
    }

    /// Writes every file for one record.
    fn write_record(&self, record: &ScenarioRecord) -> io::Result<()> {
        let dir = self.scenario_dir(&record.id);
        fs::create_dir_all(&dir)?;
        write_json(&dir.join("record.json"), record)?;
        fs::write(dir.join("summary.md"), record_markdown(record))?;
        for (index, artifact) in record.artifacts.iter().enumerate() {
            let name =
                format!("{:02}-{}.{}", index + 1, sanitize(&artifact.name), artifact.kind.extension());
            fs::write(dir.join(name), artifact.body.as_bytes())?;
        }
        Ok(())
    }

    /// Writes the suite files.
    fn write_suite(&self, summary: &SuiteSummary) -> io::Result<()> {
        write_json(&self.run_root.join("suite.json"), summary)?;
        fs::write(self.run_root.join("suite.md"), summary.to_markdown())
    }
}

impl ReportSink for DirectorySink {
    fn publish(&self, record: &ScenarioRecord) {
        if let Err(err) = self.write_record(record) {
            tracing::warn!(scenario = %record.id, error = %err, "failed to write scenario report");
        }
    }

    fn publish_suite(&self, summary: &SuiteSummary) {
        if let Err(err) = self.write_suite(summary) {
            tracing::warn!(error = %err, "failed to write suite report");
        }
    }
}

/// Writes a JSON file using canonical JCS serialization.
fn write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let bytes = serde_jcs::to_vec(value).map_err(|err| io::Error::other(err.to_string()))?;
    fs::write(path, bytes)
}

/// Maps a name onto a safe single path component.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') { ch } else { '_' })
        .collect();
    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() { "unnamed".to_string() } else { trimmed.to_string() }
}

// ============================================================================
// SECTION: Memory Sink
// ============================================================================

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Published records in order.
    records: Mutex<Vec<ScenarioRecord>>,
    /// Published suite summary.
    suite: Mutex<Option<SuiteSummary>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all published records.
    #[must_use]
    pub fn records(&self) -> Vec<ScenarioRecord> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Returns the published suite summary, if any.
    #[must_use]
    pub fn suite(&self) -> Option<SuiteSummary> {
        self.suite.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ReportSink for MemorySink {
    fn publish(&self, record: &ScenarioRecord) {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).push(record.clone());
    }

    fn publish_suite(&self, summary: &SuiteSummary) {
        *self.suite.lock().unwrap_or_else(PoisonError::into_inner) = Some(summary.clone());
    }
}
