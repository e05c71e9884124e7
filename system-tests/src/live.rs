// system-tests/src/live.rs
// ============================================================================
// Module: Live Target
// Description: Discovery of a configured tracker and single-scenario runs.
// Purpose: Let system tests skip cleanly or run real scenarios by id.
// Dependencies: tracker-contract-core
// ============================================================================

//! ## Overview
//! [`LiveTarget::discover`] decides whether a real service is configured.
//! [`LiveTarget::run`] executes one catalog scenario by exact id with a
//! directory report when reporting is enabled. Runs hold [`exclusive`] so
//! scenarios from parallel test threads execute one at a time.
//! Leaked fixtures are reported through [`cleanup_warning`] and never fail a
//! scenario.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use tracker_contract_core::CleanupReport;
use tracker_contract_core::DirectorySink;
use tracker_contract_core::HarnessConfig;
use tracker_contract_core::MemorySink;
use tracker_contract_core::ReportSink;
use tracker_contract_core::ScenarioResult;
use tracker_contract_core::ScenarioRunner;
use tracker_contract_core::TextGenerator;
use tracker_contract_core::config::HarnessEnv;
use tracker_contract_core::config::read_env_strict;
use tracker_contract_core::issue_catalog;

// ============================================================================
// SECTION: Serialization
// ============================================================================

/// Lock shared by every live run in the process.
static RUN_LOCK: Mutex<()> = Mutex::new(());

/// Acquires the process-wide live run lock.
///
/// A panic in a previous holder does not poison later runs.
pub fn exclusive() -> MutexGuard<'static, ()> {
    RUN_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// SECTION: Target
// ============================================================================

/// Live service selected by the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveTarget {
    /// No service configured; the reason is reported by the test.
    Skipped(String),
    /// Validated configuration for a live service.
    Ready(HarnessConfig),
}

impl LiveTarget {
    /// Reads the environment and loads configuration when a target is set.
    ///
    /// # Errors
    ///
    /// Returns a message when configuration is present but invalid.
    pub fn discover() -> Result<Self, String> {
        let configured = [HarnessEnv::BaseUrl, HarnessEnv::ConfigPath]
            .into_iter()
            .map(|key| read_env_strict(key.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| err.to_string())?
            .into_iter()
            .any(|value| value.is_some());
        if !configured {
            return Ok(Self::Skipped(format!(
                "set {} or {} to run live system tests",
                HarnessEnv::BaseUrl.as_str(),
                HarnessEnv::ConfigPath.as_str()
            )));
        }
        HarnessConfig::load(None).map(Self::Ready).map_err(|err| err.to_string())
    }

    /// Runs the catalog scenario with the given id.
    ///
    /// Returns `Ok(None)` when the target is skipped.
    ///
    /// # Errors
    ///
    /// Returns a message when the id is unknown or the session cannot be built.
    pub fn run(&self, id: &str) -> Result<Option<ScenarioResult>, String> {
        let Self::Ready(config) = self else {
            return Ok(None);
        };
        let catalog = issue_catalog();
        let template = catalog
            .iter()
            .find(|template| template.id() == id)
            .ok_or_else(|| format!("unknown scenario `{id}`"))?;
        let _guard = exclusive();
        let runner = ScenarioRunner::new(config.clone(), sink_for(config)?)
            .map_err(|err| err.to_string())?;
        Ok(Some(runner.run_one(template, &mut TextGenerator::new())))
    }
}

/// Describes leaked issues for a scenario, if any.
#[must_use]
pub fn cleanup_warning(id: &str, cleanup: &CleanupReport) -> Option<String> {
    (cleanup.leaked() > 0).then(|| format!("{id} leaked issues: {}", cleanup.summary()))
}

/// Selects the report sink for live runs.
fn sink_for(config: &HarnessConfig) -> Result<Arc<dyn ReportSink>, String> {
    if !config.report.enabled {
        return Ok(Arc::new(MemorySink::new()));
    }
    let root = config.report.root.join("system-tests");
    let sink = DirectorySink::new(&root)
        .map_err(|err| format!("cannot create report directory {}: {err}", root.display()))?;
    Ok(Arc::new(sink))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[path = "live_tests.rs"]
mod tests;
