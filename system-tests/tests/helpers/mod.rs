// system-tests/tests/helpers/mod.rs
// ============================================================================
// Module: System Test Helpers
// Description: Shared helpers for live issue API system tests.
// Purpose: Resolve the live target and assert scenario outcomes.
// Dependencies: system-tests, tracker-contract-core
// ============================================================================

//! ## Overview
//! Shared helpers for live issue API system tests.

#![allow(
    dead_code,
    clippy::print_stderr,
    reason = "Shared helpers are reused across suites; skips and leaks are reported on stderr."
)]

use std::sync::OnceLock;

use system_tests::live::LiveTarget;
use system_tests::live::cleanup_warning;
use tracker_contract_core::CleanupReport;
use tracker_contract_core::ScenarioOutcome;
use tracker_contract_core::ScenarioResult;

/// Returns the live target, resolved once per binary.
///
/// # Errors
///
/// Returns a message when live configuration is present but invalid.
pub fn live() -> Result<&'static LiveTarget, String> {
    static TARGET: OnceLock<Result<LiveTarget, String>> = OnceLock::new();
    TARGET.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("tracker_contract=info"))
            .with_test_writer()
            .try_init();
        LiveTarget::discover()
    })
    .as_ref()
    .map_err(Clone::clone)
}

/// Runs a catalog scenario and requires it to pass.
///
/// Leaked fixtures are reported on stderr and do not fail the scenario.
/// Returns `Ok(None)` when the target is skipped.
///
/// # Errors
///
/// Returns the scenario failure message when it does not pass.
pub fn expect_pass(id: &str) -> Result<Option<ScenarioResult>, String> {
    let target = live()?;
    if let LiveTarget::Skipped(reason) = target {
        eprintln!("skipping {id}: {reason}");
        return Ok(None);
    }
    let Some(result) = target.run(id)? else {
        return Ok(None);
    };
    match &result.outcome {
        ScenarioOutcome::Passed => {}
        other => {
            return Err(format!(
                "{id} {}: {}",
                other.status().as_str(),
                other.message().unwrap_or_default()
            ));
        }
    }
    warn_leaks(id, &result.cleanup);
    Ok(Some(result))
}

/// Reports leaked fixtures on stderr.
pub fn warn_leaks(id: &str, cleanup: &CleanupReport) {
    if let Some(warning) = cleanup_warning(id, cleanup) {
        eprintln!("warning: {warning}");
    }
}
