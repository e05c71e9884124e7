// crates/tracker-contract-core/tests/catalog_mock.rs
// ============================================================================
// Module: Catalog Integration Tests
// Description: Full issue catalog against the in-process mock tracker.
// Purpose: Ensure every declared contract holds for a conforming service.
// Dependencies: tracker-contract-core, tiny_http
// ============================================================================

//! ## Overview
//! Runs the whole issue catalog against [`common::MockTracker`] and checks
//! outcomes, cleanup, filtering, and the keep policy.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

mod common;

use std::sync::Arc;

use tracker_contract_core::CleanupPolicy;
use tracker_contract_core::MemorySink;
use tracker_contract_core::ReportSink;
use tracker_contract_core::RunOptions;
use tracker_contract_core::ScenarioRunner;
use tracker_contract_core::ScenarioStatus;
use tracker_contract_core::issue_catalog;

use crate::common::MockTracker;
use crate::common::init_tracing;

fn runner(mock: &MockTracker, sink: &Arc<MemorySink>) -> ScenarioRunner {
    let sink: Arc<dyn ReportSink> = sink.clone();
    ScenarioRunner::new(mock.config(), sink).unwrap()
}

#[test]
fn every_catalog_scenario_passes_against_conforming_service() {
    init_tracing();
    let mock = MockTracker::start();
    let sink = Arc::new(MemorySink::new());
    let summary = runner(&mock, &sink).run_all(
        &issue_catalog(),
        &RunOptions {
            seed: Some(42),
            ..RunOptions::default()
        },
    );

    let failures: Vec<_> = sink
        .records()
        .into_iter()
        .filter(|record| record.status != ScenarioStatus::Passed)
        .map(|record| format!("{}: {:?}", record.id, record.message))
        .collect();
    assert!(failures.is_empty(), "{failures:#?}");
    assert_eq!(summary.total(), 13);
    assert_eq!(summary.passed, 13);
    assert_eq!(summary.leaked, 0);
    assert_eq!(summary.exit_code(), 0);
    assert_eq!(sink.suite(), Some(summary));
}

#[test]
fn catalog_leaves_no_issues_behind() {
    let mock = MockTracker::start();
    let sink = Arc::new(MemorySink::new());
    runner(&mock, &sink).run_all(&issue_catalog(), &RunOptions::default());

    assert_eq!(mock.issue_count(), 0);
    let creates = mock
        .requests_with_method("POST")
        .into_iter()
        .filter(|request| request.authorization.is_some())
        .count();
    // Only successful creates are deleted: 4 get fixtures + 3 create variants.
    assert_eq!(mock.requests_with_method("DELETE").len(), 7);
    assert!(creates >= 7);
}

#[test]
fn keep_policy_retains_created_issues() {
    let mock = MockTracker::start();
    let mut config = mock.config();
    config.fixtures.cleanup = CleanupPolicy::Keep;
    let sink = Arc::new(MemorySink::new());
    let dyn_sink: Arc<dyn ReportSink> = sink.clone();
    let runner = ScenarioRunner::new(config, dyn_sink).unwrap();
    let summary = runner.run_all(
        &issue_catalog(),
        &RunOptions {
            filter: Some("create_issue[".to_string()),
            seed: Some(1),
        },
    );

    assert_eq!(summary.passed, 3);
    assert_eq!(mock.issue_count(), 3);
    assert!(mock.requests_with_method("DELETE").is_empty());
    for record in sink.records() {
        assert!(record.notes.iter().any(|note| note.starts_with("cleanup (keep)")));
    }
}

#[test]
fn filter_selects_by_substring() {
    let mock = MockTracker::start();
    let sink = Arc::new(MemorySink::new());
    let summary = runner(&mock, &sink).run_all(
        &issue_catalog(),
        &RunOptions {
            filter: Some("negative".to_string()),
            seed: None,
        },
    );
    assert_eq!(summary.total(), 4);
    assert!(summary.entries.iter().all(|entry| entry.id.starts_with("create_issue_negative[")));
}

#[test]
fn created_issue_matches_generated_payload() {
    let mock = MockTracker::start();
    let mut config = mock.config();
    config.fixtures.cleanup = CleanupPolicy::Keep;
    let sink = Arc::new(MemorySink::new());
    let dyn_sink: Arc<dyn ReportSink> = sink.clone();
    ScenarioRunner::new(config, dyn_sink).unwrap().run_all(
        &issue_catalog(),
        &RunOptions {
            filter: Some("html_injection_check".to_string()),
            seed: Some(9),
        },
    );

    let record = sink.records().pop().unwrap();
    assert_eq!(record.status, ScenarioStatus::Passed);
    let posted = mock.requests_with_method("POST").pop().unwrap();
    let body: serde_json::Value = serde_json::from_str(&posted.body).unwrap();
    assert_eq!(body["summary"], "XSS Test <script>alert(1)</script>");
    assert_eq!(body["queue"], "TESTAEV");
}

#[test]
fn artifacts_never_contain_the_token() {
    let mock = MockTracker::start();
    let sink = Arc::new(MemorySink::new());
    runner(&mock, &sink).run_all(&issue_catalog(), &RunOptions::default());

    for record in sink.records() {
        assert!(record.artifacts.iter().any(|artifact| artifact.name == "Request"));
        for artifact in &record.artifacts {
            assert!(!artifact.body.contains(common::TOKEN), "{} leaks token", record.id);
        }
    }
}

#[test]
fn null_payload_sends_no_body() {
    let mock = MockTracker::start();
    let sink = Arc::new(MemorySink::new());
    runner(&mock, &sink).run_all(
        &issue_catalog(),
        &RunOptions {
            filter: Some("null_payload".to_string()),
            seed: None,
        },
    );
    let posted = mock.requests_with_method("POST");
    assert_eq!(posted.len(), 1);
    assert!(posted[0].body.is_empty());
    assert_eq!(sink.records()[0].status, ScenarioStatus::Passed);
}
