// crates/tracker-contract-core/tests/report_directory.rs
// ============================================================================
// Module: Report Directory Tests
// Description: On-disk report tree produced by a suite run.
// Purpose: Ensure report files are complete, canonical, and free of secrets.
// Dependencies: tracker-contract-core, tempfile, tiny_http
// ============================================================================

//! ## Overview
//! Runs a filtered suite into a [`DirectorySink`] rooted in a temp directory
//! and inspects the resulting tree.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

mod common;

use std::fs;
use std::sync::Arc;

use serde_json::Value;
use tracker_contract_core::DirectorySink;
use tracker_contract_core::ReportSink;
use tracker_contract_core::RunOptions;
use tracker_contract_core::ScenarioRunner;
use tracker_contract_core::issue_catalog;

use crate::common::Faults;
use crate::common::MockTracker;
use crate::common::TOKEN;

fn run_into(mock: &MockTracker, root: &std::path::Path, filter: &str) -> DirectorySink {
    let sink = DirectorySink::new(root).unwrap();
    let dyn_sink: Arc<dyn ReportSink> = Arc::new(sink.clone());
    ScenarioRunner::new(mock.config(), dyn_sink).unwrap().run_all(
        &issue_catalog(),
        &RunOptions {
            filter: Some(filter.to_string()),
            seed: Some(5),
        },
    );
    sink
}

#[test]
fn passing_scenario_writes_record_and_artifacts() {
    let mock = MockTracker::start();
    let temp = tempfile::tempdir().unwrap();
    let sink = run_into(&mock, temp.path(), "get_issue_success");

    assert!(sink.run_root().starts_with(temp.path()));
    let dir = sink.scenario_dir("get_issue_success");
    let record: Value =
        serde_json::from_slice(&fs::read(dir.join("record.json")).unwrap()).unwrap();
    assert_eq!(record["status"], "passed");
    assert_eq!(record["severity"], "critical");
    assert!(record["parameters"]["fixture.summary"].is_string());

    let mut files: Vec<String> = fs::read_dir(&dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(
        files,
        vec![
            "01-Fixture_issue_payload.json",
            "02-Request.txt",
            "03-Response_200.json",
            "record.json",
            "summary.md",
        ]
    );
    let request = fs::read_to_string(dir.join("02-Request.txt")).unwrap();
    assert!(request.contains("Authorization: <redacted>"));
    assert!(!request.contains(TOKEN));
    let summary = fs::read_to_string(dir.join("summary.md")).unwrap();
    assert!(summary.contains("- Status: passed"));
}

#[test]
fn suite_files_list_every_scenario() {
    let mock = MockTracker::start();
    let temp = tempfile::tempdir().unwrap();
    let sink = run_into(&mock, temp.path(), "get_");

    let suite: Value =
        serde_json::from_slice(&fs::read(sink.run_root().join("suite.json")).unwrap()).unwrap();
    assert_eq!(suite["entries"].as_array().unwrap().len(), 5);
    assert_eq!(suite["passed"], 5);
    let markdown = fs::read_to_string(sink.run_root().join("suite.md")).unwrap();
    assert!(markdown.contains("- get_nonexistent_issue [normal]: passed"));
}

#[test]
fn record_json_is_canonical() {
    let mock = MockTracker::start();
    let temp = tempfile::tempdir().unwrap();
    let sink = run_into(&mock, temp.path(), "get_nonexistent_issue");

    let raw = fs::read(sink.scenario_dir("get_nonexistent_issue").join("record.json")).unwrap();
    let parsed: Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(serde_jcs::to_vec(&parsed).unwrap(), raw);
}

#[test]
fn failed_scenario_records_mismatch_artifact() {
    let mock = MockTracker::start();
    mock.set_faults(Faults {
        drop_fields: vec!["updatedAt".to_string()],
        ..Faults::default()
    });
    let temp = tempfile::tempdir().unwrap();
    let sink = run_into(&mock, temp.path(), "get_issue_success");

    let dir = sink.scenario_dir("get_issue_success");
    let record: Value =
        serde_json::from_slice(&fs::read(dir.join("record.json")).unwrap()).unwrap();
    assert_eq!(record["status"], "failed");
    assert_eq!(record["failure_kind"], "contract");
    let mismatch = fs::read_to_string(dir.join("04-Contract_mismatch.txt")).unwrap();
    assert!(mismatch.contains("updatedAt"));
}
