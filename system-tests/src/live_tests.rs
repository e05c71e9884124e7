// system-tests/src/live_tests.rs
// ============================================================================
// Module: Live Target Tests
// Description: Run serialization and leak reporting for live targets.
// Purpose: Ensure parallel test threads never overlap scenarios.
// Dependencies: tiny_http, tracker-contract-core
// ============================================================================

//! ## Overview
//! Drives [`LiveTarget::run`] against a slow local server from several
//! threads and checks that requests never overlap.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;
use tracker_contract_core::CleanupReport;
use tracker_contract_core::HarnessConfig;
use tracker_contract_core::fixture::CleanupFailure;

use super::LiveTarget;
use super::cleanup_warning;

/// Concurrency counters shared with the server threads.
#[derive(Default)]
struct InFlight {
    /// Requests currently being served.
    current: AtomicUsize,
    /// Highest observed value of `current`.
    peak: AtomicUsize,
    /// Requests served in total.
    total: AtomicUsize,
}

/// Starts a server that answers every request with a delayed 404.
fn slow_server() -> (String, Arc<InFlight>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", server.server_addr().to_ip().unwrap());
    let counters = Arc::new(InFlight::default());
    let shared = Arc::clone(&counters);
    thread::spawn(move || {
        for request in server.incoming_requests() {
            let counters = Arc::clone(&shared);
            thread::spawn(move || {
                let now = counters.current.fetch_add(1, Ordering::SeqCst) + 1;
                counters.peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(40));
                counters.current.fetch_sub(1, Ordering::SeqCst);
                counters.total.fetch_add(1, Ordering::SeqCst);
                let body = r#"{"errorMessages":["Issue does not exist"]}"#;
                let header = Header::from_bytes("Content-Type", "application/json").unwrap();
                let response = Response::from_data(body.as_bytes().to_vec())
                    .with_status_code(404)
                    .with_header(header);
                let _ = request.respond(response);
            });
        }
    });
    (base_url, counters)
}

#[test]
fn parallel_runs_execute_one_at_a_time() {
    let (base_url, counters) = slow_server();
    let mut config = HarnessConfig::default();
    config.service.base_url = base_url;
    config.auth.token = "token".to_string();
    config.auth.org_id = "org".to_string();
    config.report.enabled = false;
    let target = LiveTarget::Ready(config);

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| target.run("get_nonexistent_issue").unwrap().unwrap());
        }
    });

    assert_eq!(counters.total.load(Ordering::SeqCst), 4);
    assert_eq!(counters.peak.load(Ordering::SeqCst), 1);
}

#[test]
fn skipped_target_runs_nothing() {
    let target = LiveTarget::Skipped("no service".to_string());
    assert!(target.run("get_issue_success").unwrap().is_none());
}

#[test]
fn unknown_scenario_is_an_error() {
    let target = LiveTarget::Ready(HarnessConfig::default());
    assert!(target.run("no_such_scenario").unwrap_err().contains("no_such_scenario"));
}

#[test]
fn leaked_issues_produce_a_warning() {
    let cleanup = CleanupReport {
        released: vec!["1".to_string()],
        kept: Vec::new(),
        failed: vec![CleanupFailure {
            id: "2".to_string(),
            reason: "status 405".to_string(),
        }],
    };
    let warning = cleanup_warning("get_issue_success", &cleanup).unwrap();
    assert!(warning.starts_with("get_issue_success leaked issues: "));
    assert!(warning.contains("2: status 405"));
    assert_eq!(cleanup_warning("get_issue_success", &CleanupReport::default()), None);
}
