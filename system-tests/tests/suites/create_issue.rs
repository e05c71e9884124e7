// system-tests/tests/suites/create_issue.rs
// ============================================================================
// Module: Create Issue Suite
// Description: Live checks for `POST /issues`.
// Purpose: Verify creation, read-back, validation, and auth contracts on a real service.
// Dependencies: helpers, system-tests, tracker-contract-core
// ============================================================================

//! ## Overview
//! Runs every create-issue catalog scenario, plus a direct create/read-back
//! round trip through the session API.

use std::error::Error;

use serde_json::Value;
use serde_json::json;
use system_tests::live::LiveTarget;
use system_tests::live::exclusive;
use tracker_contract_core::FixtureScope;
use tracker_contract_core::FixtureSpec;
use tracker_contract_core::RequestTemplate;
use tracker_contract_core::TrackerSession;
use tracker_contract_core::Vars;

use crate::helpers::expect_pass;
use crate::helpers::live;
use crate::helpers::warn_leaks;

#[test]
fn create_issue_minimal_fields() -> Result<(), Box<dyn Error>> {
    expect_pass("create_issue[minimal_fields]")?;
    Ok(())
}

#[test]
fn create_issue_all_basic_fields() -> Result<(), Box<dyn Error>> {
    expect_pass("create_issue[all_basic_fields]")?;
    Ok(())
}

#[test]
fn create_issue_html_injection_check() -> Result<(), Box<dyn Error>> {
    expect_pass("create_issue[html_injection_check]")?;
    Ok(())
}

#[test]
fn create_issue_missing_queue() -> Result<(), Box<dyn Error>> {
    expect_pass("create_issue_negative[missing_queue]")?;
    Ok(())
}

#[test]
fn create_issue_missing_summary() -> Result<(), Box<dyn Error>> {
    expect_pass("create_issue_negative[missing_summary]")?;
    Ok(())
}

#[test]
fn create_issue_nonexistent_queue() -> Result<(), Box<dyn Error>> {
    expect_pass("create_issue_negative[nonexistent_queue]")?;
    Ok(())
}

#[test]
fn create_issue_null_payload() -> Result<(), Box<dyn Error>> {
    expect_pass("create_issue_negative[null_payload]")?;
    Ok(())
}

#[test]
fn unauthorized_create() -> Result<(), Box<dyn Error>> {
    expect_pass("unauthorized_create")?;
    Ok(())
}

#[test]
fn created_issue_reads_back_exactly() -> Result<(), Box<dyn Error>> {
    let LiveTarget::Ready(config) = live()? else {
        return Ok(());
    };
    let _guard = exclusive();
    let session = TrackerSession::new(config)?;
    let mut scope = FixtureScope::new(&session, config.fixtures.cleanup, &config.fixtures.id_key);
    let handle = scope.provision(&FixtureSpec::issue("issue", &config.fixtures.queue, "S", "D"))?;
    let mut vars = Vars::new();
    handle.export(&mut vars);

    let request = session.render(&RequestTemplate::get("/issues/{issue}"), &vars)?;
    let response = session.send(&request)?;
    let cleanup = scope.release();
    assert_eq!(response.status, 200, "{}", response.text);
    let body: Value = response.json()?;
    assert_eq!(body["summary"], json!("S"));
    assert_eq!(body["description"], json!("D"));
    assert!(body.get("createdAt").is_some());
    assert!(body.get("updatedAt").is_some());
    warn_leaks("created_issue_reads_back_exactly", &cleanup);
    Ok(())
}
