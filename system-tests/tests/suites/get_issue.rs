// system-tests/tests/suites/get_issue.rs
// ============================================================================
// Module: Get Issue Suite
// Description: Live checks for `GET /issues/{id}`.
// Purpose: Verify read, not-found, auth, org, and expand contracts on a real service.
// Dependencies: helpers, tracker-contract-core
// ============================================================================

//! ## Overview
//! Runs every get-issue catalog scenario against the configured service.

use std::error::Error;

use crate::helpers::expect_pass;

#[test]
fn get_issue_success() -> Result<(), Box<dyn Error>> {
    if let Some(result) = expect_pass("get_issue_success")? {
        let cleanup = &result.cleanup;
        assert_eq!(cleanup.released.len() + cleanup.kept.len() + cleanup.failed.len(), 1);
    }
    Ok(())
}

#[test]
fn get_nonexistent_issue() -> Result<(), Box<dyn Error>> {
    if let Some(result) = expect_pass("get_nonexistent_issue")? {
        assert!(result.cleanup.is_empty());
    }
    Ok(())
}

#[test]
fn get_issue_unauthorized() -> Result<(), Box<dyn Error>> {
    expect_pass("get_issue_unauthorized")?;
    Ok(())
}

#[test]
fn get_issue_wrong_org_id() -> Result<(), Box<dyn Error>> {
    expect_pass("get_issue_wrong_org_id")?;
    Ok(())
}

#[test]
fn get_issue_with_expand() -> Result<(), Box<dyn Error>> {
    expect_pass("get_issue_with_expand")?;
    Ok(())
}
