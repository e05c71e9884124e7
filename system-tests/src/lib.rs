// system-tests/src/lib.rs
// ============================================================================
// Module: Tracker Contract System Tests Library
// Description: Live-target discovery and scenario execution for system tests.
// Purpose: Run catalog scenarios against a real tracker when one is configured.
// Dependencies: tracker-contract-core
// ============================================================================

//! ## Overview
//! This crate hosts the helpers used by the live system-test binaries in
//! `system-tests/tests`. Suites only talk to a real service when
//! `TRACKER_CONTRACT_BASE_URL` or `TRACKER_CONTRACT_CONFIG` is set; otherwise
//! they skip.
//! Security posture: the live token comes from the environment and is never
//! written to test output.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod live;
