// crates/tracker-contract-core/src/lib.rs
// ============================================================================
// Module: Tracker Contract Core
// Description: Contract-test harness for the issue tracker HTTP API.
// Purpose: Declare request/response contracts and verify them repeatably.
// Dependencies: reqwest, serde, serde_json, serde_jcs, jsonpath_lib, thiserror, tracing
// ============================================================================

//! ## Overview
//! This crate hosts the contract-test harness used to validate a remote issue
//! tracker API. Scenarios are declared as templates, instantiated per
//! execution, and run sequentially by [`ScenarioRunner`]:
//! fixtures are provisioned, requests are rendered and sent through the
//! blocking [`ApiClient`], request/response artifacts are recorded, and the
//! actual response is evaluated against an [`ExpectedResponse`].
//! Invariants:
//! - Scenarios run one at a time; no state is shared between them.
//! - Fixtures are released on every exit path unless cleanup is disabled.
//! - Reporting never affects scenario outcomes.
//!
//! Security posture: responses from the remote service are untrusted and the
//! auth credential is redacted from every artifact and log line.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod catalog;
pub mod config;
pub mod contract;
pub mod datagen;
pub mod fixture;
pub mod http;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod session;
pub mod template;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::issue_catalog;
pub use config::CleanupPolicy;
pub use config::ConfigError;
pub use config::HarnessConfig;
pub use contract::ContractMismatch;
pub use contract::ExpectedResponse;
pub use contract::Mismatch;
pub use datagen::TextGenerator;
pub use fixture::CleanupReport;
pub use fixture::FixtureError;
pub use fixture::FixtureScope;
pub use fixture::FixtureSpec;
pub use fixture::IssueHandle;
pub use http::ApiClient;
pub use http::Credentials;
pub use http::HeaderPolicy;
pub use http::Headers;
pub use http::HttpMethod;
pub use http::HttpResult;
pub use http::RequestContract;
pub use http::TransportError;
pub use report::ArtifactKind;
pub use report::DirectorySink;
pub use report::MemorySink;
pub use report::ReportSink;
pub use report::ScenarioRecord;
pub use report::ScenarioRecorder;
pub use report::ScenarioStatus;
pub use report::Severity;
pub use report::SuiteSummary;
pub use runner::BrokenCause;
pub use runner::HarnessError;
pub use runner::RunOptions;
pub use runner::ScenarioOutcome;
pub use runner::ScenarioResult;
pub use runner::ScenarioRunner;
pub use scenario::Capture;
pub use scenario::Exchange;
pub use scenario::ScenarioBody;
pub use scenario::ScenarioInputs;
pub use scenario::ScenarioTemplate;
pub use session::SessionError;
pub use session::TrackerSession;
pub use template::RequestTemplate;
pub use template::TemplateError;
pub use template::Vars;
