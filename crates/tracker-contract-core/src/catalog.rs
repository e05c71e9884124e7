// crates/tracker-contract-core/src/catalog.rs
// ============================================================================
// Module: Issue Catalog
// Description: Contract scenarios for the create-issue and get-issue endpoints.
// Purpose: Declare positive and negative issue API contracts.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Every scenario self-provisions: anything it reads, it creates first. Text
//! values are generated inside the builder closures so each execution gets
//! fresh data. Service messages, the queue, and the known-missing id come
//! from [`crate::config::HarnessConfig`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde_json::Value;
use serde_json::json;

use crate::contract::ExpectedResponse;
use crate::fixture::FixtureSpec;
use crate::http::HeaderPolicy;
use crate::report::Severity;
use crate::scenario::Capture;
use crate::scenario::Exchange;
use crate::scenario::ScenarioBody;
use crate::scenario::ScenarioInputs;
use crate::scenario::ScenarioMeta;
use crate::scenario::ScenarioTemplate;
use crate::session::ISSUES_PATH;
use crate::template::RequestTemplate;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Feature label shared by every issue scenario.
pub const FEATURE: &str = "Issue API";
/// Story label for get-issue scenarios.
pub const STORY_GET: &str = "Get issue";
/// Story label for create-issue scenarios.
pub const STORY_CREATE: &str = "Create issue";
/// Variable holding the fixture issue id.
const FIXTURE_VAR: &str = "issue";
/// Path of the fixture issue.
const FIXTURE_PATH: &str = "/issues/{issue}";
/// Organization value used by the wrong-org scenario.
const WRONG_ORG_ID: &str = "wrong_org_id";
/// Timeout for read-back requests after creation.
const READ_BACK_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Returns every issue scenario in run order.
#[must_use]
pub fn issue_catalog() -> Vec<ScenarioTemplate> {
    let mut catalog = get_issue_scenarios();
    catalog.extend(create_issue_scenarios());
    catalog
}

/// Builds scenario metadata.
fn meta(id: &str, title: &str, severity: Severity, story: &str) -> ScenarioMeta {
    ScenarioMeta {
        id: id.to_string(),
        title: title.to_string(),
        severity,
        feature: FEATURE.to_string(),
        story: story.to_string(),
    }
}

/// Builds a fixture issue with generated text and records it as parameters.
fn with_fixture(inputs: &mut ScenarioInputs<'_>) -> ScenarioBody {
    let summary = inputs.text.sentence();
    let description = inputs.text.paragraph();
    ScenarioBody::new()
        .parameter("fixture.summary", summary.clone())
        .parameter("fixture.description", description.clone())
        .fixture(FixtureSpec::issue(
            FIXTURE_VAR,
            &inputs.config.fixtures.queue,
            summary,
            description,
        ))
}

// ============================================================================
// SECTION: Get Issue
// ============================================================================

/// Get-issue scenarios.
fn get_issue_scenarios() -> Vec<ScenarioTemplate> {
    vec![
        ScenarioTemplate::new(
            meta("get_issue_success", "Get an existing issue", Severity::Critical, STORY_GET),
            |inputs| {
                let body = with_fixture(inputs);
                let summary = body.parameters.get("fixture.summary").cloned().unwrap_or_default();
                let description =
                    body.parameters.get("fixture.description").cloned().unwrap_or_default();
                body.exchange(Exchange::new(
                    "Fetch the fixture issue",
                    RequestTemplate::get(FIXTURE_PATH),
                    ExpectedResponse::status(200)
                        .equals_var("id", FIXTURE_VAR)
                        .equals("summary", summary)
                        .equals("description", description)
                        .present("createdAt")
                        .present("updatedAt"),
                ))
            },
        ),
        ScenarioTemplate::new(
            meta(
                "get_nonexistent_issue",
                "Get an issue that does not exist",
                Severity::Normal,
                STORY_GET,
            ),
            |inputs| {
                let missing = inputs.config.fixtures.missing_issue_id.clone();
                let message = inputs.config.expectations.issue_not_found_message.clone();
                ScenarioBody::new().parameter("issue_id", missing.clone()).exchange(Exchange::new(
                    format!("Fetch missing issue {missing}"),
                    RequestTemplate::get(format!("{ISSUES_PATH}/{missing}")),
                    ExpectedResponse::status(404)
                        .non_empty("errorMessages")
                        .contains("errorMessages", message),
                ))
            },
        ),
        ScenarioTemplate::new(
            meta(
                "get_issue_unauthorized",
                "Get an issue without authorization",
                Severity::Critical,
                STORY_GET,
            ),
            |inputs| {
                let unauthorized = inputs.config.expectations.unauthorized_body.clone();
                with_fixture(inputs).exchange(Exchange::new(
                    "Fetch without authorization headers",
                    RequestTemplate::get(FIXTURE_PATH).with_headers(HeaderPolicy::Anonymous),
                    ExpectedResponse::status(401).body_text(unauthorized),
                ))
            },
        ),
        ScenarioTemplate::new(
            meta(
                "get_issue_wrong_org_id",
                "Get an issue with a wrong organization id",
                Severity::Normal,
                STORY_GET,
            ),
            |inputs| {
                let message = inputs.config.expectations.org_unavailable_message.clone();
                with_fixture(inputs).exchange(Exchange::new(
                    "Fetch with a wrong organization header",
                    RequestTemplate::get(FIXTURE_PATH)
                        .with_headers(HeaderPolicy::OrgOverride(WRONG_ORG_ID.to_string())),
                    ExpectedResponse::status(403)
                        .non_empty("errorMessages")
                        .contains("errorMessages", message),
                ))
            },
        ),
        ScenarioTemplate::new(
            meta(
                "get_issue_with_expand",
                "Get an issue with expanded fields",
                Severity::Normal,
                STORY_GET,
            ),
            |inputs| {
                with_fixture(inputs).exchange(Exchange::new(
                    "Fetch with expand=attachments",
                    RequestTemplate::get(FIXTURE_PATH).with_query("expand", "attachments"),
                    ExpectedResponse::status(200).equals_var("id", FIXTURE_VAR).present("attachments"),
                ))
            },
        ),
    ]
}

// ============================================================================
// SECTION: Create Issue
// ============================================================================

/// Payload shapes for the positive create scenario.
#[derive(Debug, Clone, Copy)]
enum CreateVariant {
    /// Queue, summary, and description.
    MinimalFields,
    /// Adds type and priority.
    AllBasicFields,
    /// Markup in summary and description.
    HtmlInjection,
}

impl CreateVariant {
    /// Every variant in run order.
    const ALL: [Self; 3] = [Self::MinimalFields, Self::AllBasicFields, Self::HtmlInjection];

    /// Variant suffix.
    const fn label(self) -> &'static str {
        match self {
            Self::MinimalFields => "minimal_fields",
            Self::AllBasicFields => "all_basic_fields",
            Self::HtmlInjection => "html_injection_check",
        }
    }

    /// Builds a fresh payload.
    fn payload(self, inputs: &mut ScenarioInputs<'_>) -> Value {
        let queue = inputs.config.fixtures.queue.clone();
        match self {
            Self::MinimalFields => json!({
                "queue": queue,
                "summary": inputs.text.sentence(),
                "description": inputs.text.paragraph(),
            }),
            Self::AllBasicFields => json!({
                "queue": queue,
                "summary": inputs.text.sentence(),
                "description": inputs.text.paragraph(),
                "type": "task",
                "priority": "normal",
            }),
            Self::HtmlInjection => json!({
                "queue": queue,
                "summary": "XSS Test <script>alert(1)</script>",
                "description": "HTML: <b>bold</b>",
            }),
        }
    }
}

/// Invalid payloads for the negative create scenario.
#[derive(Debug, Clone, Copy)]
enum InvalidCreate {
    /// No queue.
    MissingQueue,
    /// No summary.
    MissingSummary,
    /// Queue that does not exist.
    NonexistentQueue,
    /// No body at all.
    NullPayload,
}

impl InvalidCreate {
    /// Every variant in run order.
    const ALL: [Self; 4] =
        [Self::MissingQueue, Self::MissingSummary, Self::NonexistentQueue, Self::NullPayload];

    /// Variant suffix.
    const fn label(self) -> &'static str {
        match self {
            Self::MissingQueue => "missing_queue",
            Self::MissingSummary => "missing_summary",
            Self::NonexistentQueue => "nonexistent_queue",
            Self::NullPayload => "null_payload",
        }
    }

    /// Request body, if any.
    fn payload(self, queue: &str) -> Option<Value> {
        match self {
            Self::MissingQueue => Some(json!({"summary": "Missing queue"})),
            Self::MissingSummary => Some(json!({"queue": queue})),
            Self::NonexistentQueue => Some(json!({"queue": "NONEXISTENT", "summary": "Test"})),
            Self::NullPayload => None,
        }
    }

    /// Expected status and the error collection that must be non-empty.
    const fn expected(self) -> (u16, &'static str) {
        match self {
            Self::NonexistentQueue => (404, "errorMessages"),
            Self::MissingQueue | Self::MissingSummary | Self::NullPayload => (400, "errors"),
        }
    }
}

/// Create-issue scenarios.
fn create_issue_scenarios() -> Vec<ScenarioTemplate> {
    let mut scenarios = Vec::new();
    for variant in CreateVariant::ALL {
        scenarios.push(ScenarioTemplate::new(
            meta(
                &format!("create_issue[{}]", variant.label()),
                "Create a new issue",
                Severity::Blocker,
                STORY_CREATE,
            ),
            move |inputs| create_issue_body(variant.payload(inputs)),
        ));
    }
    for variant in InvalidCreate::ALL {
        scenarios.push(ScenarioTemplate::new(
            meta(
                &format!("create_issue_negative[{}]", variant.label()),
                "Reject an invalid issue",
                Severity::Critical,
                STORY_CREATE,
            ),
            move |inputs| {
                let payload = variant.payload(&inputs.config.fixtures.queue);
                let (status, error_key) = variant.expected();
                let rendered = payload.as_ref().map_or_else(|| "null".to_string(), Value::to_string);
                ScenarioBody::new().parameter("payload", rendered).exchange(
                    Exchange::new(
                        "Send an invalid creation request",
                        RequestTemplate::post(ISSUES_PATH, payload),
                        ExpectedResponse::status(status).non_empty(error_key),
                    )
                    .capture(Capture::optional("id", "created_issue").for_cleanup()),
                )
            },
        ));
    }
    scenarios.push(ScenarioTemplate::new(
        meta("unauthorized_create", "Create without authorization", Severity::Critical, STORY_CREATE),
        |inputs| {
            let payload = json!({
                "queue": inputs.config.fixtures.queue,
                "summary": "Unauthorized test",
            });
            let unauthorized = inputs.config.expectations.unauthorized_body.clone();
            ScenarioBody::new().exchange(
                Exchange::new(
                    "Create without authorization headers",
                    RequestTemplate::post(ISSUES_PATH, Some(payload))
                        .with_headers(HeaderPolicy::Anonymous),
                    ExpectedResponse::status(401).body_text(unauthorized),
                )
                .capture(Capture::optional("id", "created_issue").for_cleanup()),
            )
        },
    ));
    scenarios
}

/// Create, then read back by the returned id.
fn create_issue_body(payload: Value) -> ScenarioBody {
    let summary = payload.get("summary").cloned().unwrap_or(Value::Null);
    let description = payload.get("description").cloned().unwrap_or(Value::Null);
    ScenarioBody::new()
        .parameter("payload", payload.to_string())
        .exchange(
            Exchange::new(
                "Create the issue",
                RequestTemplate::post(ISSUES_PATH, Some(payload)),
                ExpectedResponse::status(201)
                    .present("id")
                    .present("key")
                    .equals("summary", summary.clone()),
            )
            .capture(Capture::required("id", "created_issue").for_cleanup()),
        )
        .exchange(Exchange::new(
            "Read the created issue back",
            RequestTemplate::get("/issues/{created_issue}").with_timeout(READ_BACK_TIMEOUT),
            ExpectedResponse::status(200)
                .equals_var("id", "created_issue")
                .equals("summary", summary)
                .equals("description", description)
                .present("createdAt")
                .present("updatedAt"),
        ))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
