// crates/tracker-contract-core/tests/common/mod.rs
// ============================================================================
// Module: Mock Tracker
// Description: In-process issue tracker used by integration tests.
// Purpose: Serve the create/get/delete issue contract over local HTTP.
// Dependencies: tiny_http, serde_json, tracker-contract-core
// ============================================================================

//! ## Overview
//! [`MockTracker`] implements the issue endpoints on `127.0.0.1` with the
//! status codes and error shapes of the real service. Faults can be injected
//! to exercise setup, cleanup, and contract failures.

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Shared helpers are used by a subset of test binaries."
)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use std::thread::JoinHandle;

use serde_json::Value;
use serde_json::json;
use tiny_http::Header;
use tiny_http::Request;
use tiny_http::Response;
use tiny_http::Server;
use tracker_contract_core::HarnessConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Token accepted by the mock.
pub const TOKEN: &str = "test-token";
/// Organization accepted by the mock.
pub const ORG_ID: &str = "org-1";
/// Queues that exist in the mock.
pub const QUEUES: &[&str] = &["TESTAEV", "SANDBOX"];

// ============================================================================
// SECTION: State
// ============================================================================

/// Injected misbehavior.
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Status returned for every create instead of 201.
    pub create_status: Option<u16>,
    /// Omit `id` from create responses.
    pub create_without_id: bool,
    /// Fail every delete with 500.
    pub fail_delete: bool,
    /// Fields removed from GET responses.
    pub drop_fields: Vec<String>,
    /// Return 201 with a plaintext body on create.
    pub create_plaintext: bool,
}

/// Request observed by the mock.
#[derive(Debug, Clone)]
pub struct Observed {
    /// HTTP method.
    pub method: String,
    /// Path without query.
    pub path: String,
    /// Raw query, if any.
    pub query: Option<String>,
    /// Authorization header.
    pub authorization: Option<String>,
    /// Organization header.
    pub org: Option<String>,
    /// Raw body.
    pub body: String,
}

/// Mutable mock state.
#[derive(Debug, Default)]
pub struct MockState {
    /// Stored issues by id.
    pub issues: BTreeMap<String, Value>,
    /// Issue counter.
    pub next: u64,
    /// Observed requests in order.
    pub requests: Vec<Observed>,
    /// Injected faults.
    pub faults: Faults,
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Running mock tracker; stops on drop.
pub struct MockTracker {
    server: Arc<Server>,
    handle: Option<JoinHandle<()>>,
    state: Arc<Mutex<MockState>>,
    base_url: String,
}

impl MockTracker {
    /// Starts the mock on an ephemeral port.
    pub fn start() -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let addr = server.server_addr().to_ip().unwrap();
        let state = Arc::new(Mutex::new(MockState::default()));
        let handle = {
            let server = Arc::clone(&server);
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for request in server.incoming_requests() {
                    serve(&state, request);
                }
            })
        };
        Self {
            server,
            handle: Some(handle),
            state,
            base_url: format!("http://{addr}/v2"),
        }
    }

    /// Returns the base URL (`http://127.0.0.1:{port}/v2`).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns a valid harness configuration targeting this mock.
    pub fn config(&self) -> HarnessConfig {
        let mut config = HarnessConfig::default();
        config.service.base_url = self.base_url.clone();
        config.service.timeout_ms = 2_000;
        config.auth.token = TOKEN.to_string();
        config.auth.org_id = ORG_ID.to_string();
        config.report.enabled = false;
        config
    }

    /// Replaces the injected faults.
    pub fn set_faults(&self, faults: Faults) {
        self.state.lock().unwrap().faults = faults;
    }

    /// Returns the number of stored issues.
    pub fn issue_count(&self) -> usize {
        self.state.lock().unwrap().issues.len()
    }

    /// Returns a stored issue.
    pub fn issue(&self, id: &str) -> Option<Value> {
        self.state.lock().unwrap().issues.get(id).cloned()
    }

    /// Stores an issue directly.
    pub fn insert_issue(&self, id: &str, issue: Value) {
        self.state.lock().unwrap().issues.insert(id.to_string(), issue);
    }

    /// Returns observed requests.
    pub fn requests(&self) -> Vec<Observed> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Returns observed requests with the given method.
    pub fn requests_with_method(&self, method: &str) -> Vec<Observed> {
        self.requests().into_iter().filter(|request| request.method == method).collect()
    }
}

impl Drop for MockTracker {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Installs a test tracing subscriber once per binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("tracker_contract_core=debug"))
        .with_test_writer()
        .try_init();
}

// ============================================================================
// SECTION: Routing
// ============================================================================

/// Status, content type, and body of a mock reply.
type Reply = (u16, &'static str, String);

fn serve(state: &Arc<Mutex<MockState>>, mut request: Request) {
    let method = request.method().as_str().to_string();
    let url = request.url().to_string();
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (url.clone(), None),
    };
    let header = |name: &str| {
        request
            .headers()
            .iter()
            .find(|header| header.field.as_str().as_str().eq_ignore_ascii_case(name))
            .map(|header| header.value.as_str().to_string())
    };
    let authorization = header("Authorization");
    let org = header("X-Cloud-Org-ID");
    let mut body = String::new();
    let _ = request.as_reader().read_to_string(&mut body);

    let observed = Observed {
        method,
        path,
        query,
        authorization,
        org,
        body,
    };
    let (status, content_type, text) = {
        let mut state = state.lock().unwrap();
        state.requests.push(observed.clone());
        route(&mut state, &observed)
    };
    let response = Response::from_data(text.into_bytes())
        .with_status_code(status)
        .with_header(Header::from_bytes("Content-Type", content_type).unwrap());
    let _ = request.respond(response);
}

fn json_reply(status: u16, value: &Value) -> Reply {
    (status, "application/json", value.to_string())
}

fn route(state: &mut MockState, request: &Observed) -> Reply {
    let expected_auth = format!("OAuth {TOKEN}");
    if request.authorization.as_deref() != Some(expected_auth.as_str()) {
        return (401, "text/plain", "Authorization required".to_string());
    }
    if request.org.as_deref() != Some(ORG_ID) {
        return json_reply(
            403,
            &json!({
                "errorMessages": ["Organization is not available, not ready or not found"],
                "statusCode": 403
            }),
        );
    }
    let Some(rest) = request.path.strip_prefix("/v2/issues") else {
        return json_reply(404, &json!({"errorMessages": ["Not found"]}));
    };
    match (request.method.as_str(), rest.trim_start_matches('/')) {
        ("POST", "") => create(state, &request.body),
        ("GET", id) if !id.is_empty() => get(state, id, request.query.as_deref()),
        ("DELETE", id) if !id.is_empty() => delete(state, id),
        _ => json_reply(405, &json!({"errorMessages": ["Method not allowed"]})),
    }
}

fn create(state: &mut MockState, body: &str) -> Reply {
    if let Some(status) = state.faults.create_status {
        return (status, "text/plain", "injected failure".to_string());
    }
    let payload: Value = match serde_json::from_str(body) {
        Ok(Value::Object(map)) => Value::Object(map),
        _ => return json_reply(400, &json!({"errors": {"body": "Required"}, "statusCode": 400})),
    };
    let Some(queue) = payload.get("queue").and_then(Value::as_str) else {
        return json_reply(400, &json!({"errors": {"queue": "Required field"}, "statusCode": 400}));
    };
    if payload.get("summary").and_then(Value::as_str).is_none() {
        return json_reply(
            400,
            &json!({"errors": {"summary": "Required field"}, "statusCode": 400}),
        );
    }
    if !QUEUES.contains(&queue) {
        return json_reply(
            404,
            &json!({"errorMessages": ["Очередь не существует."], "statusCode": 404}),
        );
    }
    if state.faults.create_plaintext {
        return (201, "text/plain", "created".to_string());
    }

    state.next += 1;
    let id = format!("{:024x}", 0x6242_ed61_0000_u64 + state.next);
    let mut issue = payload.clone();
    issue["id"] = json!(id);
    issue["key"] = json!(format!("{queue}-{}", state.next));
    issue["createdAt"] = json!("2026-01-01T00:00:00.000+0000");
    issue["updatedAt"] = json!("2026-01-01T00:00:00.000+0000");
    if issue.get("description").is_none() {
        issue["description"] = Value::Null;
    }
    state.issues.insert(id, issue.clone());
    if state.faults.create_without_id
        && let Some(map) = issue.as_object_mut()
    {
        map.remove("id");
    }
    json_reply(201, &issue)
}

fn get(state: &MockState, id: &str, query: Option<&str>) -> Reply {
    let Some(issue) = state.issues.get(id) else {
        return json_reply(
            404,
            &json!({"errorMessages": ["Задача не существует."], "statusCode": 404}),
        );
    };
    let mut issue = issue.clone();
    if query.is_some_and(|query| query.split('&').any(|pair| pair == "expand=attachments")) {
        issue["attachments"] = json!([]);
    }
    if let Some(map) = issue.as_object_mut() {
        for field in &state.faults.drop_fields {
            map.remove(field);
        }
    }
    json_reply(200, &issue)
}

fn delete(state: &mut MockState, id: &str) -> Reply {
    if state.faults.fail_delete {
        return (500, "text/plain", "delete unavailable".to_string());
    }
    if state.issues.remove(id).is_some() {
        (204, "text/plain", String::new())
    } else {
        json_reply(404, &json!({"errorMessages": ["Задача не существует."]}))
    }
}
