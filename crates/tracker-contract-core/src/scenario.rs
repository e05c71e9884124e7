// crates/tracker-contract-core/src/scenario.rs
// ============================================================================
// Module: Scenario Definitions
// Description: Scenario templates, exchanges, and captures.
// Purpose: Declare request/expected-response contract cases.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! A [`ScenarioTemplate`] holds metadata plus a builder closure. The runner
//! calls [`ScenarioTemplate::instantiate`] once per execution, so generated
//! data is fresh for every run and parametrized variants never share values.
//! The resulting [`ScenarioBody`] lists fixtures to provision and the
//! [`Exchange`]s to perform in order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use crate::config::HarnessConfig;
use crate::contract::ExpectedResponse;
use crate::datagen::TextGenerator;
use crate::fixture::FixtureSpec;
use crate::report::Severity;
use crate::template::RequestTemplate;

// ============================================================================
// SECTION: Metadata
// ============================================================================

/// Scenario labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioMeta {
    /// Stable identifier, including a `[variant]` suffix for parametrized cases.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Severity label.
    pub severity: Severity,
    /// Feature label.
    pub feature: String,
    /// Story label.
    pub story: String,
}

// ============================================================================
// SECTION: Exchanges
// ============================================================================

/// Binds a response field to a scenario variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Response field (`JSONPath` or bare name).
    pub path: String,
    /// Variable receiving the value.
    pub var: String,
    /// Registers the captured value as an issue to clean up.
    pub cleanup: bool,
    /// Fails the scenario as broken when the value is missing.
    pub required: bool,
}

impl Capture {
    /// Captures a required value.
    #[must_use]
    pub fn required(path: impl Into<String>, var: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            var: var.into(),
            cleanup: false,
            required: true,
        }
    }

    /// Captures a value only if present.
    #[must_use]
    pub fn optional(path: impl Into<String>, var: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(path, var)
        }
    }

    /// Registers the captured value for fixture cleanup.
    #[must_use]
    pub const fn for_cleanup(mut self) -> Self {
        self.cleanup = true;
        self
    }
}

/// One request plus its expected response.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    /// Step narration.
    pub description: String,
    /// Request template.
    pub request: RequestTemplate,
    /// Expected response contract.
    pub expect: ExpectedResponse,
    /// Values captured from the response.
    pub captures: Vec<Capture>,
}

impl Exchange {
    /// Creates an exchange without captures.
    #[must_use]
    pub fn new(
        description: impl Into<String>,
        request: RequestTemplate,
        expect: ExpectedResponse,
    ) -> Self {
        Self {
            description: description.into(),
            request,
            expect,
            captures: Vec::new(),
        }
    }

    /// Adds a capture.
    #[must_use]
    pub fn capture(mut self, capture: Capture) -> Self {
        self.captures.push(capture);
        self
    }
}

// ============================================================================
// SECTION: Bodies and Templates
// ============================================================================

/// Instantiated scenario contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioBody {
    /// Parameters recorded in the report.
    pub parameters: BTreeMap<String, String>,
    /// Fixtures provisioned before the first exchange.
    pub fixtures: Vec<FixtureSpec>,
    /// Exchanges performed in order.
    pub exchanges: Vec<Exchange>,
}

impl ScenarioBody {
    /// Creates an empty body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a parameter.
    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Adds a fixture.
    #[must_use]
    pub fn fixture(mut self, spec: FixtureSpec) -> Self {
        self.fixtures.push(spec);
        self
    }

    /// Adds an exchange.
    #[must_use]
    pub fn exchange(mut self, exchange: Exchange) -> Self {
        self.exchanges.push(exchange);
        self
    }
}

/// Inputs available while instantiating a scenario.
pub struct ScenarioInputs<'a> {
    /// Harness configuration.
    pub config: &'a HarnessConfig,
    /// Text generator for payload values.
    pub text: &'a mut TextGenerator,
}

/// Builder closure producing a fresh body per execution.
pub type ScenarioBuilder = Box<dyn Fn(&mut ScenarioInputs<'_>) -> ScenarioBody + Send + Sync>;

/// Declared scenario.
pub struct ScenarioTemplate {
    /// Labels.
    pub meta: ScenarioMeta,
    /// Body builder.
    build: ScenarioBuilder,
}

impl ScenarioTemplate {
    /// Declares a scenario.
    pub fn new<F>(meta: ScenarioMeta, build: F) -> Self
    where
        F: Fn(&mut ScenarioInputs<'_>) -> ScenarioBody + Send + Sync + 'static,
    {
        Self {
            meta,
            build: Box::new(build),
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.meta.id
    }

    /// Builds a fresh body.
    #[must_use]
    pub fn instantiate(&self, inputs: &mut ScenarioInputs<'_>) -> ScenarioBody {
        (self.build)(inputs)
    }
}

impl fmt::Debug for ScenarioTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioTemplate").field("meta", &self.meta).finish_non_exhaustive()
    }
}
