// crates/tracker-contract-core/src/contract.rs
// ============================================================================
// Module: Response Contracts
// Description: Expected response contracts and their evaluation.
// Purpose: Compare actual responses against declared expectations.
// Dependencies: jsonpath_lib, serde_json, thiserror
// ============================================================================

//! ## Overview
//! An [`ExpectedResponse`] declares exactly one expected status code, zero or
//! more JSON field checks addressed by `JSONPath`, and an optional exact
//! plaintext body. [`ExpectedResponse::evaluate`] returns a
//! [`ContractMismatch`] listing every difference in human-readable form.
//! Invariants:
//! - A status mismatch is always a hard failure and short-circuits field checks.
//! - Substring checks are case-sensitive plain substring matches.
//! - Every 2xx JSON expectation also checks that the body re-parses to an
//!   equal value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use jsonpath_lib::select;
use serde_json::Value;
use thiserror::Error;

use crate::http::HttpResult;
use crate::template::Vars;

/// Maximum number of body characters quoted in a status mismatch.
const BODY_EXCERPT_CHARS: usize = 512;

// ============================================================================
// SECTION: Expectations
// ============================================================================

/// Expected value for an equality check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    /// Literal JSON value.
    Literal(Value),
    /// Value of a scenario variable, compared as a string.
    Var(String),
}

/// Expectation applied to the values selected by a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldExpectation {
    /// Path selects at least one value.
    Present,
    /// Path selects nothing.
    Absent,
    /// Path selects a non-empty array, object, or string.
    NonEmpty,
    /// First selected value equals the expected value.
    Equals(Expected),
    /// Some selected string (or string inside a selected array) contains the needle.
    Contains(String),
}

/// Field check addressed by a `JSONPath` expression or bare field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCheck {
    /// `JSONPath` (`$.a.b`) or a bare top-level field name.
    pub path: String,
    /// Expectation for the selected values.
    pub expectation: FieldExpectation,
}

/// Expected response contract.
///
/// # Invariants
/// - Exactly one expected status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedResponse {
    /// Expected HTTP status.
    pub status: u16,
    /// Field checks evaluated against the JSON body.
    pub fields: Vec<FieldCheck>,
    /// Exact plaintext body, when the response is not JSON.
    pub body_text: Option<String>,
}

impl ExpectedResponse {
    /// Creates an expectation for the given status with no body checks.
    #[must_use]
    pub const fn status(status: u16) -> Self {
        Self {
            status,
            fields: Vec::new(),
            body_text: None,
        }
    }

    /// Adds a field check.
    #[must_use]
    pub fn field(mut self, path: impl Into<String>, expectation: FieldExpectation) -> Self {
        self.fields.push(FieldCheck {
            path: path.into(),
            expectation,
        });
        self
    }

    /// Requires the field to be present.
    #[must_use]
    pub fn present(self, path: impl Into<String>) -> Self {
        self.field(path, FieldExpectation::Present)
    }

    /// Requires the field to be absent.
    #[must_use]
    pub fn absent(self, path: impl Into<String>) -> Self {
        self.field(path, FieldExpectation::Absent)
    }

    /// Requires the field to be a non-empty collection or string.
    #[must_use]
    pub fn non_empty(self, path: impl Into<String>) -> Self {
        self.field(path, FieldExpectation::NonEmpty)
    }

    /// Requires the field to equal a literal value.
    #[must_use]
    pub fn equals(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.field(path, FieldExpectation::Equals(Expected::Literal(value.into())))
    }

    /// Requires the field to equal a scenario variable.
    #[must_use]
    pub fn equals_var(self, path: impl Into<String>, var: impl Into<String>) -> Self {
        self.field(path, FieldExpectation::Equals(Expected::Var(var.into())))
    }

    /// Requires a string at the field to contain the needle.
    #[must_use]
    pub fn contains(self, path: impl Into<String>, needle: impl Into<String>) -> Self {
        self.field(path, FieldExpectation::Contains(needle.into()))
    }

    /// Requires the body to equal the given text exactly.
    #[must_use]
    pub fn body_text(mut self, text: impl Into<String>) -> Self {
        self.body_text = Some(text.into());
        self
    }

    /// Returns true when the expected status is 2xx.
    #[must_use]
    pub const fn expects_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Evaluates the expectation against an actual response.
    ///
    /// # Errors
    ///
    /// Returns [`ContractMismatch`] listing every failed check.
    pub fn evaluate(&self, result: &HttpResult, vars: &Vars) -> Result<(), ContractMismatch> {
        if result.status != self.status {
            return Err(ContractMismatch::single(Mismatch::Status {
                expected: self.status,
                actual: result.status,
                body: excerpt(&result.text),
            }));
        }

        let mut mismatches = Vec::new();
        if let Some(expected) = &self.body_text
            && &result.text != expected
        {
            mismatches.push(Mismatch::BodyText {
                expected: expected.clone(),
                actual: excerpt(&result.text),
            });
        }

        let wants_json =
            !self.fields.is_empty() || (self.expects_success() && self.body_text.is_none());
        if wants_json {
            match parse_stable(&result.text) {
                Ok(document) => {
                    for check in &self.fields {
                        if let Some(mismatch) = evaluate_field(&document, check, vars) {
                            mismatches.push(mismatch);
                        }
                    }
                }
                Err(mismatch) => mismatches.push(mismatch),
            }
        }

        if mismatches.is_empty() { Ok(()) } else { Err(ContractMismatch { mismatches }) }
    }
}

// ============================================================================
// SECTION: Mismatches
// ============================================================================

/// Single difference between an expectation and an actual response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// Status code differs.
    Status {
        /// Expected status.
        expected: u16,
        /// Actual status.
        actual: u16,
        /// Body excerpt for diagnosis.
        body: String,
    },
    /// Field is missing.
    MissingField {
        /// Field path.
        path: String,
    },
    /// Field is present but must be absent.
    UnexpectedField {
        /// Field path.
        path: String,
    },
    /// Field is present but empty.
    EmptyField {
        /// Field path.
        path: String,
    },
    /// Field value differs.
    ValueMismatch {
        /// Field path.
        path: String,
        /// Expected value.
        expected: Value,
        /// Actual value.
        actual: Value,
    },
    /// No string at the field contains the needle.
    SubstringMissing {
        /// Field path.
        path: String,
        /// Expected substring.
        needle: String,
        /// Strings found at the path.
        found: Vec<String>,
    },
    /// Plaintext body differs.
    BodyText {
        /// Expected body.
        expected: String,
        /// Actual body excerpt.
        actual: String,
    },
    /// Body is not valid JSON.
    NotJson {
        /// Parser diagnostic.
        message: String,
    },
    /// Body does not re-parse to an equal value.
    UnstableJson,
    /// Field path is not a valid `JSONPath`.
    InvalidPath {
        /// Field path.
        path: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Equality check references an unknown variable.
    UnknownVariable {
        /// Variable name.
        name: String,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status {
                expected,
                actual,
                body,
            } => write!(f, "expected status {expected}, got {actual}; body: {body}"),
            Self::MissingField {
                path,
            } => write!(f, "missing field `{path}`"),
            Self::UnexpectedField {
                path,
            } => write!(f, "unexpected field `{path}`"),
            Self::EmptyField {
                path,
            } => write!(f, "field `{path}` is empty"),
            Self::ValueMismatch {
                path,
                expected,
                actual,
            } => write!(f, "field `{path}`: expected {expected}, got {actual}"),
            Self::SubstringMissing {
                path,
                needle,
                found,
            } => write!(
                f,
                "field `{path}` does not contain \"{needle}\"; found {}",
                Value::from(found.clone())
            ),
            Self::BodyText {
                expected,
                actual,
            } => write!(f, "expected body \"{expected}\", got \"{actual}\""),
            Self::NotJson {
                message,
            } => write!(f, "body is not valid JSON: {message}"),
            Self::UnstableJson => f.write_str("body does not re-parse to an equal JSON value"),
            Self::InvalidPath {
                path,
                message,
            } => write!(f, "invalid field path `{path}`: {message}"),
            Self::UnknownVariable {
                name,
            } => write!(f, "unknown scenario variable `{name}`"),
        }
    }
}

/// Contract evaluation failure with every mismatch found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("contract mismatch:\n{}", render_mismatches(.mismatches))]
pub struct ContractMismatch {
    /// Mismatches in evaluation order.
    pub mismatches: Vec<Mismatch>,
}

impl ContractMismatch {
    /// Wraps a single mismatch.
    #[must_use]
    pub fn single(mismatch: Mismatch) -> Self {
        Self {
            mismatches: vec![mismatch],
        }
    }

    /// Returns true when the failure is a status mismatch.
    #[must_use]
    pub fn is_status(&self) -> bool {
        matches!(self.mismatches.as_slice(), [Mismatch::Status { .. }])
    }
}

/// Renders mismatches as an indented bullet list.
fn render_mismatches(mismatches: &[Mismatch]) -> String {
    mismatches.iter().map(|mismatch| format!("  - {mismatch}")).collect::<Vec<_>>().join("\n")
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses JSON and checks that it re-parses to an equal value.
fn parse_stable(text: &str) -> Result<Value, Mismatch> {
    let first: Value = serde_json::from_str(text).map_err(|err| Mismatch::NotJson {
        message: err.to_string(),
    })?;
    let second: Value = serde_json::from_str(text).map_err(|err| Mismatch::NotJson {
        message: err.to_string(),
    })?;
    let reencoded = serde_json::to_string(&first).map_err(|err| Mismatch::NotJson {
        message: err.to_string(),
    })?;
    let third: Value = serde_json::from_str(&reencoded).map_err(|err| Mismatch::NotJson {
        message: err.to_string(),
    })?;
    if first != second || first != third {
        return Err(Mismatch::UnstableJson);
    }
    Ok(first)
}

/// Normalizes a bare field name into a `JSONPath` expression.
fn normalize_path(path: &str) -> String {
    if path.starts_with('$') { path.to_string() } else { format!("$.{path}") }
}

/// Selects values at a path.
///
/// # Errors
///
/// Returns [`Mismatch::InvalidPath`] for malformed paths.
pub fn select_path<'a>(document: &'a Value, path: &str) -> Result<Vec<&'a Value>, Mismatch> {
    select(document, &normalize_path(path)).map_err(|err| Mismatch::InvalidPath {
        path: path.to_string(),
        message: err.to_string(),
    })
}

/// Evaluates a single field check.
fn evaluate_field(document: &Value, check: &FieldCheck, vars: &Vars) -> Option<Mismatch> {
    let selected = match select_path(document, &check.path) {
        Ok(selected) => selected,
        Err(mismatch) => return Some(mismatch),
    };
    let path = check.path.clone();
    match &check.expectation {
        FieldExpectation::Absent => {
            (!selected.is_empty()).then_some(Mismatch::UnexpectedField {
                path,
            })
        }
        _ if selected.is_empty() => Some(Mismatch::MissingField {
            path,
        }),
        FieldExpectation::Present => None,
        FieldExpectation::NonEmpty => {
            selected.iter().all(|value| is_empty_value(value)).then_some(Mismatch::EmptyField {
                path,
            })
        }
        FieldExpectation::Equals(expected) => {
            let expected = match expected {
                Expected::Literal(value) => value.clone(),
                Expected::Var(name) => match vars.get(name) {
                    Some(value) => Value::String(value.clone()),
                    None => {
                        return Some(Mismatch::UnknownVariable {
                            name: name.clone(),
                        });
                    }
                },
            };
            let actual = selected[0];
            (!values_match(actual, &expected)).then(|| Mismatch::ValueMismatch {
                path,
                expected,
                actual: actual.clone(),
            })
        }
        FieldExpectation::Contains(needle) => {
            let found = collect_strings(&selected);
            (!found.iter().any(|text| text.contains(needle.as_str()))).then(|| {
                Mismatch::SubstringMissing {
                    path,
                    needle: needle.clone(),
                    found,
                }
            })
        }
    }
}

/// Returns true for null and empty strings, arrays, or objects.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Compares values, accepting numbers whose text equals an expected string.
fn values_match(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(number), Value::String(text)) => number.to_string() == *text,
        _ => actual == expected,
    }
}

/// Collects strings from selected values, flattening one array level.
fn collect_strings(selected: &[&Value]) -> Vec<String> {
    let mut found = Vec::new();
    for value in selected {
        match value {
            Value::String(text) => found.push(text.clone()),
            Value::Array(items) => {
                found.extend(items.iter().filter_map(Value::as_str).map(str::to_string));
            }
            _ => {}
        }
    }
    found
}

/// Truncates text for diagnostics on a char boundary.
fn excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(BODY_EXCERPT_CHARS).collect();
    if chars.next().is_some() { format!("{head}...") } else { head }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[path = "contract_tests.rs"]
mod tests;
