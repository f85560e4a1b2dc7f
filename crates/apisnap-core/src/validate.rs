//! OpenAPI conformance gate
//!
//! Conformance never blocks writes. The gate only turns a checker's verdict
//! into a per-role validity flag; every failure (including a broken checker)
//! becomes `false` and a log line.

use crate::model::EndpointRole;
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

const OPENAPI_SCHEMA_SOURCE: &str = include_str!("../schemas/openapi-3.0.json");

static OPENAPI_SCHEMA: Lazy<Result<JSONSchema, String>> = Lazy::new(|| {
    let schema: Value = serde_json::from_str(OPENAPI_SCHEMA_SOURCE).map_err(|e| e.to_string())?;
    JSONSchema::compile(&schema).map_err(|e| e.to_string())
});

const OPERATION_VERBS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// A document failed conformance checking
///
/// Recoverable: the engine records it as a validity flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Document violates the OpenAPI schema
    NonConformant(Vec<String>),
    /// The checker itself failed
    Internal(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NonConformant(violations) => {
                write!(f, "{} violation(s): {}", violations.len(), violations.join("; "))
            }
            ValidationError::Internal(message) => write!(f, "validator failure: {message}"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Checks a raw document for OpenAPI conformance
pub trait DocumentValidator: Send + Sync {
    /// Validate a fetched document
    ///
    /// # Errors
    /// Returns [`ValidationError`] describing why the document is not conformant.
    fn validate(&self, document: &Value) -> Result<(), ValidationError>;
}

/// Structural OpenAPI 3.x checker
///
/// Validates against an embedded JSON Schema of the document structure and
/// requires `operationId` values to be unique.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenApiValidator;

impl OpenApiValidator {
    fn duplicate_operation_ids(document: &Value) -> Vec<String> {
        let mut seen: HashMap<&str, String> = HashMap::new();
        let mut violations = Vec::new();

        let Some(paths) = document.get("paths").and_then(Value::as_object) else {
            return violations;
        };
        for (path, item) in paths {
            for verb in OPERATION_VERBS {
                let Some(id) = item
                    .get(verb)
                    .and_then(|op| op.get("operationId"))
                    .and_then(Value::as_str)
                else {
                    continue;
                };
                let location = format!("{verb} {path}");
                if let Some(first) = seen.get(id) {
                    violations.push(format!(
                        "operationId '{id}' of {location} duplicates {first}"
                    ));
                } else {
                    seen.insert(id, location);
                }
            }
        }
        violations
    }
}

impl DocumentValidator for OpenApiValidator {
    fn validate(&self, document: &Value) -> Result<(), ValidationError> {
        let compiled = OPENAPI_SCHEMA
            .as_ref()
            .map_err(|e| ValidationError::Internal(e.clone()))?;

        let mut violations: Vec<String> = match compiled.validate(document) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|e| format!("{} at {}", e, e.instance_path))
                .collect(),
        };
        violations.extend(Self::duplicate_operation_ids(document));

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::NonConformant(violations))
        }
    }
}

/// Turns checker verdicts into validity flags
pub struct ValidationGate {
    validator: Box<dyn DocumentValidator>,
}

impl ValidationGate {
    /// Gate over a custom checker
    #[must_use]
    pub fn new(validator: impl DocumentValidator + 'static) -> Self {
        Self {
            validator: Box::new(validator),
        }
    }

    /// Gate over the structural OpenAPI checker
    #[must_use]
    pub fn openapi() -> Self {
        Self::new(OpenApiValidator)
    }

    /// Check a role's document
    ///
    /// Returns `true` when conformant. Failures are logged, never propagated.
    #[must_use]
    pub fn check(&self, role: &EndpointRole, document: &Value) -> bool {
        match self.validator.validate(document) {
            Ok(()) => {
                tracing::debug!("Validation of {} schema passed", role.prefix);
                true
            }
            Err(e) => {
                tracing::error!("Validation of {} schema failed", role.prefix);
                tracing::error!("{}", e);
                false
            }
        }
    }
}

impl Default for ValidationGate {
    fn default() -> Self {
        Self::openapi()
    }
}

impl fmt::Debug for ValidationGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationGate").finish_non_exhaustive()
    }
}
