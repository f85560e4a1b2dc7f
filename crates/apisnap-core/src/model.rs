//! Service-side data model
//!
//! Endpoint roles, fetched OpenAPI documents and per-method schemas.

use crate::fetch::FetchError;
use apisnap_store::{MethodId, SchemaKind, Verb};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};

/// A service-facing scope with its own API surface
///
/// Each role is served under `/<prefix>/api` and yields one OpenAPI document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointRole {
    /// Human-readable role name
    pub name: String,
    /// URL path prefix; also qualifies the aggregate document file name
    pub prefix: String,
    /// Client identity used to reach this role, if any
    #[serde(default)]
    pub identity: Option<String>,
}

impl EndpointRole {
    /// Create role without a client identity
    #[must_use]
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            identity: None,
        }
    }

    /// With client identity
    #[must_use]
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Ordinary user frontend
    #[must_use]
    pub fn user() -> Self {
        Self::new("user", "app").with_identity("user0")
    }

    /// Node frontend
    #[must_use]
    pub fn node() -> Self {
        Self::new("node", "node")
    }

    /// Governance frontend for consortium members
    #[must_use]
    pub fn member() -> Self {
        Self::new("member", "gov").with_identity("member0")
    }

    /// Standard roles in processing order
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![Self::user(), Self::node(), Self::member()]
    }
}

impl Display for EndpointRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} (/{})", self.name, self.prefix)
    }
}

/// Whether a schema element counts as declared
///
/// `null`, `{}`, `[]` and `""` are treated as "not declared" and are never
/// persisted.
#[inline]
#[must_use]
pub fn is_declared(element: &Value) -> bool {
    match element {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(s) => !s.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// OpenAPI document as fetched from one role
///
/// Kept as raw JSON so it can be written and validated exactly as received.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenApiDocument {
    raw: Value,
}

impl OpenApiDocument {
    /// Wrap a fetched document
    ///
    /// # Errors
    /// Returns [`FetchError::Malformed`] if `paths` is missing or not an object.
    pub fn from_value(role: &EndpointRole, raw: Value) -> Result<Self, FetchError> {
        if !raw.get("paths").is_some_and(Value::is_object) {
            return Err(FetchError::malformed(
                role,
                format!("/{}/api", role.prefix),
                "document has no 'paths' object",
            ));
        }
        Ok(Self { raw })
    }

    /// Raw identifiers under `paths`, in document order
    #[must_use]
    pub fn list_methods(&self) -> Vec<String> {
        self.raw
            .get("paths")
            .and_then(Value::as_object)
            .map(|paths| paths.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Raw JSON
    #[inline]
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.raw
    }
}

/// Declared schemas of one verb
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerbSchema {
    /// Request parameter schema
    pub params: Option<Value>,
    /// Response schema
    pub result: Option<Value>,
}

impl VerbSchema {
    /// Declared element of the given kind, if any
    #[must_use]
    pub fn element(&self, kind: SchemaKind) -> Option<&Value> {
        let element = match kind {
            SchemaKind::Params => self.params.as_ref(),
            SchemaKind::Result => self.result.as_ref(),
        };
        element.filter(|v| is_declared(v))
    }
}

/// Schemas of one method, keyed by verb in response order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodSchema {
    verbs: IndexMap<Verb, VerbSchema>,
}

impl MethodSchema {
    /// Method with no declared verbs
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a schema response body
    ///
    /// An empty (or whitespace-only) body declares nothing. Otherwise the body
    /// must be an object mapping verb to `{params_schema, result_schema}`;
    /// missing fields are treated as absent.
    ///
    /// # Errors
    /// - [`FetchError::Malformed`] if the body is not such an object
    /// - [`FetchError::Layout`] if a verb is not an HTTP method token
    pub fn from_body(
        role: &EndpointRole,
        method: &MethodId,
        body: &[u8],
    ) -> Result<Self, FetchError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::empty());
        }
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| FetchError::malformed(role, schema_request_path(role, method), e.to_string()))?;
        Self::from_value(role, method, value)
    }

    /// Build from an already-decoded response
    ///
    /// # Errors
    /// Same as [`MethodSchema::from_body`].
    pub fn from_value(
        role: &EndpointRole,
        method: &MethodId,
        value: Value,
    ) -> Result<Self, FetchError> {
        let Value::Object(entries) = value else {
            return Err(FetchError::malformed(
                role,
                schema_request_path(role, method),
                "schema response is not an object",
            ));
        };

        let mut verbs = IndexMap::with_capacity(entries.len());
        for (raw_verb, element) in entries {
            let verb = Verb::parse(&raw_verb).map_err(|source| FetchError::Layout {
                role: role.name.clone(),
                source,
            })?;
            let Value::Object(mut fields) = element else {
                return Err(FetchError::malformed(
                    role,
                    schema_request_path(role, method),
                    format!("entry for verb '{raw_verb}' is not an object"),
                ));
            };
            let schema = VerbSchema {
                params: fields.remove(SchemaKind::Params.element_name()),
                result: fields.remove(SchemaKind::Result.element_name()),
            };
            verbs.insert(verb, schema);
        }

        Ok(Self { verbs })
    }

    /// Insert schemas for a verb
    pub fn insert(&mut self, verb: Verb, schema: VerbSchema) {
        self.verbs.insert(verb, schema);
    }

    /// Verbs and their schemas, in response order
    pub fn verbs(&self) -> impl Iterator<Item = (&Verb, &VerbSchema)> {
        self.verbs.iter()
    }

    /// Whether any verb declares at least one element
    #[must_use]
    pub fn declares_any(&self) -> bool {
        self.verbs
            .values()
            .any(|s| SchemaKind::ALL.iter().any(|k| s.element(*k).is_some()))
    }
}

/// Request path of a method schema query, for diagnostics
#[must_use]
pub fn schema_request_path(role: &EndpointRole, method: &MethodId) -> String {
    format!("/{}/api/schema?method=\"{method}\"", role.prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn method(raw: &str) -> MethodId {
        MethodId::normalize(raw).unwrap()
    }

    #[test]
    fn declared_elements() {
        assert!(!is_declared(&Value::Null));
        assert!(!is_declared(&json!({})));
        assert!(!is_declared(&json!([])));
        assert!(!is_declared(&json!("")));
        assert!(is_declared(&json!({"type": "object"})));
        assert!(is_declared(&json!(false)));
    }

    #[test]
    fn default_roles_in_order() {
        let prefixes: Vec<_> = EndpointRole::defaults()
            .into_iter()
            .map(|r| r.prefix)
            .collect();
        assert_eq!(prefixes, vec!["app", "node", "gov"]);
        assert_eq!(EndpointRole::member().identity.as_deref(), Some("member0"));
    }

    #[test]
    fn document_requires_paths() {
        let role = EndpointRole::node();
        assert!(OpenApiDocument::from_value(&role, json!({"openapi": "3.0.0"})).is_err());
        assert!(OpenApiDocument::from_value(&role, json!({"paths": []})).is_err());
    }

    #[test]
    fn document_lists_methods_in_order() {
        let role = EndpointRole::node();
        let doc = OpenApiDocument::from_value(
            &role,
            json!({"paths": {"/tx": {}, "/ledger/get": {}, "/api": {}}}),
        )
        .unwrap();
        assert_eq!(doc.list_methods(), vec!["/tx", "/ledger/get", "/api"]);
    }

    #[test]
    fn empty_body_declares_nothing() {
        let role = EndpointRole::node();
        let schema = MethodSchema::from_body(&role, &method("/tx"), b"").unwrap();
        assert_eq!(schema, MethodSchema::empty());
        assert!(!schema.declares_any());
    }

    #[test]
    fn body_parses_verbs_in_order() {
        let role = EndpointRole::node();
        let body = br#"{"POST": {"params_schema": {"type": "object"}, "result_schema": null},
                        "get": {"params_schema": {}, "result_schema": {"type": "string"}}}"#;
        let schema = MethodSchema::from_body(&role, &method("/tx"), body).unwrap();

        let verbs: Vec<_> = schema.verbs().map(|(v, _)| v.to_string()).collect();
        assert_eq!(verbs, vec!["POST", "GET"]);

        let (_, post) = schema.verbs().next().unwrap();
        assert!(post.element(SchemaKind::Params).is_some());
        assert!(post.element(SchemaKind::Result).is_none());
        assert!(schema.declares_any());
    }

    #[test]
    fn missing_fields_are_absent() {
        let role = EndpointRole::node();
        let schema =
            MethodSchema::from_value(&role, &method("/tx"), json!({"GET": {}})).unwrap();
        let (_, get) = schema.verbs().next().unwrap();
        assert_eq!(get, &VerbSchema::default());
    }

    #[test]
    fn invalid_bodies_are_malformed() {
        let role = EndpointRole::node();
        let m = method("/tx");
        assert!(matches!(
            MethodSchema::from_body(&role, &m, b"not json"),
            Err(FetchError::Malformed { .. })
        ));
        assert!(matches!(
            MethodSchema::from_value(&role, &m, json!({"GET": 1})),
            Err(FetchError::Malformed { .. })
        ));
        assert!(matches!(
            MethodSchema::from_value(&role, &m, json!({"G-T": {}})),
            Err(FetchError::Layout { .. })
        ));
    }
}
