//! Testing utilities for apisnap workspace
//!
//! Shared test helpers, fixtures, and assertions.

#![allow(missing_docs)]

use apisnap_core::{
    EndpointRole, FetchError, MethodSchema, OpenApiDocument, ReconciliationEngine, SchemaFetcher,
    DocumentValidator, SyncConfig, ValidationError, ValidationGate,
};
use apisnap_store::{MethodId, SchemaStore};
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

#[derive(Debug, Clone, Default)]
struct FakeRole {
    document: Option<Value>,
    paths: IndexMap<String, Map<String, Value>>,
    schemas: HashMap<String, Map<String, Value>>,
    document_status: Option<u16>,
    failing_methods: HashSet<String>,
}

/// In-memory service serving any number of role prefixes
///
/// Unknown prefixes answer 404, like a service without that frontend.
#[derive(Debug, Default)]
pub struct FakeFetcher {
    roles: HashMap<String, FakeRole>,
    requests: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn role_mut(&mut self, prefix: &str) -> &mut FakeRole {
        self.roles.entry(prefix.to_string()).or_default()
    }

    /// Declare a verb of a method with its params and result schemas
    pub fn with_method(
        mut self,
        prefix: &str,
        raw_method: &str,
        verb: &str,
        params: Value,
        result: Value,
    ) -> Self {
        let key = normalized(raw_method);
        let role = self.role_mut(prefix);
        role.paths.entry(raw_method.to_string()).or_default().insert(
            verb.to_ascii_lowercase(),
            json!({"responses": {"200": {"description": "Default response description"}}}),
        );
        role.schemas.entry(key).or_default().insert(
            verb.to_string(),
            json!({"params_schema": params, "result_schema": result}),
        );
        self
    }

    /// List a method whose schema request returns an empty body
    pub fn with_undeclared_method(mut self, prefix: &str, raw_method: &str) -> Self {
        self.role_mut(prefix)
            .paths
            .entry(raw_method.to_string())
            .or_default();
        self
    }

    /// Serve `document` verbatim instead of the generated one
    pub fn with_document(mut self, prefix: &str, document: Value) -> Self {
        self.role_mut(prefix).document = Some(document);
        self
    }

    /// Answer the role's document request with `status`
    pub fn failing_document(mut self, prefix: &str, status: u16) -> Self {
        self.role_mut(prefix).document_status = Some(status);
        self
    }

    /// Answer a method's schema request with 500
    pub fn failing_method(mut self, prefix: &str, raw_method: &str) -> Self {
        let key = normalized(raw_method);
        self.role_mut(prefix).failing_methods.insert(key);
        self
    }

    /// Requests served so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    fn record(&self, request: String) {
        self.requests.lock().push(request);
    }

    fn generated_document(prefix: &str, role: &FakeRole) -> Value {
        let paths: Map<String, Value> = role
            .paths
            .iter()
            .map(|(method, item)| (method.clone(), Value::Object(item.clone())))
            .collect();
        json!({
            "openapi": "3.0.0",
            "info": {"title": prefix, "version": "1.0.0"},
            "paths": paths,
        })
    }
}

#[async_trait]
impl SchemaFetcher for FakeFetcher {
    async fn document(&self, role: &EndpointRole) -> Result<OpenApiDocument, FetchError> {
        let path = format!("/{}/api", role.prefix);
        self.record(format!("GET {path}"));

        let Some(fake) = self.roles.get(&role.prefix) else {
            return Err(FetchError::status(role, path, 404));
        };
        if let Some(status) = fake.document_status {
            return Err(FetchError::status(role, path, status));
        }
        let document = fake
            .document
            .clone()
            .unwrap_or_else(|| Self::generated_document(&role.prefix, fake));
        OpenApiDocument::from_value(role, document)
    }

    async fn schema_for(
        &self,
        role: &EndpointRole,
        method: &MethodId,
    ) -> Result<MethodSchema, FetchError> {
        let path = format!("/{}/api/schema?method=\"{method}\"", role.prefix);
        self.record(format!("GET {path}"));

        let key = method.to_string();
        let Some(fake) = self.roles.get(&role.prefix) else {
            return Err(FetchError::status(role, path, 404));
        };
        if fake.failing_methods.contains(&key) {
            return Err(FetchError::status(role, path, 500));
        }
        match fake.schemas.get(&key) {
            Some(body) => MethodSchema::from_value(role, method, Value::Object(body.clone())),
            None => MethodSchema::from_body(role, method, b""),
        }
    }
}

fn normalized(raw_method: &str) -> String {
    raw_method.strip_prefix('/').unwrap_or(raw_method).to_string()
}

/// Checker that rejects every document
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAll;

impl DocumentValidator for RejectAll {
    fn validate(&self, _document: &Value) -> Result<(), ValidationError> {
        Err(ValidationError::NonConformant(vec![
            "rejected by test checker".to_string(),
        ]))
    }
}

/// Temporary schema root
#[derive(Debug)]
pub struct SchemaRoot {
    _dir: TempDir,
    root: PathBuf,
}

impl SchemaRoot {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let root = dir.path().join("schema");
        Self { _dir: dir, root }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn join(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn store(&self) -> SchemaStore {
        SchemaStore::open(&self.root).expect("open schema store")
    }

    /// Create a file (and its parents) with raw contents
    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.join(relative);
        fs::create_dir_all(path.parent().expect("file has parent")).expect("create parent dirs");
        fs::write(path, contents).expect("write file");
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.join(relative)).expect("read file")
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.join(relative).exists()
    }

    /// Every file under the root as a sorted, `/`-separated relative path
    ///
    /// A root that was never created holds no files.
    pub fn files(&self) -> Vec<String> {
        if !self.root.exists() {
            return Vec::new();
        }
        let mut files: Vec<String> = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .map(|entry| entry.expect("walk schema root"))
            .filter(|entry| !entry.file_type().is_dir())
            .map(|entry| {
                let relative = entry.path().strip_prefix(&self.root).expect("inside root");
                relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .collect();
        files.sort();
        files
    }

    /// Engine over this root with the structural OpenAPI checker
    pub fn engine(&self, roles: Vec<EndpointRole>) -> ReconciliationEngine {
        self.engine_with_gate(roles, ValidationGate::openapi())
    }

    pub fn engine_with_gate(
        &self,
        roles: Vec<EndpointRole>,
        gate: ValidationGate,
    ) -> ReconciliationEngine {
        let config = SyncConfig::new(&self.root)
            .with_roles(roles)
            .expect("valid test roles");
        ReconciliationEngine::new(self.store(), gate, config)
    }
}

impl Default for SchemaRoot {
    fn default() -> Self {
        Self::new()
    }
}

/// The three standard roles
pub fn standard_roles() -> Vec<EndpointRole> {
    EndpointRole::defaults()
}
