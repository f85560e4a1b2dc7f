//! Reconciliation engine
//!
//! Converges the schema root onto what the live service reports:
//! 1. Snapshot every file under the root
//! 2. For each role in order: fetch, write canonical files, claim their paths,
//!    check the document
//! 3. Delete `snapshot - claims` once, after every role
//! 4. Fold everything into a [`ReconciliationReport`]
//!
//! Deletion never interleaves with claiming, so a path claimed by any role is
//! never removed even when two roles produce the same method-level file.

use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::fetch::{FetchError, SchemaFetcher};
use crate::model::{EndpointRole, OpenApiDocument};
use crate::report::{ReconciliationReport, RoleReport};
use crate::validate::ValidationGate;
use apisnap_store::{canonical, MethodId, SchemaKind, SchemaStore, StoreError};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// What one role pass produced
#[derive(Debug, Clone)]
pub struct RoleOutcome {
    /// Paths written or confirmed, in processing order
    pub claimed: Vec<PathBuf>,
    /// Paths whose content changed
    pub changed: Vec<PathBuf>,
    /// Reportable summary
    pub report: RoleReport,
}

impl RoleOutcome {
    fn new(role: &EndpointRole) -> Self {
        Self {
            claimed: Vec::new(),
            changed: Vec::new(),
            report: RoleReport {
                role: role.name.clone(),
                prefix: role.prefix.clone(),
                with_schema: BTreeSet::new(),
                without_schema: BTreeSet::new(),
                discovered: Vec::new(),
                document_valid: false,
                document_digest: String::new(),
            },
        }
    }

    /// Place a method in exactly one of the has-schema / no-schema sets
    ///
    /// A method reported twice (e.g. `/a` and `a`) has a schema if any of its
    /// listings declared one.
    fn record_method(&mut self, method: &MethodId, has_schema: bool) {
        let key = method.to_string();
        if has_schema {
            self.report.without_schema.remove(&key);
            self.report.with_schema.insert(key);
        } else if !self.report.with_schema.contains(&key) {
            self.report.without_schema.insert(key);
        }
    }

    fn record_write(&mut self, path: PathBuf, changed: bool) {
        if changed {
            self.changed.push(path.clone());
        }
        self.claimed.push(path);
    }
}

/// Drives fetch → store → validate for every configured role
#[derive(Debug)]
pub struct ReconciliationEngine {
    store: SchemaStore,
    gate: ValidationGate,
    config: SyncConfig,
}

impl ReconciliationEngine {
    /// Create engine
    #[inline]
    #[must_use]
    pub fn new(store: SchemaStore, gate: ValidationGate, config: SyncConfig) -> Self {
        Self {
            store,
            gate,
            config,
        }
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &SchemaStore {
        &self.store
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run a full reconciliation against a live service
    ///
    /// # Errors
    /// Any [`crate::SyncError`] aborts the run immediately. Files already
    /// written stay on disk and no stale file is deleted.
    pub async fn run<F>(&self, fetcher: &F) -> SyncResult<ReconciliationReport>
    where
        F: SchemaFetcher + ?Sized,
    {
        let snapshot = self.store.snapshot()?;
        tracing::info!(
            "Reconciling {} existing files under {}",
            snapshot.len(),
            self.store.root().display()
        );

        let mut claims: BTreeSet<PathBuf> = BTreeSet::new();
        let mut changed = Vec::new();
        let mut roles = Vec::with_capacity(self.config.roles().len());

        for role in self.config.roles() {
            tracing::info!("{} frontend", role.name);
            let outcome = self.reconcile_role(fetcher, role).await?;

            for path in outcome.claimed {
                if claims.contains(&path) {
                    tracing::debug!("{} claimed again by role {}", path.display(), role.name);
                } else {
                    claims.insert(path);
                }
            }
            changed.extend(outcome.changed);
            roles.push(outcome.report);
        }

        let stale: Vec<&Path> = snapshot
            .difference(&claims)
            .map(PathBuf::as_path)
            .collect();
        let removed = self.store.delete_stale(stale)?;

        Ok(ReconciliationReport::new(
            self.store.root().to_path_buf(),
            claims.len(),
            changed,
            removed,
            roles,
        ))
    }

    /// Fetch one role and materialize its schema files
    ///
    /// # Errors
    /// Fatal fetch or store errors; validation failures only clear the
    /// outcome's validity flag.
    pub async fn reconcile_role<F>(
        &self,
        fetcher: &F,
        role: &EndpointRole,
    ) -> SyncResult<RoleOutcome>
    where
        F: SchemaFetcher + ?Sized,
    {
        let document = fetcher.document(role).await?;
        let mut outcome = RoleOutcome::new(role);

        for raw in document.list_methods() {
            let method = MethodId::normalize(&raw).map_err(|source| FetchError::Layout {
                role: role.name.clone(),
                source,
            })?;
            outcome.report.discovered.push(raw);

            let schema = fetcher.schema_for(role, &method).await?;
            let mut has_schema = false;

            for (verb, verb_schema) in schema.verbs() {
                for kind in SchemaKind::ALL {
                    let Some(element) = verb_schema.element(kind) else {
                        continue;
                    };
                    let path = self.store.layout().path_for(verb, &method, kind);
                    let write = self.store.write_if_changed(&path, element)?;
                    outcome.record_write(path, write.is_change());
                    has_schema = true;
                }
            }

            outcome.record_method(&method, has_schema);
        }

        let aggregate = self.store.layout().aggregate_path(&role.prefix);
        let write = self.store.write_if_changed(&aggregate, document.as_value())?;
        outcome.report.document_digest = digest(&aggregate, &document)?;
        outcome.record_write(aggregate, write.is_change());

        outcome.report.document_valid = self.gate.check(role, document.as_value());

        tracing::info!(
            "{}: {} methods with schema, {} without",
            role.name,
            outcome.report.with_schema.len(),
            outcome.report.without_schema.len()
        );
        Ok(outcome)
    }
}

fn digest(path: &Path, document: &OpenApiDocument) -> Result<String, StoreError> {
    let rendered = canonical::render(document.as_value()).map_err(|e| StoreError::encode(path, e))?;
    Ok(hex::encode(Sha256::digest(&rendered)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockSchemaFetcher;
    use crate::model::MethodSchema;
    use serde_json::json;
    use tempfile::TempDir;

    fn engine(dir: &TempDir, roles: Vec<EndpointRole>) -> ReconciliationEngine {
        let store = SchemaStore::open(dir.path().join("schema")).unwrap();
        let config = SyncConfig::new(store.root()).with_roles(roles).unwrap();
        ReconciliationEngine::new(store, ValidationGate::openapi(), config)
    }

    fn document(role: &EndpointRole) -> Result<OpenApiDocument, FetchError> {
        OpenApiDocument::from_value(
            role,
            json!({
                "openapi": "3.0.0",
                "info": {"title": role.name, "version": "1.0.0"},
                "paths": {"/tx": {"get": {"responses": {"200": {"description": "ok"}}}}}
            }),
        )
    }

    #[test]
    fn record_method_keeps_sets_disjoint() {
        let mut outcome = RoleOutcome::new(&EndpointRole::node());
        let method = MethodId::normalize("/a").unwrap();

        outcome.record_method(&method, false);
        outcome.record_method(&method, true);
        outcome.record_method(&method, false);

        assert!(outcome.report.with_schema.contains("a"));
        assert!(outcome.report.without_schema.is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_on_later_role_is_fatal_and_deletes_nothing() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, vec![EndpointRole::node(), EndpointRole::member()]);
        let stale = engine.store().root().join("old_GET_result.json");
        std::fs::write(&stale, "{}").unwrap();

        let mut fetcher = MockSchemaFetcher::new();
        fetcher.expect_document().returning(|role| {
            if role.prefix == "gov" {
                Err(FetchError::status(role, "/gov/api", 500))
            } else {
                document(role)
            }
        });
        fetcher.expect_schema_for().returning(|role, method| {
            MethodSchema::from_value(
                role,
                method,
                json!({"GET": {"params_schema": null, "result_schema": {"type": "string"}}}),
            )
        });

        let result = engine.run(&fetcher).await;

        assert!(matches!(
            result,
            Err(crate::SyncError::Fetch(FetchError::Status { status: 500, .. }))
        ));
        assert!(stale.exists());
        assert!(engine.store().root().join("tx_GET_result.json").exists());
        assert!(engine.store().root().join("node_openapi.json").exists());
    }

    #[tokio::test]
    async fn schema_request_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, vec![EndpointRole::node()]);

        let mut fetcher = MockSchemaFetcher::new();
        fetcher.expect_document().returning(document);
        fetcher
            .expect_schema_for()
            .times(1)
            .returning(|role, _| Err(FetchError::transport(role, "/node/api/schema", "reset")));

        let result = engine.run(&fetcher).await;
        assert!(matches!(
            result,
            Err(crate::SyncError::Fetch(FetchError::Transport { .. }))
        ));
    }

    #[tokio::test]
    async fn traversal_method_is_rejected_before_any_request() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, vec![EndpointRole::node()]);

        let mut fetcher = MockSchemaFetcher::new();
        fetcher.expect_document().returning(|role| {
            OpenApiDocument::from_value(role, json!({"paths": {"/../escape": {}}}))
        });
        fetcher.expect_schema_for().never();

        let result = engine.run(&fetcher).await;
        assert!(matches!(
            result,
            Err(crate::SyncError::Fetch(FetchError::Layout { .. }))
        ));
    }
}
