use apisnap_core::{EndpointRole, SyncError, ValidationGate, EXIT_DRIFT, EXIT_SUCCESS};
use apisnap_test_utils::{standard_roles, FakeFetcher, RejectAll, SchemaRoot};
use pretty_assertions::assert_eq;
use serde_json::json;

fn node_service() -> FakeFetcher {
    FakeFetcher::new()
        .with_method("node", "/ledger/get", "GET", json!({}), json!({"type": "object"}))
        .with_method(
            "node",
            "/tx",
            "POST",
            json!({"type": "object", "properties": {"id": {"type": "string"}}}),
            json!({"type": "string"}),
        )
        .with_undeclared_method("node", "/api")
}

#[tokio::test]
async fn first_run_materializes_schema_and_fails() {
    let root = SchemaRoot::new();
    let engine = root.engine(vec![EndpointRole::node()]);

    let report = engine.run(&node_service()).await.unwrap();

    assert_eq!(
        root.files(),
        vec![
            "ledger/get_GET_result.json",
            "node_openapi.json",
            "tx_POST_params.json",
            "tx_POST_result.json",
        ]
    );
    assert_eq!(root.read("ledger/get_GET_result.json"), "{\n  \"type\": \"object\"\n}");
    assert_eq!(report.changed.len(), 4);
    assert_eq!(report.claimed, 4);
    assert!(report.removed.is_empty());
    assert!(report.documents_valid());
    assert_eq!(report.exit_code(), EXIT_DRIFT);
}

#[tokio::test]
async fn second_run_is_idempotent() {
    let root = SchemaRoot::new();
    let engine = root.engine(vec![EndpointRole::node()]);

    engine.run(&node_service()).await.unwrap();
    let report = engine.run(&node_service()).await.unwrap();

    assert!(report.changed.is_empty());
    assert!(report.removed.is_empty());
    assert!(report.passed());
    assert_eq!(report.exit_code(), EXIT_SUCCESS);
}

#[tokio::test]
async fn methods_are_partitioned_by_declared_schema() {
    let root = SchemaRoot::new();
    let engine = root.engine(vec![EndpointRole::node()]);

    let report = engine.run(&node_service()).await.unwrap();
    let node = &report.roles[0];

    let with: Vec<_> = node.with_schema.iter().cloned().collect();
    let without: Vec<_> = node.without_schema.iter().cloned().collect();
    assert_eq!(with, vec!["ledger/get", "tx"]);
    assert_eq!(without, vec!["api"]);
    assert!(node.with_schema.is_disjoint(&node.without_schema));
    assert_eq!(node.discovered, vec!["/ledger/get", "/tx", "/api"]);
}

#[tokio::test]
async fn stale_files_and_empty_directories_are_removed() {
    let root = SchemaRoot::new();
    root.write("old/deep/gone_GET_result.json", "{}");
    root.write("ledger/removed_GET_params.json", "{}");
    let engine = root.engine(vec![EndpointRole::node()]);

    let report = engine.run(&node_service()).await.unwrap();

    assert!(!root.exists("old"));
    assert!(!root.exists("ledger/removed_GET_params.json"));
    // Still holds a claimed file
    assert!(root.exists("ledger/get_GET_result.json"));
    assert_eq!(report.removed.len(), 2);
    assert!(root.path().is_dir());
}

#[tokio::test]
async fn removing_everything_keeps_the_root() {
    let root = SchemaRoot::new();
    root.write("only/file_GET_result.json", "{}");
    let engine = root.engine(vec![EndpointRole::node()]);
    let service = FakeFetcher::new().with_undeclared_method("node", "/api");

    engine.run(&service).await.unwrap();

    assert_eq!(root.files(), vec!["node_openapi.json"]);
}

#[tokio::test]
async fn empty_schema_elements_are_never_kept() {
    let root = SchemaRoot::new();
    // A params file from a time when the method still declared params
    root.write("ledger/get_GET_params.json", "{\n  \"type\": \"object\"\n}");
    let engine = root.engine(vec![EndpointRole::node()]);

    let report = engine.run(&node_service()).await.unwrap();

    assert!(!root.exists("ledger/get_GET_params.json"));
    assert_eq!(
        report.removed,
        vec![root.join("ledger/get_GET_params.json")]
    );
}

#[tokio::test]
async fn null_elements_are_not_written() {
    let root = SchemaRoot::new();
    let engine = root.engine(vec![EndpointRole::node()]);
    let service = FakeFetcher::new().with_method("node", "/commit", "GET", json!(null), json!([]));

    let report = engine.run(&service).await.unwrap();

    assert_eq!(root.files(), vec!["node_openapi.json"]);
    assert!(report.roles[0].without_schema.contains("commit"));
}

#[tokio::test]
async fn invalid_document_still_writes_files() {
    let valid_root = SchemaRoot::new();
    let invalid_root = SchemaRoot::new();

    let valid = valid_root
        .engine(vec![EndpointRole::node()])
        .run(&node_service())
        .await
        .unwrap();
    let invalid = invalid_root
        .engine_with_gate(vec![EndpointRole::node()], ValidationGate::new(RejectAll))
        .run(&node_service())
        .await
        .unwrap();

    assert_eq!(valid_root.files(), invalid_root.files());
    assert_eq!(valid.changed.len(), invalid.changed.len());
    assert!(valid.documents_valid());
    assert!(!invalid.documents_valid());
}

#[tokio::test]
async fn invalid_document_fails_an_otherwise_clean_run() {
    let root = SchemaRoot::new();
    root.engine(vec![EndpointRole::node()])
        .run(&node_service())
        .await
        .unwrap();

    let report = root
        .engine_with_gate(vec![EndpointRole::node()], ValidationGate::new(RejectAll))
        .run(&node_service())
        .await
        .unwrap();

    assert!(!report.made_changes());
    assert_eq!(report.exit_code(), EXIT_DRIFT);
}

#[tokio::test]
async fn ledger_method_materializes_then_passes() {
    let root = SchemaRoot::new();
    let engine = root.engine(vec![EndpointRole::node()]);
    let service =
        FakeFetcher::new().with_method("node", "/ledger/get", "GET", json!({}), json!({"type": "object"}));

    let first = engine.run(&service).await.unwrap();
    assert_eq!(root.files(), vec!["ledger/get_GET_result.json", "node_openapi.json"]);
    assert!(!first.passed());

    let second = engine.run(&service).await.unwrap();
    assert!(second.passed());
}

#[tokio::test]
async fn roles_are_processed_in_order() {
    let root = SchemaRoot::new();
    let engine = root.engine(standard_roles());
    let service = FakeFetcher::new()
        .with_method("app", "/log", "POST", json!({"type": "object"}), json!(null))
        .with_undeclared_method("node", "/api")
        .with_method("gov", "/proposals", "POST", json!({"type": "object"}), json!({"type": "string"}));

    engine.run(&service).await.unwrap();

    assert_eq!(
        service.requests(),
        vec![
            "GET /app/api",
            "GET /app/api/schema?method=\"log\"",
            "GET /node/api",
            "GET /node/api/schema?method=\"api\"",
            "GET /gov/api",
            "GET /gov/api/schema?method=\"proposals\"",
        ]
    );
    assert_eq!(
        root.files(),
        vec![
            "app_openapi.json",
            "gov_openapi.json",
            "log_POST_params.json",
            "node_openapi.json",
            "proposals_POST_params.json",
            "proposals_POST_result.json",
        ]
    );
}

#[tokio::test]
async fn file_shared_by_two_roles_is_not_deleted() {
    let root = SchemaRoot::new();
    let engine = root.engine(vec![EndpointRole::user(), EndpointRole::node()]);
    let service = FakeFetcher::new()
        .with_method("app", "/api", "GET", json!({}), json!({"type": "object"}))
        .with_method("node", "/api", "GET", json!({}), json!({"type": "object"}));

    engine.run(&service).await.unwrap();
    let report = engine.run(&service).await.unwrap();

    assert!(root.exists("api_GET_result.json"));
    assert!(report.removed.is_empty());
    assert!(report.passed());
}

#[tokio::test]
async fn later_role_overwrites_colliding_file() {
    let root = SchemaRoot::new();
    let engine = root.engine(vec![EndpointRole::user(), EndpointRole::node()]);
    let service = FakeFetcher::new()
        .with_method("app", "/api", "GET", json!({}), json!({"type": "object"}))
        .with_method("node", "/api", "GET", json!({}), json!({"type": "string"}));

    let report = engine.run(&service).await.unwrap();

    assert_eq!(root.read("api_GET_result.json"), "{\n  \"type\": \"string\"\n}");
    // One claim for the shared file plus two aggregates
    assert_eq!(report.claimed, 3);
}

#[tokio::test]
async fn document_failure_aborts_the_run() {
    let root = SchemaRoot::new();
    root.write("stale_GET_result.json", "{}");
    let engine = root.engine(standard_roles());
    let service = node_service().failing_document("app", 403);

    let err = engine.run(&service).await.unwrap_err();

    assert!(matches!(err, SyncError::Fetch(_)));
    assert!(root.exists("stale_GET_result.json"));
    assert_eq!(service.requests(), vec!["GET /app/api"]);
}

#[tokio::test]
async fn method_failure_aborts_the_run() {
    let root = SchemaRoot::new();
    let engine = root.engine(vec![EndpointRole::node()]);
    let service = node_service().failing_method("node", "/tx");

    let err = engine.run(&service).await.unwrap_err();

    assert!(err.to_string().contains("returned status 500"));
    // Written before the failure and kept for the next run to reconcile
    assert!(root.exists("ledger/get_GET_result.json"));
    assert!(!root.exists("node_openapi.json"));
}

#[tokio::test]
async fn aggregate_document_tracks_service_changes() {
    let root = SchemaRoot::new();
    let engine = root.engine(vec![EndpointRole::node()]);
    engine.run(&node_service()).await.unwrap();
    let before = root.read("node_openapi.json");

    let changed = node_service().with_method("node", "/commit", "GET", json!({}), json!({"type": "integer"}));
    let report = engine.run(&changed).await.unwrap();

    assert_ne!(root.read("node_openapi.json"), before);
    assert_eq!(
        report.changed,
        vec![root.join("commit_GET_result.json"), root.join("node_openapi.json")]
    );
}

#[tokio::test]
async fn non_canonical_file_is_rewritten() {
    let root = SchemaRoot::new();
    root.write("tx_POST_result.json", "{\"type\":\"string\"}\n");
    let engine = root.engine(vec![EndpointRole::node()]);

    let report = engine.run(&node_service()).await.unwrap();

    assert!(report.changed.contains(&root.join("tx_POST_result.json")));
    assert_eq!(root.read("tx_POST_result.json"), "{\n  \"type\": \"string\"\n}");
}

#[tokio::test]
async fn trailing_separator_method_is_reconciled() {
    let root = SchemaRoot::new();
    let engine = root.engine(vec![EndpointRole::node()]);
    let service = FakeFetcher::new()
        .with_method("node", "/log/", "GET", json!({}), json!({"type": "object"}))
        .with_method("node", "/tx", "GET", json!({}), json!({"type": "string"}));

    let first = engine.run(&service).await.unwrap();
    assert_eq!(
        root.files(),
        vec!["log/_GET_result.json", "node_openapi.json", "tx_GET_result.json"]
    );
    assert!(first.roles[0].with_schema.contains("log/"));
    assert!(service
        .requests()
        .contains(&"GET /node/api/schema?method=\"log/\"".to_string()));

    let second = engine.run(&service).await.unwrap();
    assert!(second.passed());
}
