//! apisnap Core - schema snapshot reconciliation
//!
//! Keeps a committed, on-disk snapshot of a service's API schema in sync with
//! what the running service reports about itself, and decides whether a CI
//! gate passes.
//!
//! # Architecture
//!
//! ```text
//! SchemaFetcher ──► ReconciliationEngine ──► SchemaStore (write_if_changed)
//!                         │      │
//!                         │      └──► ValidationGate (per-role validity flag)
//!                         ▼
//!        snapshot - claims ──► SchemaStore (delete_stale)
//!                         │
//!                         ▼
//!               ReconciliationReport (pass / fail)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use apisnap_core::{ReconciliationEngine, SyncConfig, ValidationGate};
//! use apisnap_store::SchemaStore;
//!
//! # async fn example(fetcher: &dyn apisnap_core::SchemaFetcher) -> Result<(), Box<dyn std::error::Error>> {
//! let config = SyncConfig::new("doc/schemas");
//! let store = SchemaStore::open(&config.schema_dir)?;
//! let engine = ReconciliationEngine::new(store, ValidationGate::openapi(), config);
//!
//! let report = engine.run(fetcher).await?;
//! report.log_outcome(false);
//! std::process::exit(report.exit_code().into());
//! # }
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod model;
pub mod report;
pub mod validate;

// Re-exports for convenience
pub use config::{load_toml, ConfigError, SyncConfig};
pub use engine::{ReconciliationEngine, RoleOutcome};
pub use error::{SyncError, SyncResult};
pub use fetch::{list_methods, FetchError, SchemaFetcher};
pub use model::{is_declared, EndpointRole, MethodSchema, OpenApiDocument, VerbSchema};
pub use report::{ReconciliationReport, RoleReport, EXIT_DRIFT, EXIT_FATAL, EXIT_SUCCESS};
pub use validate::{OpenApiValidator, DocumentValidator, ValidationError, ValidationGate};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with apisnap
    pub use crate::{
        EndpointRole, FetchError, MethodSchema, OpenApiDocument, ReconciliationEngine,
        ReconciliationReport, SchemaFetcher, SyncConfig, SyncError, ValidationGate,
    };
    pub use apisnap_store::{MethodId, SchemaKind, SchemaStore, Verb};
}
