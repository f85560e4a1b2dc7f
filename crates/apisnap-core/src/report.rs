//! Outcome aggregation
//!
//! Folds role outcomes, writes and deletions into one pass/fail decision.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Exit status when the snapshot is current and every document is valid
pub const EXIT_SUCCESS: u8 = 0;

/// Exit status when files were added, changed or removed, or a document is invalid
pub const EXIT_DRIFT: u8 = 1;

/// Exit status when the run aborted (fetch, filesystem or configuration error)
pub const EXIT_FATAL: u8 = 2;

/// Per-role summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleReport {
    /// Role name
    pub role: String,
    /// Role path prefix
    pub prefix: String,
    /// Normalized methods with at least one declared schema element
    pub with_schema: BTreeSet<String>,
    /// Normalized methods with none
    pub without_schema: BTreeSet<String>,
    /// Raw identifiers as reported, in document order
    pub discovered: Vec<String>,
    /// Whether the document passed conformance checking
    pub document_valid: bool,
    /// SHA-256 of the canonical aggregate document
    pub document_digest: String,
}

/// Result of one reconciliation run
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    /// Schema root directory
    pub schema_root: PathBuf,
    /// When the run finished
    pub generated_at: DateTime<Utc>,
    /// Number of distinct paths claimed by the run
    pub claimed: usize,
    /// Files created or rewritten, in write order
    pub changed: Vec<PathBuf>,
    /// Stale files removed
    pub removed: Vec<PathBuf>,
    /// Per-role summaries, in processing order
    pub roles: Vec<RoleReport>,
}

impl ReconciliationReport {
    /// Assemble report
    #[must_use]
    pub fn new(
        schema_root: PathBuf,
        claimed: usize,
        changed: Vec<PathBuf>,
        removed: Vec<PathBuf>,
        roles: Vec<RoleReport>,
    ) -> Self {
        Self {
            schema_root,
            generated_at: Utc::now(),
            claimed,
            changed,
            removed,
            roles,
        }
    }

    /// Whether the on-disk tree differed from the live service
    #[inline]
    #[must_use]
    pub fn made_changes(&self) -> bool {
        !self.changed.is_empty() || !self.removed.is_empty()
    }

    /// Whether every role's document passed conformance checking
    #[inline]
    #[must_use]
    pub fn documents_valid(&self) -> bool {
        self.roles.iter().all(|r| r.document_valid)
    }

    /// Check if the gate passes
    #[inline]
    #[must_use]
    pub fn passed(&self) -> bool {
        !self.made_changes() && self.documents_valid()
    }

    /// Process exit status for this outcome
    #[inline]
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        if self.passed() {
            EXIT_SUCCESS
        } else {
            EXIT_DRIFT
        }
    }

    /// Deduplicated, sorted raw identifiers across all roles
    #[must_use]
    pub fn discovered_methods(&self) -> BTreeSet<&str> {
        self.roles
            .iter()
            .flat_map(|r| r.discovered.iter().map(String::as_str))
            .collect()
    }

    /// Emit the diagnostic log for this run
    pub fn log_outcome(&self, list_all: bool) {
        if !self.removed.is_empty() {
            tracing::warn!("Removed old files which are no longer reported by the service:");
            for path in &self.removed {
                tracing::warn!("  {}", path.display());
            }
        }

        if !self.changed.is_empty() {
            tracing::warn!("Made changes to the following schema files:");
            for path in &self.changed {
                tracing::warn!("  {}", path.display());
            }
        }

        for role in self.roles.iter().filter(|r| !r.document_valid) {
            tracing::error!("Document of role {} (/{}) is not valid", role.role, role.prefix);
        }

        if list_all {
            tracing::info!("Discovered methods:");
            for method in self.discovered_methods() {
                tracing::info!("  {}", method);
            }
        }

        if self.passed() {
            tracing::info!("Schema snapshot is up to date ({} files)", self.claimed);
        }
    }

    /// Generate text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        let _ = writeln!(report, "=== Schema Snapshot Report ===\n");
        let _ = writeln!(report, "Schema Root: {}", self.schema_root.display());
        let _ = writeln!(report, "Files Claimed: {}", self.claimed);
        let _ = writeln!(report, "Files Changed: {}", self.changed.len());
        let _ = writeln!(report, "Files Removed: {}", self.removed.len());

        for role in &self.roles {
            let _ = writeln!(
                report,
                "Role {} (/{}): {} with schema, {} without, document {}",
                role.role,
                role.prefix,
                role.with_schema.len(),
                role.without_schema.len(),
                if role.document_valid { "valid" } else { "INVALID" }
            );
        }

        let _ = write!(
            report,
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        );

        report
    }
}
