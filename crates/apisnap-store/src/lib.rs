//! apisnap Schema Store
//!
//! Canonical on-disk representation of a service's API schema snapshot.
//!
//! # Core Concepts
//!
//! - [`SchemaLayout`]: pure mapping of (verb, method, kind) to a file path
//! - [`SchemaStore`]: snapshot, conditional write and stale deletion
//! - [`canonical::render`]: the byte format every file is compared against
//!
//! # Example
//!
//! ```rust,ignore
//! use apisnap_store::{MethodId, SchemaKind, SchemaStore, Verb};
//!
//! let store = SchemaStore::open("doc/schemas")?;
//! let method = MethodId::normalize("/ledger/get")?;
//! let path = store
//!     .layout()
//!     .path_for(&Verb::parse("GET")?, &method, SchemaKind::Result);
//! let outcome = store.write_if_changed(&path, &serde_json::json!({"type": "object"}))?;
//! ```

#![warn(unreachable_pub)]

pub mod canonical;
mod error;
mod layout;
mod store;

pub use error::{LayoutError, StoreError, StoreResult};
pub use layout::{MethodId, SchemaKind, SchemaLayout, Verb, FILE_EXTENSION, METHOD_SEPARATOR};
pub use store::{SchemaStore, WriteOutcome};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
