//! Deterministic file naming for schema snapshots
//!
//! Provides [`MethodId`], [`Verb`] and [`SchemaKind`], the three coordinates of
//! a per-method schema file, and [`SchemaLayout`] which maps them to paths
//! under a schema root.

use crate::error::LayoutError;
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Separator used inside method identifiers
pub const METHOD_SEPARATOR: char = '/';

/// Suffix of every file written by the store
pub const FILE_EXTENSION: &str = "json";

/// Normalized method identifier
///
/// Built from a raw identifier as reported by the service by stripping exactly
/// one leading separator. Remaining separators become directories on disk.
///
/// # Examples
/// - `/ledger/get` → `["ledger", "get"]`
/// - `tx` → `["tx"]`
/// - `/log/` → `["log", ""]`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodId(Vec<String>);

impl MethodId {
    /// Normalize a raw method identifier
    ///
    /// # Errors
    /// - [`LayoutError::EmptyMethod`] if nothing remains after stripping
    /// - [`LayoutError::InvalidSegment`] for `.` or `..` segments, or an
    ///   empty segment anywhere but the end
    pub fn normalize(raw: &str) -> Result<Self, LayoutError> {
        let stripped = raw.strip_prefix(METHOD_SEPARATOR).unwrap_or(raw);
        if stripped.is_empty() {
            return Err(LayoutError::EmptyMethod);
        }

        let count = stripped.split(METHOD_SEPARATOR).count();
        let segments = stripped
            .split(METHOD_SEPARATOR)
            .enumerate()
            .map(|(index, seg)| match seg {
                // A trailing separator leaves an empty file name stem
                "" if index + 1 == count => Ok(String::new()),
                "" | "." | ".." => Err(LayoutError::InvalidSegment {
                    method: raw.to_string(),
                    segment: seg.to_string(),
                }),
                // Interior NUL and backslash would alias or break the on-disk path
                s if s.contains(['\0', '\\']) => Err(LayoutError::InvalidSegment {
                    method: raw.to_string(),
                    segment: seg.to_string(),
                }),
                s => Ok(s.to_string()),
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Directory segments (everything but the last)
    #[inline]
    #[must_use]
    pub fn directories(&self) -> &[String] {
        &self.0[..self.0.len() - 1]
    }

    /// Last segment, used as the file name stem
    #[inline]
    #[must_use]
    pub fn leaf(&self) -> &str {
        // normalize() guarantees at least one segment
        &self.0[self.0.len() - 1]
    }
}

impl Display for MethodId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl FromStr for MethodId {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

/// HTTP verb token, stored uppercase
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Verb(String);

impl Verb {
    /// Parse a verb token as reported by the service
    ///
    /// # Errors
    /// Returns [`LayoutError::InvalidVerb`] unless the token is non-empty ASCII letters.
    pub fn parse(raw: &str) -> Result<Self, LayoutError> {
        if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(LayoutError::InvalidVerb(raw.to_string()));
        }
        Ok(Self(raw.to_ascii_uppercase()))
    }

    /// Uppercase token
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Verb {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Verb {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Which half of a method signature a schema file describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SchemaKind {
    /// Request parameters
    Params,
    /// Response body
    Result,
}

impl SchemaKind {
    /// All kinds, in processing order
    pub const ALL: [SchemaKind; 2] = [SchemaKind::Params, SchemaKind::Result];

    /// Token used in file names
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaKind::Params => "params",
            SchemaKind::Result => "result",
        }
    }

    /// Field name of this kind in a method schema response
    #[inline]
    #[must_use]
    pub fn element_name(self) -> &'static str {
        match self {
            SchemaKind::Params => "params_schema",
            SchemaKind::Result => "result_schema",
        }
    }
}

impl Display for SchemaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps schema coordinates to paths under a root directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaLayout {
    root: PathBuf,
}

impl SchemaLayout {
    /// Create layout rooted at `root`
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Schema root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of one per-method schema file
    ///
    /// `<root>/<method dirs>/<leaf>_<VERB>_<kind>.json`. Not namespaced by role.
    #[must_use]
    pub fn path_for(&self, verb: &Verb, method: &MethodId, kind: SchemaKind) -> PathBuf {
        let mut path = self.root.clone();
        for dir in method.directories() {
            path.push(dir);
        }
        path.push(format!(
            "{}_{}_{}.{FILE_EXTENSION}",
            method.leaf(),
            verb,
            kind
        ));
        path
    }

    /// Path of the aggregate document for a role prefix
    #[must_use]
    pub fn aggregate_path(&self, prefix: &str) -> PathBuf {
        self.root.join(format!("{prefix}_openapi.{FILE_EXTENSION}"))
    }

    /// Check that `path` lies strictly inside the root
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        path != self.root && path.starts_with(&self.root)
    }
}
