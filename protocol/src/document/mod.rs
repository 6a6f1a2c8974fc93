//! # Documents
//!
//! A [`Document`] is the unit of replication: one signed value at one path,
//! written by one author at one instant. Documents are immutable. A "new
//! version" is a new document; the old one is only ever replaced wholesale in
//! the store's `(path, author)` slot.
//!
//! ## Ordering
//!
//! Every replica must pick the same winner for a path, so the ordering of
//! versions is spelled out explicitly instead of leaning on tuple ordering:
//!
//! ```text
//! a > b  iff  a.timestamp > b.timestamp
//!         or (a.timestamp == b.timestamp and a.signature > b.signature)
//! ```
//!
//! Signatures are compared as plain byte strings. The tiebreak is arbitrary
//! but total, which is all convergence needs.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

/// Errors produced while decoding or encoding a document as JSON.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Missing field, wrong primitive type, extra field, or not JSON at all.
    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A signed document.
///
/// The shape is strict: every field present, every field the right type, no
/// extras. In-process the compiler enforces that; at the JSON boundary
/// `deny_unknown_fields` does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    /// Schema tag, e.g. `tessera.1`. Selects the validator.
    pub format: String,
    /// Workspace address, e.g. `+gardenclub.xxxx`.
    pub workspace: String,
    pub path: String,
    pub value: String,
    /// Author address, e.g. `@suzy.6Bz9...`.
    pub author: String,
    /// Microseconds since the Unix epoch.
    pub timestamp: i64,
    /// Base58 Ed25519 signature over the document hash. Empty until signed.
    pub signature: String,
}

impl Document {
    /// Decode a document from JSON, enforcing the strict shape.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Total order of two versions: timestamp first, then signature.
    ///
    /// `Greater` means `self` is newer. Used for the per-author overwrite rule
    /// and for picking a path's winner; both must agree.
    pub fn cmp_version(&self, other: &Document) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.signature.as_bytes().cmp(other.signature.as_bytes()))
    }

    /// `true` if `self` strictly beats `other`.
    pub fn supersedes(&self, other: &Document) -> bool {
        self.cmp_version(other) == Ordering::Greater
    }
}

/// Current wall-clock time in document units (microseconds since the epoch).
pub fn now_micros() -> i64 {
    Utc::now().timestamp_micros()
}

/// What a caller hands to `set`: the store fills in author, workspace,
/// timestamp and signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocToSet {
    pub format: String,
    pub path: String,
    pub value: String,
    /// `None`, zero or negative means "now".
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl DocToSet {
    pub fn new(format: impl Into<String>, path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            path: path.into(),
            value: value.into(),
            timestamp: None,
        }
    }

    /// Pin the timestamp instead of reading the clock.
    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}
