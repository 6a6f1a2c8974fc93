//! # Storage Module
//!
//! A store owns one workspace's documents and is the only place a document
//! gets in. Local writes and replicated writes both go through
//! [`Storage::ingest_document`], so two replicas that ingest the same set of
//! documents end up with the same winners, whatever the order.
//!
//! ## Layout
//!
//! ```text
//! query.rs    Query filters and the shared winner/ordering rules
//! emitter.rs  change notification
//! memory.rs   MemoryStorage: BTreeMap behind a RwLock
//! db.rs       SledStorage: sled trees on disk
//! ```
//!
//! ## What a store keeps
//!
//! One row per `(path, author)`: that author's newest document at that path.
//! Different authors at the same path coexist, and the path's *winner* is
//! picked at read time, never stored.
//!
//! ## Design Decisions
//!
//! 1. **Rejection is not an error.** Replication throws stale, duplicate and
//!    forged documents at a store all day. `ingest_document` returns
//!    `Ok(false)` for those and keeps `Err` for a broken disk.
//!
//! 2. **Backends do as little as possible.** A backend answers "give me the
//!    rows for these paths" and "write this row if it's newer". Everything
//!    else is a provided method on the trait, written once.
//!
//! 3. **Check-then-write is atomic per row.** Memory holds its write lock
//!    across the comparison; sled runs it in a transaction.

pub mod db;
pub mod emitter;
pub mod memory;
pub mod query;

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::crypto::keys::AuthorKeypair;
use crate::document::{now_micros, DocToSet, Document};
use crate::identity::{parse_workspace_address, AddressError};
use crate::sync::{SyncError, SyncOpts, SyncResults};
use crate::validator::ValidatorRegistry;

pub use db::SledStorage;
pub use emitter::{ChangeEmitter, Unsubscribe};
pub use memory::MemoryStorage;
pub use query::Query;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors from building a store or from its backend.
///
/// Construction errors are final: no half-built store is ever returned.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("at least one validator is required")]
    NoValidators,

    #[error("invalid workspace address {workspace:?}: {source}")]
    InvalidWorkspace {
        workspace: String,
        #[source]
        source: AddressError,
    },

    #[error("a workspace is required in {0} mode")]
    MissingWorkspace(OpenMode),

    #[error("workspace mismatch: store holds {stored}, caller asked for {requested}")]
    WorkspaceMismatch { stored: String, requested: String },

    #[error("a store already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("no store exists at {0}")]
    NotFound(PathBuf),

    #[error("store at {0} is still locked by another handle")]
    Locked(PathBuf),

    #[error("store has no workspace recorded")]
    MissingStoredWorkspace,

    #[error("a temporary store can only be created, not opened")]
    TemporaryOpen,

    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// ---------------------------------------------------------------------------
// Construction Options
// ---------------------------------------------------------------------------

/// How a durable store treats what is already at its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Target must be empty; workspace required.
    Create,
    /// Target must hold a store; an optional workspace is checked against it.
    Open,
    /// Adopt an existing store if its workspace matches, else create one.
    #[default]
    CreateOrOpen,
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Open => write!(f, "open"),
            Self::CreateOrOpen => write!(f, "create-or-open"),
        }
    }
}

/// Where a durable store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    /// In memory, gone on drop. Handy for tests.
    Temporary,
    Path(PathBuf),
}

/// Everything needed to build a durable store.
#[derive(Debug, Clone)]
pub struct StorageOpts {
    pub mode: OpenMode,
    pub workspace: Option<String>,
    pub validators: ValidatorRegistry,
    pub target: StorageTarget,
}

impl StorageOpts {
    pub fn create(workspace: impl Into<String>, target: StorageTarget) -> Self {
        Self {
            mode: OpenMode::Create,
            workspace: Some(workspace.into()),
            validators: ValidatorRegistry::with_defaults(),
            target,
        }
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            mode: OpenMode::Open,
            workspace: None,
            validators: ValidatorRegistry::with_defaults(),
            target: StorageTarget::Path(path.into()),
        }
    }

    pub fn create_or_open(workspace: impl Into<String>, target: StorageTarget) -> Self {
        Self {
            mode: OpenMode::CreateOrOpen,
            workspace: Some(workspace.into()),
            validators: ValidatorRegistry::with_defaults(),
            target,
        }
    }

    pub fn with_validators(mut self, validators: ValidatorRegistry) -> Self {
        self.validators = validators;
        self
    }
}

/// Checks shared by every backend's constructor.
pub(crate) fn check_new_store(
    validators: &ValidatorRegistry,
    workspace: &str,
) -> StorageResult<()> {
    if validators.is_empty() {
        return Err(StorageError::NoValidators);
    }
    parse_workspace_address(workspace).map_err(|source| StorageError::InvalidWorkspace {
        workspace: workspace.to_string(),
        source,
    })?;
    Ok(())
}

// ---------------------------------------------------------------------------
// The Storage Contract
// ---------------------------------------------------------------------------

/// One replica of one workspace.
///
/// Backends implement the required methods; everything else is shared.
pub trait Storage: Send + Sync {
    /// Random per-store id. Handles onto the same underlying store share it.
    fn storage_id(&self) -> Uuid;

    fn workspace(&self) -> &str;

    fn validators(&self) -> &ValidatorRegistry;

    fn change_emitter(&self) -> &ChangeEmitter;

    /// Rows matching `query`, ordered by path, then newest first.
    fn documents(&self, query: &Query) -> StorageResult<Vec<Document>>;

    /// Every author with at least one stored row, sorted.
    fn authors(&self) -> StorageResult<Vec<String>>;

    /// Store `doc` as the `(path, author)` row unless the existing row is
    /// the same or newer. Returns whether it was written.
    ///
    /// Must be atomic: no other write to the same row may land between the
    /// comparison and the write. Validation is the caller's job.
    fn upsert_if_newer(&self, doc: Document) -> StorageResult<bool>;

    // -- Provided -----------------------------------------------------------

    /// The one way in for a document, local or remote.
    ///
    /// `Ok(true)` if accepted; `Ok(false)` if unknown format, invalid, for
    /// another workspace, or not newer than what this author already has
    /// here. Subscribers are notified once per accepted document.
    fn ingest_document(&self, doc: Document, future_cutoff: Option<i64>) -> StorageResult<bool> {
        let Some(validator) = self.validators().get(&doc.format) else {
            warn!(format = %doc.format, path = %doc.path, "rejected document: unknown format");
            return Ok(false);
        };

        if let Err(reason) = validator.check_document(&doc, future_cutoff) {
            warn!(path = %doc.path, author = %doc.author, %reason, "rejected document");
            return Ok(false);
        }

        if doc.workspace != self.workspace() {
            warn!(
                path = %doc.path,
                doc_workspace = %doc.workspace,
                store_workspace = %self.workspace(),
                "rejected document: workspace mismatch"
            );
            return Ok(false);
        }

        let (path, author) = (doc.path.clone(), doc.author.clone());
        if !self.upsert_if_newer(doc)? {
            debug!(%path, %author, "ignored document: stale or duplicate");
            return Ok(false);
        }

        debug!(%path, %author, "accepted document");
        self.change_emitter().emit();
        Ok(true)
    }

    /// Sign and ingest a new value as `keypair`.
    ///
    /// The timestamp is nudged past the current winner at the path, so a
    /// local write always becomes the new winner here, even if that puts it
    /// slightly ahead of the clock.
    fn set(&self, keypair: &AuthorKeypair, to_set: DocToSet) -> StorageResult<bool> {
        let Some(validator) = self.validators().get(&to_set.format).cloned() else {
            warn!(format = %to_set.format, path = %to_set.path, "refused set: unknown format");
            return Ok(false);
        };

        let mut timestamp = match to_set.timestamp {
            Some(ts) if ts > 0 => ts,
            _ => now_micros(),
        };
        if let Some(winner) = self.get_document(&to_set.path)? {
            timestamp = timestamp.max(winner.timestamp.saturating_add(1));
        }

        let doc = validator.sign_document(
            keypair,
            Document {
                format: to_set.format,
                workspace: self.workspace().to_string(),
                path: to_set.path,
                value: to_set.value,
                author: keypair.address().to_string(),
                timestamp,
                signature: String::new(),
            },
        );

        // The nudge may push past now + window; pin the cutoff to this write.
        self.ingest_document(doc, Some(timestamp))
    }

    /// Distinct paths of `documents(query)`; `limit` counts paths, not rows.
    fn paths(&self, query: &Query) -> StorageResult<Vec<String>> {
        let limit = query.limit.unwrap_or(usize::MAX);
        let unlimited = Query {
            limit: None,
            ..query.clone()
        };

        let mut paths: Vec<String> = Vec::new();
        for doc in self.documents(&unlimited)? {
            if paths.last() == Some(&doc.path) {
                continue;
            }
            if paths.len() >= limit {
                break;
            }
            paths.push(doc.path);
        }
        Ok(paths)
    }

    /// The `value` of each row of `documents(query)`, same order.
    fn values(&self, query: &Query) -> StorageResult<Vec<String>> {
        Ok(self
            .documents(query)?
            .into_iter()
            .map(|doc| doc.value)
            .collect())
    }

    /// The winner at `path`.
    fn get_document(&self, path: &str) -> StorageResult<Option<Document>> {
        Ok(self.documents(&Query::at_path(path))?.into_iter().next())
    }

    fn get_value(&self, path: &str) -> StorageResult<Option<String>> {
        Ok(self.get_document(path)?.map(|doc| doc.value))
    }

    /// Call `callback` after every accepted document.
    fn subscribe<F>(&self, callback: F) -> Unsubscribe
    where
        Self: Sized,
        F: Fn() + Send + Sync + 'static,
    {
        self.change_emitter().subscribe(callback)
    }

    /// Exchange documents with `other`. See [`crate::sync::sync`].
    fn sync(&self, other: &dyn Storage, opts: &SyncOpts) -> Result<SyncResults, SyncError>
    where
        Self: Sized,
    {
        crate::sync::sync(self, other, opts)
    }
}
