//! # Replica Synchronization
//!
//! Two stores of the same workspace swap everything they have, and each
//! keeps whatever its own ingest rules accept.
//!
//! ## Protocol Overview
//!
//! ```text
//! local                              remote
//! ─────                              ──────
//!   │  documents(history)              │
//!   │<──────────────────────────────── │   pull: ingest each into local
//!   │                                  │
//!   │  documents(history)              │
//!   │ ────────────────────────────────>│   push: ingest each into remote
//! ```
//!
//! ## Design Decisions
//!
//! - **Full history, every time.** Each direction ships every stored row.
//!   O(total documents) per call, which is correct but not incremental. A
//!   since-timestamp cursor would fix that and is not here yet.
//!
//! - **Ingest is the only judge.** Sync doesn't compare anything itself; it
//!   just offers documents. Stale and duplicate documents are refused by the
//!   receiving store, which is what makes a second sync report zero.
//!
//! - **No lock spans a sync.** Each ingest stands alone. Ingestion is
//!   commutative per `(path, author)`, so concurrent writers during a sync
//!   can't break convergence, only delay it until the next round.
//!
//! - **Live mode fails loudly.** Continuous replication is not implemented,
//!   and quietly doing a one-shot sync instead would be a lie.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::storage::{Query, Storage, StorageError};

// ---------------------------------------------------------------------------
// SyncOpts
// ---------------------------------------------------------------------------

/// Which way documents flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    /// Remote → local only.
    Pull,
    /// Local → remote only.
    Push,
    /// Pull, then push.
    #[default]
    Both,
}

impl SyncDirection {
    fn pulls(self) -> bool {
        matches!(self, Self::Pull | Self::Both)
    }

    fn pushes(self) -> bool {
        matches!(self, Self::Push | Self::Both)
    }
}

/// Knobs for one sync call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOpts {
    pub direction: SyncDirection,
    /// Exchange the documents both sides already hold. Turning this off
    /// leaves nothing to do until live mode exists.
    pub existing: bool,
    /// Keep syncing forever. Not implemented; asking for it is an error.
    pub live: bool,
}

impl Default for SyncOpts {
    fn default() -> Self {
        Self {
            direction: SyncDirection::Both,
            existing: true,
            live: false,
        }
    }
}

impl SyncOpts {
    pub fn direction(direction: SyncDirection) -> Self {
        Self {
            direction,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// SyncResults / SyncError
// ---------------------------------------------------------------------------

/// How many documents each side accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResults {
    /// Accepted by the remote.
    pub num_pushed: usize,
    /// Accepted by the local store.
    pub num_pulled: usize,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("live sync is not implemented")]
    LiveNotImplemented,

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

// ---------------------------------------------------------------------------
// sync
// ---------------------------------------------------------------------------

/// Offer every document of `source` to `dest`; count what `dest` accepts.
fn transfer(source: &dyn Storage, dest: &dyn Storage) -> Result<usize, StorageError> {
    let mut accepted = 0;
    for doc in source.documents(&Query::history())? {
        if dest.ingest_document(doc, None)? {
            accepted += 1;
        }
    }
    Ok(accepted)
}

/// Reconcile `local` and `remote`.
///
/// Zero counts, nothing touched, when the two are the same store, belong to
/// different workspaces, or `existing` is off. `live` is an error.
///
/// # Example
///
/// ```
/// use tessera_protocol::crypto::keys::AuthorKeypair;
/// use tessera_protocol::document::DocToSet;
/// use tessera_protocol::storage::{MemoryStorage, Storage};
/// use tessera_protocol::sync::{sync, SyncOpts};
/// use tessera_protocol::validator::ValidatorRegistry;
///
/// let ws = "+gardenclub.xxxxxxxxxxxxxxxxxxxx";
/// let a = MemoryStorage::new(ValidatorRegistry::with_defaults(), ws).unwrap();
/// let b = MemoryStorage::new(ValidatorRegistry::with_defaults(), ws).unwrap();
/// let suzy = AuthorKeypair::generate("suzy").unwrap();
/// a.set(&suzy, DocToSet::new("tessera.1", "/hello", "world")).unwrap();
///
/// let results = sync(&a, &b, &SyncOpts::default()).unwrap();
/// assert_eq!(results.num_pushed, 1);
/// assert_eq!(b.get_value("/hello").unwrap().as_deref(), Some("world"));
/// ```
pub fn sync(
    local: &dyn Storage,
    remote: &dyn Storage,
    opts: &SyncOpts,
) -> Result<SyncResults, SyncError> {
    if local.storage_id() == remote.storage_id() {
        debug!(storage_id = %local.storage_id(), "sync with self skipped");
        return Ok(SyncResults::default());
    }
    if local.workspace() != remote.workspace() {
        debug!(
            local = %local.workspace(),
            remote = %remote.workspace(),
            "sync across workspaces skipped"
        );
        return Ok(SyncResults::default());
    }
    if opts.live {
        return Err(SyncError::LiveNotImplemented);
    }
    if !opts.existing {
        return Ok(SyncResults::default());
    }

    let mut results = SyncResults::default();
    if opts.direction.pulls() {
        results.num_pulled = transfer(remote, local)?;
        debug!(pulled = results.num_pulled, "pull finished");
    }
    if opts.direction.pushes() {
        results.num_pushed = transfer(local, remote)?;
        debug!(pushed = results.num_pushed, "push finished");
    }

    info!(
        workspace = %local.workspace(),
        pushed = results.num_pushed,
        pulled = results.num_pulled,
        "sync complete"
    );
    Ok(results)
}
