//! `MemoryStorage`: the whole workspace in a `BTreeMap`.
//!
//! `path → (author → document)`. The outer map is ordered, so range and
//! prefix queries are a `range` call away; the inner map holds at most one
//! row per author.

use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use tracing::info;
use uuid::Uuid;

use super::{check_new_store, ChangeEmitter, Query, Storage, StorageResult};
use crate::document::Document;
use crate::validator::ValidatorRegistry;

type Rows = BTreeMap<String, BTreeMap<String, Document>>;

/// An in-process replica. Nothing survives a drop.
///
/// Thread-safe: reads share the lock, `upsert_if_newer` takes it exclusively.
pub struct MemoryStorage {
    id: Uuid,
    workspace: String,
    validators: ValidatorRegistry,
    docs: RwLock<Rows>,
    emitter: ChangeEmitter,
}

impl MemoryStorage {
    /// An empty store for `workspace`.
    ///
    /// Fails if `validators` is empty or `workspace` is not a valid
    /// workspace address.
    pub fn new(validators: ValidatorRegistry, workspace: &str) -> StorageResult<Self> {
        check_new_store(&validators, workspace)?;
        let id = Uuid::new_v4();
        info!(%workspace, storage_id = %id, "created in-memory store");
        Ok(Self {
            id,
            workspace: workspace.to_string(),
            validators,
            docs: RwLock::new(BTreeMap::new()),
            emitter: ChangeEmitter::new(),
        })
    }

    /// Number of stored rows across all paths and authors.
    pub fn len(&self) -> usize {
        self.docs.read().values().map(|by_author| by_author.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn storage_id(&self) -> Uuid {
        self.id
    }

    fn workspace(&self) -> &str {
        &self.workspace
    }

    fn validators(&self) -> &ValidatorRegistry {
        &self.validators
    }

    fn change_emitter(&self) -> &ChangeEmitter {
        &self.emitter
    }

    fn documents(&self, query: &Query) -> StorageResult<Vec<Document>> {
        let docs = self.docs.read();
        let start = match query.scan_start() {
            Some(start) => Bound::Included(start),
            None => Bound::Unbounded,
        };
        let groups = docs
            .range::<str, _>((start, Bound::Unbounded))
            .take_while(|(path, _)| !query.scan_done(path))
            .filter(|(path, _)| query.matches_path(path))
            .map(|(_, by_author)| by_author.values().cloned().collect());
        Ok(query.select(groups))
    }

    fn authors(&self) -> StorageResult<Vec<String>> {
        let docs = self.docs.read();
        let authors: BTreeSet<&String> = docs
            .values()
            .flat_map(|by_author| by_author.keys())
            .collect();
        Ok(authors.into_iter().cloned().collect())
    }

    fn upsert_if_newer(&self, doc: Document) -> StorageResult<bool> {
        let mut docs = self.docs.write();
        let by_author = docs.entry(doc.path.clone()).or_default();
        if let Some(existing) = by_author.get(&doc.author) {
            if !doc.supersedes(existing) {
                return Ok(false);
            }
        }
        by_author.insert(doc.author.clone(), doc);
        Ok(true)
    }
}
