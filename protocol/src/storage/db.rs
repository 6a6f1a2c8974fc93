//! # SledStorage: Durable Replica
//!
//! A replica that survives restarts, built on sled's embedded key-value
//! store.
//!
//! ## Tree Layout
//!
//! | Tree     | Key                          | Value              |
//! |----------|------------------------------|--------------------|
//! | `docs`   | `path` ‖ `0x00` ‖ `author`   | `bincode(Document)`|
//! | `config` | key (UTF-8)                  | value (UTF-8)      |
//!
//! `0x00` can't appear in a valid path, so sled's byte order over these keys
//! is exactly `(path, author)` order. A path's rows are adjacent, and range
//! and prefix queries become range scans.
//!
//! `config` holds the workspace, written once at creation and checked on
//! every reopen.
//!
//! ## Atomicity
//!
//! The newer-than-existing check and the write happen inside one sled
//! transaction on `docs`, so two threads ingesting for the same row can't
//! both win.

use sled::transaction::{ConflictableTransactionError, TransactionError, TransactionResult};
use sled::{Db, Tree};
use std::collections::BTreeSet;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    check_new_store, ChangeEmitter, OpenMode, Query, Storage, StorageError, StorageOpts,
    StorageResult, StorageTarget,
};
use crate::config::{
    CONFIG_KEY_WORKSPACE, CONFIG_TREE, DOCS_TREE, SLED_LOCK_RETRIES, SLED_LOCK_RETRY_DELAY,
};
use crate::document::Document;
use crate::validator::ValidatorRegistry;

// ---------------------------------------------------------------------------
// Keys & Encoding
// ---------------------------------------------------------------------------

const KEY_SEPARATOR: u8 = 0x00;

fn doc_key(path: &str, author: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(path.len() + 1 + author.len());
    key.extend_from_slice(path.as_bytes());
    key.push(KEY_SEPARATOR);
    key.extend_from_slice(author.as_bytes());
    key
}

fn encode(doc: &Document) -> StorageResult<Vec<u8>> {
    bincode::serialize(doc).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode(bytes: &[u8]) -> StorageResult<Document> {
    bincode::deserialize(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// SledStorage
// ---------------------------------------------------------------------------

/// A durable replica of one workspace.
///
/// Clones are handles onto the same database. They share the storage id and
/// the subscriber list, and sled lets them read and write concurrently.
#[derive(Debug, Clone)]
pub struct SledStorage {
    id: Uuid,
    workspace: String,
    validators: ValidatorRegistry,
    db: Db,
    docs: Tree,
    config: Tree,
    emitter: ChangeEmitter,
}

impl SledStorage {
    /// Build a store according to `opts.mode`.
    ///
    /// | mode             | target must       | workspace                         |
    /// |------------------|-------------------|-----------------------------------|
    /// | `Create`         | not exist         | required, recorded                |
    /// | `Open`           | exist (no temp)   | optional, must match the recorded |
    /// | `CreateOrOpen`   | anything          | required, recorded or must match  |
    pub fn new(opts: StorageOpts) -> StorageResult<Self> {
        let StorageOpts {
            mode,
            workspace,
            validators,
            target,
        } = opts;

        if validators.is_empty() {
            return Err(StorageError::NoValidators);
        }

        let (db, workspace) = match mode {
            OpenMode::Create => {
                let workspace = workspace.ok_or(StorageError::MissingWorkspace(mode))?;
                check_new_store(&validators, &workspace)?;
                if let StorageTarget::Path(path) = &target {
                    if path.exists() {
                        return Err(StorageError::AlreadyExists(path.clone()));
                    }
                }
                let db = open_db(&target)?;
                set_config_in(&db, CONFIG_KEY_WORKSPACE, &workspace)?;
                (db, workspace)
            }
            OpenMode::Open => {
                let path = match &target {
                    StorageTarget::Temporary => return Err(StorageError::TemporaryOpen),
                    StorageTarget::Path(path) => path,
                };
                if !path.exists() {
                    return Err(StorageError::NotFound(path.clone()));
                }
                let db = open_db(&target)?;
                let stored = get_config_in(&db, CONFIG_KEY_WORKSPACE)?
                    .ok_or(StorageError::MissingStoredWorkspace)?;
                if let Some(requested) = workspace {
                    if requested != stored {
                        return Err(StorageError::WorkspaceMismatch { stored, requested });
                    }
                }
                (db, stored)
            }
            OpenMode::CreateOrOpen => {
                let workspace = workspace.ok_or(StorageError::MissingWorkspace(mode))?;
                check_new_store(&validators, &workspace)?;
                let db = open_db(&target)?;
                match get_config_in(&db, CONFIG_KEY_WORKSPACE)? {
                    Some(stored) if stored != workspace => {
                        return Err(StorageError::WorkspaceMismatch {
                            stored,
                            requested: workspace,
                        });
                    }
                    Some(_) => {}
                    None => set_config_in(&db, CONFIG_KEY_WORKSPACE, &workspace)?,
                }
                (db, workspace)
            }
        };

        let docs = db.open_tree(DOCS_TREE)?;
        let id = Uuid::new_v4();
        info!(%workspace, %mode, storage_id = %id, "opened sled store");

        Ok(Self {
            id,
            workspace,
            validators,
            docs,
            config: db.open_tree(CONFIG_TREE)?,
            db,
            emitter: ChangeEmitter::new(),
        })
    }

    /// A fresh in-memory sled store with the default validators.
    pub fn open_temporary(workspace: &str) -> StorageResult<Self> {
        Self::new(StorageOpts::create(workspace, StorageTarget::Temporary))
    }

    pub fn get_config(&self, key: &str) -> StorageResult<Option<String>> {
        read_config(&self.config, key)
    }

    pub fn set_config(&self, key: &str, value: &str) -> StorageResult<()> {
        self.config.insert(key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Block until everything written so far is on disk.
    pub fn flush(&self) -> StorageResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

fn open_db(target: &StorageTarget) -> StorageResult<Db> {
    let path = match target {
        StorageTarget::Temporary => return Ok(sled::Config::new().temporary(true).open()?),
        StorageTarget::Path(path) => path,
    };

    let mut attempt = 0;
    loop {
        match sled::open(path) {
            Ok(db) => return Ok(db),
            Err(e) if is_lock_held(&e) => {
                if attempt >= SLED_LOCK_RETRIES {
                    return Err(StorageError::Locked(path.clone()));
                }
                attempt += 1;
                debug!(path = %path.display(), attempt, "sled lock still held, retrying");
                std::thread::sleep(SLED_LOCK_RETRY_DELAY);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// sled reports a held directory lock as a plain IO error; only the message
/// tells it apart.
fn is_lock_held(err: &sled::Error) -> bool {
    matches!(err, sled::Error::Io(io) if io.to_string().contains("could not acquire lock"))
}

fn read_config(config: &Tree, key: &str) -> StorageResult<Option<String>> {
    match config.get(key.as_bytes())? {
        Some(bytes) => String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|e| StorageError::Serialization(e.to_string())),
        None => Ok(None),
    }
}

fn get_config_in(db: &Db, key: &str) -> StorageResult<Option<String>> {
    read_config(&db.open_tree(CONFIG_TREE)?, key)
}

fn set_config_in(db: &Db, key: &str, value: &str) -> StorageResult<()> {
    db.open_tree(CONFIG_TREE)?
        .insert(key.as_bytes(), value.as_bytes())?;
    Ok(())
}

impl Storage for SledStorage {
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
        let scan = match query.scan_start() {
            Some(start) => self.docs.range(start.as_bytes()..),
            None => self.docs.iter(),
        };

        // Rows arrive grouped by path; cut a group whenever the path changes.
        let mut groups: Vec<Vec<Document>> = Vec::new();
        let mut current: Vec<Document> = Vec::new();
        for entry in scan {
            let (_, bytes) = entry?;
            let doc = decode(&bytes)?;
            if query.scan_done(&doc.path) {
                break;
            }
            if !query.matches_path(&doc.path) {
                continue;
            }
            if current.first().is_some_and(|d| d.path != doc.path) {
                groups.push(std::mem::take(&mut current));
            }
            current.push(doc);
        }
        if !current.is_empty() {
            groups.push(current);
        }

        let out = query.select(groups);
        debug!(rows = out.len(), "sled query");
        Ok(out)
    }

    fn authors(&self) -> StorageResult<Vec<String>> {
        let mut authors = BTreeSet::new();
        for entry in self.docs.iter() {
            let (key, _) = entry?;
            // Author is everything after the first 0x00.
            if let Some(sep) = key.iter().position(|b| *b == KEY_SEPARATOR) {
                let author = std::str::from_utf8(&key[sep + 1..])
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                authors.insert(author.to_string());
            }
        }
        Ok(authors.into_iter().collect())
    }

    fn upsert_if_newer(&self, doc: Document) -> StorageResult<bool> {
        let key = doc_key(&doc.path, &doc.author);
        let bytes = encode(&doc)?;

        let result: TransactionResult<bool, String> = self.docs.transaction(|tx| {
            if let Some(existing) = tx.get(key.as_slice())? {
                let existing: Document = bincode::deserialize(&existing)
                    .map_err(|e| ConflictableTransactionError::Abort(e.to_string()))?;
                if !doc.supersedes(&existing) {
                    return Ok(false);
                }
            }
            tx.insert(key.as_slice(), bytes.as_slice())?;
            Ok(true)
        });

        match result {
            Ok(written) => Ok(written),
            Err(TransactionError::Abort(reason)) => Err(StorageError::Serialization(reason)),
            Err(TransactionError::Storage(e)) => Err(e.into()),
        }
    }
}
