// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # tessera: Core Library
//!
//! A replicated, multi-author document store. Every peer holds a full copy
//! of a workspace, writes signed documents into it, and reconciles with other
//! peers pairwise. No server, no consensus round, no coordinator: replicas
//! that have seen the same documents show the same data, full stop.
//!
//! Ed25519 for signatures, SHA-256 for document hashes, sled for the disk.
//! Nothing clever.
//!
//! ## Architecture
//!
//! - **crypto**: author keypairs, signing, verification, hashing.
//! - **identity**: author (`@suzy.…`) and workspace (`+garden.…`) addresses.
//! - **document**: the signed unit of replication and its version order.
//! - **validator**: path rules, write permission, canonical hash, checks.
//! - **storage**: the `Storage` contract plus in-memory and sled backends.
//! - **sync**: pairwise full-history exchange between two stores.
//! - **config**: protocol constants.
//!
//! ## Design Philosophy
//!
//! 1. Every write goes through one gate (`ingest_document`). Local `set` and
//!    replication take the same road, so they can't disagree.
//! 2. The winner of a path is computed, never stored.
//! 3. Rejection is normal. A store that refuses a forged or stale document
//!    returns `false`, not an error.
//! 4. No unsafe code. Anywhere.

pub mod config;
pub mod crypto;
pub mod document;
pub mod identity;
pub mod storage;
pub mod sync;
pub mod validator;

pub use crypto::keys::AuthorKeypair;
pub use document::{DocToSet, Document};
pub use storage::{MemoryStorage, Query, SledStorage, Storage, StorageError};
pub use sync::{sync, SyncDirection, SyncError, SyncOpts, SyncResults};
pub use validator::{ValidationError, Validator, ValidatorRegistry, ValidatorV1};
