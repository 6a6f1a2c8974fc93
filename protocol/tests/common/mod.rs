//! Fixtures shared by the integration tests.
//!
//! Every scenario takes a `make` function, so the same body runs against
//! `MemoryStorage` and a temporary `SledStorage`.

#![allow(dead_code)]

use tessera_protocol::crypto::keys::AuthorKeypair;
use tessera_protocol::document::DocToSet;
use tessera_protocol::storage::{MemoryStorage, SledStorage};
use tessera_protocol::validator::ValidatorRegistry;

pub const FORMAT: &str = "tessera.1";
pub const WORKSPACE: &str = "+gardenclub.xxxxxxxxxxxxxxxxxxxx";
pub const WORKSPACE2: &str = "+another.xxxxxxxxxxxxxxxxxxxx";

/// 2017-07-14, in microseconds. Old enough that nothing is "in the future".
pub const NOW: i64 = 1_500_000_000_000_000;

pub fn keypair1() -> AuthorKeypair {
    AuthorKeypair::from_seed("test", &[1u8; 32]).expect("keypair1")
}

pub fn keypair2() -> AuthorKeypair {
    AuthorKeypair::from_seed("twoo", &[2u8; 32]).expect("keypair2")
}

pub fn keypair3() -> AuthorKeypair {
    AuthorKeypair::from_seed("thre", &[3u8; 32]).expect("keypair3")
}

pub fn memory(workspace: &str) -> MemoryStorage {
    MemoryStorage::new(ValidatorRegistry::with_defaults(), workspace).expect("memory store")
}

pub fn sled_temp(workspace: &str) -> SledStorage {
    SledStorage::open_temporary(workspace).expect("temporary sled store")
}

pub fn doc(path: &str, value: &str, timestamp: i64) -> DocToSet {
    DocToSet::new(FORMAT, path, value).at(timestamp)
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn sorted(mut items: Vec<String>) -> Vec<String> {
    items.sort();
    items
}
