//! # Cryptographic Primitives for tessera
//!
//! Every signature and every hash in the protocol flows through here.
//!
//! We deliberately chose boring, well-audited cryptography:
//!
//! - **Ed25519** for author signatures. Fast, deterministic, and nobody has
//!   broken it.
//! - **SHA-256** for document hashes, because every other replica on every
//!   other platform already has it.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. Everything here is a thin wrapper around audited crates. If
//! you're tempted to optimize these functions, please reconsider.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{sha256, sha256_hex};
pub use keys::{AuthorKeypair, KeyError};
pub use signatures::{generate_keypair, sign, sign_with_secret, verify};
