//! # Identity Module
//!
//! The two kinds of address that appear inside documents:
//!
//! 1. **Author addresses**: `@suzy.<base58 public key>`. Derived from an
//!    Ed25519 public key; the four-character short name is a human hint and
//!    carries no authority.
//! 2. **Workspace addresses**: `+gardenclub.<suffix>`. A namespace fixed when
//!    a store is created; documents never cross workspaces.
//!
//! Both grammars are pure ASCII, so they can sit inside paths and signed text
//! without escaping.

pub mod author;
pub mod workspace;

use thiserror::Error;

pub use author::{
    encode_author_address, looks_like_author_address, parse_author_address,
    validate_short_name, ParsedAuthor,
};
pub use workspace::{parse_workspace_address, ParsedWorkspace};

/// Errors produced while parsing an author or workspace address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The address does not start with the expected sigil.
    #[error("address must start with '{expected}'")]
    MissingSigil { expected: char },

    /// The address lacks the single `.` separating its two halves.
    #[error("address must contain exactly one '.' separator")]
    MissingSeparator,

    /// The author short name breaks the grammar.
    #[error("invalid author short name: {0:?}")]
    InvalidShortName(String),

    /// The public-key half is not valid base58.
    #[error("public key is not valid base58")]
    InvalidKeyEncoding,

    /// The public-key half decodes to the wrong number of bytes.
    #[error("public key must be 32 bytes, got {got}")]
    InvalidKeyLength { got: usize },

    /// The public-key bytes are not a valid Ed25519 point.
    #[error("public key is not a valid Ed25519 point")]
    InvalidPublicKey,

    /// The workspace name breaks the grammar.
    #[error("invalid workspace name: {0:?}")]
    InvalidWorkspaceName(String),

    /// The workspace suffix breaks the grammar.
    #[error("invalid workspace suffix: {0:?}")]
    InvalidWorkspaceSuffix(String),
}

/// `[a-z0-9]`, the alphabet of short names and workspace segments.
pub(crate) fn is_lower_alnum(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}
