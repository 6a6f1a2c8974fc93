//! # Protocol Configuration & Constants
//!
//! Every magic number in tessera lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong.
//!
//! Several of these values are part of the replication contract: two replicas
//! that disagree on a timestamp bound or on the format tag will reject each
//! other's documents, and convergence quietly stops. Treat changes here as
//! protocol changes.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Document Formats
// ---------------------------------------------------------------------------

/// Format tag of the first (and currently only) document schema.
///
/// Stored verbatim in every document's `format` field and covered by the
/// signature, so a document can never be reinterpreted under another schema.
pub const FORMAT_V1: &str = "tessera.1";

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Smallest timestamp (microseconds since the Unix epoch) a valid document may
/// carry: 1970-04-26T17:46:40Z.
///
/// This is a sanity floor, not a protocol-negotiated value. Every real
/// microsecond timestamp since April 1970 sits above it, while a millisecond
/// timestamp mistakenly passed as microseconds stays below it until the year
/// 2286.
pub const MIN_TIMESTAMP: i64 = 10_000_000_000_000;

/// Largest timestamp a valid document may carry: 2^53 - 1.
///
/// Replicas written in languages whose only number type is an IEEE-754 double
/// cannot represent anything larger exactly, so larger values are treated as
/// corrupt.
pub const MAX_TIMESTAMP: i64 = 9_007_199_254_740_991;

/// How far into the future (relative to the local clock) an incoming
/// document's timestamp may be before it is rejected: ten minutes, in
/// microseconds.
pub const FUTURE_CUTOFF_MICROS: i64 = 10 * 60 * 1_000_000;

// ---------------------------------------------------------------------------
// Address Grammar
// ---------------------------------------------------------------------------

/// Sigil that starts every author address: `@suzy.<base58 pubkey>`.
pub const AUTHOR_SIGIL: char = '@';

/// Sigil that starts every workspace address: `+gardenclub.<suffix>`.
pub const WORKSPACE_SIGIL: char = '+';

/// Marker in a path that introduces an owner slot: `/about/~@suzy.../name`.
pub const OWNER_MARKER: char = '~';

/// Author short names are exactly this many characters. They are a
/// human-friendly hint only; the public key is the identity.
pub const AUTHOR_SHORTNAME_LENGTH: usize = 4;

/// Workspace names are at most this long.
pub const WORKSPACE_NAME_MAX_LENGTH: usize = 15;

/// Workspace suffixes are at most this long.
pub const WORKSPACE_SUFFIX_MAX_LENGTH: usize = 53;

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Ed25519 public keys are 32 bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Ed25519 secret seeds are 32 bytes.
pub const SECRET_KEY_LENGTH: usize = 32;

/// Ed25519 signatures are always 64 bytes.
pub const SIGNATURE_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Name of the sled tree holding one row per `(path, author)`.
pub const DOCS_TREE: &str = "docs";

/// Name of the sled tree holding store-level configuration.
pub const CONFIG_TREE: &str = "config";

/// Config key under which a durable store records its workspace.
pub const CONFIG_KEY_WORKSPACE: &str = "workspace";

/// Attempts made to open a sled directory whose file lock is still held.
///
/// sled releases the lock from its flusher thread shortly after the last
/// handle drops, so a reopen in the same process can briefly find it taken.
pub const SLED_LOCK_RETRIES: u32 = 100;

/// Pause between two attempts at a locked sled directory.
pub const SLED_LOCK_RETRY_DELAY: Duration = Duration::from_millis(20);
