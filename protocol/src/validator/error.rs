use thiserror::Error;

/// Why a document failed validation.
///
/// One variant per validity rule, reported in the order the rules are
/// checked. Rejection is routine in a multi-writer system, so this error is
/// mostly for logs: stores turn it into `Ok(false)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The document's format tag is not the one this validator handles.
    #[error("unsupported format {found:?} (expected {expected:?})")]
    UnsupportedFormat { expected: String, found: String },

    /// A string field contains something other than printable ASCII.
    #[error("field `{field}` contains non-printable or non-ASCII characters")]
    NonPrintableField { field: &'static str },

    /// The path breaks the path grammar.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// The author does not own the path.
    #[error("author {author} may not write to {path}")]
    NoWritePermission { author: String, path: String },

    /// Below the floor; usually a millisecond timestamp passed as micros.
    #[error("timestamp {timestamp} is below the minimum {min}")]
    TimestampTooSmall { timestamp: i64, min: i64 },

    /// Beyond the largest exactly representable integer in a double.
    #[error("timestamp {timestamp} exceeds the maximum {max}")]
    TimestampTooLarge { timestamp: i64, max: i64 },

    #[error("timestamp {timestamp} is after the cutoff {cutoff}")]
    TimestampInFuture { timestamp: i64, cutoff: i64 },

    /// The signature does not verify against the author's key.
    #[error("signature does not verify for author {author}")]
    InvalidSignature { author: String },
}
