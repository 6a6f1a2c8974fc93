//! `tessera.1`: the first document format.
//!
//! ## Hash layout
//!
//! The signed hash is SHA-256 over one line per content field, each
//! length-prefixed so that no choice of field contents can make two
//! different documents encode to the same bytes:
//!
//! ```text
//! format\t9\ttessera.1\n
//! workspace\t<len>\t<workspace>\n
//! path\t<len>\t<path>\n
//! valueHash\t64\t<sha256 hex of value>\n
//! author\t<len>\t<author>\n
//! timestamp\t<len>\t<decimal>\n
//! ```
//!
//! The value goes in as its own hash, so a large value costs one extra pass
//! and the framing stays small. The signature is the only field left out.

use std::fmt::Write as _;

use tracing::trace;

use super::error::ValidationError;
use super::path;
use super::Validator;
use crate::config::{FORMAT_V1, FUTURE_CUTOFF_MICROS, MAX_TIMESTAMP, MIN_TIMESTAMP};
use crate::crypto::hash::sha256_hex;
use crate::crypto::keys::AuthorKeypair;
use crate::crypto::signatures;
use crate::document::{now_micros, Document};

/// Validator for format `tessera.1`. Stateless; share one behind an `Arc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatorV1;

impl ValidatorV1 {
    pub fn new() -> Self {
        Self
    }
}

fn push_field(out: &mut String, name: &str, content: &str) {
    // Writing to a String cannot fail.
    let _ = writeln!(out, "{name}\t{}\t{content}", content.len());
}

impl Validator for ValidatorV1 {
    fn format(&self) -> &str {
        FORMAT_V1
    }

    fn path_is_valid(&self, path: &str) -> bool {
        path::path_is_valid(path)
    }

    fn author_can_write_to_path(&self, author: &str, path: &str) -> bool {
        path::author_can_write_to_path(author, path)
    }

    fn hash_document(&self, doc: &Document) -> String {
        let mut buf = String::with_capacity(256);
        push_field(&mut buf, "format", &doc.format);
        push_field(&mut buf, "workspace", &doc.workspace);
        push_field(&mut buf, "path", &doc.path);
        push_field(&mut buf, "valueHash", &sha256_hex(doc.value.as_bytes()));
        push_field(&mut buf, "author", &doc.author);
        push_field(&mut buf, "timestamp", &doc.timestamp.to_string());
        sha256_hex(buf.as_bytes())
    }

    fn sign_document(&self, keypair: &AuthorKeypair, doc: Document) -> Document {
        let signature = signatures::sign(keypair, self.hash_document(&doc).as_bytes());
        Document { signature, ..doc }
    }

    fn document_signature_is_valid(&self, doc: &Document) -> bool {
        signatures::verify(
            &doc.author,
            self.hash_document(doc).as_bytes(),
            &doc.signature,
        )
    }

    fn check_document(
        &self,
        doc: &Document,
        future_cutoff: Option<i64>,
    ) -> Result<(), ValidationError> {
        if doc.format != FORMAT_V1 {
            return Err(ValidationError::UnsupportedFormat {
                expected: FORMAT_V1.to_string(),
                found: doc.format.clone(),
            });
        }

        let fields: [(&'static str, &str); 6] = [
            ("format", &doc.format),
            ("workspace", &doc.workspace),
            ("path", &doc.path),
            ("value", &doc.value),
            ("author", &doc.author),
            ("signature", &doc.signature),
        ];
        for (field, content) in fields {
            if !content.chars().all(path::is_printable_ascii) {
                return Err(ValidationError::NonPrintableField { field });
            }
        }

        path::check_path(&doc.path).map_err(|reason| ValidationError::InvalidPath {
            path: doc.path.clone(),
            reason,
        })?;

        if !path::author_can_write_to_path(&doc.author, &doc.path) {
            return Err(ValidationError::NoWritePermission {
                author: doc.author.clone(),
                path: doc.path.clone(),
            });
        }

        if doc.timestamp < MIN_TIMESTAMP {
            return Err(ValidationError::TimestampTooSmall {
                timestamp: doc.timestamp,
                min: MIN_TIMESTAMP,
            });
        }
        if doc.timestamp > MAX_TIMESTAMP {
            return Err(ValidationError::TimestampTooLarge {
                timestamp: doc.timestamp,
                max: MAX_TIMESTAMP,
            });
        }
        let cutoff = future_cutoff.unwrap_or_else(|| now_micros() + FUTURE_CUTOFF_MICROS);
        if doc.timestamp > cutoff {
            return Err(ValidationError::TimestampInFuture {
                timestamp: doc.timestamp,
                cutoff,
            });
        }

        // Most expensive check last.
        if !self.document_signature_is_valid(doc) {
            return Err(ValidationError::InvalidSignature {
                author: doc.author.clone(),
            });
        }

        trace!(path = %doc.path, author = %doc.author, "document valid");
        Ok(())
    }
}
