//! # Document Validation
//!
//! A validator is the pure half of the protocol: given one document, is it
//! well-formed, is its author allowed to write there, and is the signature
//! real? No I/O, no shared state, same answer every time.
//!
//! Documents carry a `format` tag, and stores pick a validator by that tag at
//! runtime through a [`ValidatorRegistry`]. Supporting a new format means
//! writing a new [`Validator`] and registering it, nothing else.

pub mod error;
pub mod path;
pub mod v1;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::crypto::keys::AuthorKeypair;
use crate::document::Document;

pub use error::ValidationError;
pub use v1::ValidatorV1;

/// The capability every document format provides.
pub trait Validator: fmt::Debug + Send + Sync {
    /// The format tag this validator handles, e.g. `tessera.1`.
    fn format(&self) -> &str;

    fn path_is_valid(&self, path: &str) -> bool;

    fn author_can_write_to_path(&self, author: &str, path: &str) -> bool;

    /// Canonical hash of the content fields (everything but the signature).
    fn hash_document(&self, doc: &Document) -> String;

    /// Return `doc` with its signature replaced by `keypair`'s signature.
    fn sign_document(&self, keypair: &AuthorKeypair, doc: Document) -> Document;

    fn document_signature_is_valid(&self, doc: &Document) -> bool;

    /// Run every validity rule, stopping at the first failure.
    ///
    /// `future_cutoff` is the latest acceptable timestamp; `None` means
    /// "now plus the default window".
    fn check_document(
        &self,
        doc: &Document,
        future_cutoff: Option<i64>,
    ) -> Result<(), ValidationError>;

    fn document_is_valid(&self, doc: &Document, future_cutoff: Option<i64>) -> bool {
        self.check_document(doc, future_cutoff).is_ok()
    }
}

/// Format tag → validator.
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    validators: BTreeMap<String, Arc<dyn Validator>>,
}

impl ValidatorRegistry {
    /// An empty registry. Stores refuse to be built from one.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every format this crate knows about.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ValidatorV1::new()));
        registry
    }

    /// Add a validator, replacing any earlier one for the same format.
    pub fn register(&mut self, validator: Arc<dyn Validator>) -> &mut Self {
        self.validators
            .insert(validator.format().to_string(), validator);
        self
    }

    pub fn get(&self, format: &str) -> Option<&Arc<dyn Validator>> {
        self.validators.get(format)
    }

    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.validators.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl FromIterator<Arc<dyn Validator>> for ValidatorRegistry {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Validator>>>(iter: I) -> Self {
        let mut registry = Self::new();
        for validator in iter {
            registry.register(validator);
        }
        registry
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.formats()).finish()
    }
}
