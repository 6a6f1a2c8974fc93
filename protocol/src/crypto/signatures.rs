//! # Digital Signatures
//!
//! The crypto capability the rest of tessera consumes: generate a keypair,
//! sign bytes, verify a signature against an author address.
//!
//! Everything above this module speaks *text*. Addresses, secrets and
//! signatures are base58 strings because they live inside JSON documents and
//! config files, and a document must survive a trip through another
//! implementation without anyone re-encoding bytes.
//!
//! ## Strictness
//!
//! Verification uses `ed25519-dalek`'s `verify_strict`, which rejects
//! small-order keys and non-canonical signatures. Replicas must agree on what
//! "valid" means, and the strict rules are the ones every careful
//! implementation converges on.
//!
//! ## Failure mode
//!
//! [`verify`] returns a plain `bool`. An undecodable signature, a malformed
//! address and a forged document are all just "nope" to the caller, and
//! none of them may panic: these bytes come straight off other replicas.

use ed25519_dalek::{Signature, Signer, SigningKey};

use super::keys::{decode_secret, AuthorKeypair, KeyError};
use crate::config::SIGNATURE_LENGTH;
use crate::identity::parse_author_address;

/// Generate a fresh author identity under `short_name`.
///
/// # Example
///
/// ```
/// use tessera_protocol::crypto::signatures::{generate_keypair, sign, verify};
///
/// let suzy = generate_keypair("suzy").unwrap();
/// let sig = sign(&suzy, b"hello");
/// assert!(verify(suzy.address(), b"hello", &sig));
/// ```
pub fn generate_keypair(short_name: &str) -> Result<AuthorKeypair, KeyError> {
    AuthorKeypair::generate(short_name)
}

/// Sign `message` with an author's key. Returns base58 of 64 bytes.
pub fn sign(keypair: &AuthorKeypair, message: &[u8]) -> String {
    keypair.sign(message)
}

/// Sign with a bare base58 secret, for callers that never built a keypair.
pub fn sign_with_secret(secret: &str, message: &[u8]) -> Result<String, KeyError> {
    let signing_key = SigningKey::from_bytes(&decode_secret(secret)?);
    Ok(bs58::encode(signing_key.sign(message).to_bytes()).into_string())
}

/// Verify a base58 signature over `message` by the author at `address`.
///
/// Returns `false` on any malformed input.
pub fn verify(address: &str, message: &[u8], signature: &str) -> bool {
    let Ok(author) = parse_author_address(address) else {
        return false;
    };
    let Ok(verifying_key) = author.verifying_key() else {
        return false;
    };
    let Ok(sig_bytes) = bs58::decode(signature).into_vec() else {
        return false;
    };
    let sig_bytes: [u8; SIGNATURE_LENGTH] = match sig_bytes.as_slice().try_into() {
        Ok(b) => b,
        Err(_) => return false,
    };
    let sig = Signature::from_bytes(&sig_bytes);
    verifying_key.verify_strict(message, &sig).is_ok()
}
