//! # Hashing Utilities
//!
//! SHA-256 is the only hash function in tessera. Document hashes are part of
//! the signed payload, so every replica (in any language) must compute them
//! byte-for-byte identically; SHA-256 is the one function every platform
//! ships.
//!
//! Digests cross module boundaries as lowercase hex strings because that is
//! how they end up inside signed text anyway.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data as a fixed-size array.
///
/// # Example
///
/// ```
/// use tessera_protocol::crypto::hash::sha256;
///
/// let hash = sha256(b"tessera");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute the SHA-256 hash of the input and return it as lowercase hex.
///
/// 64 characters, always.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        // NIST test vector: SHA-256("abc")
        let hash = sha256_hex(b"abc");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sha256_empty_input() {
        let hash = sha256_hex(b"");
        assert_eq!(
            hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn hex_digest_is_lowercase_and_64_chars() {
        let hash = sha256_hex(b"tessera");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn different_inputs_different_hashes() {
        assert_ne!(sha256(b"a"), sha256(b"b"));
    }
}
