//! # Key Management
//!
//! Ed25519 author keypairs.
//!
//! An author in tessera *is* a keypair. There is no account server and no
//! registration step: generate a key, pick a four-letter short name, and the
//! resulting address (`@suzy.<base58 pubkey>`) is yours forever.
//!
//! ## Text encodings
//!
//! Keys travel as text because they end up in config files, CLI flags and
//! signed documents:
//!
//! - address: `@` + short name + `.` + base58(public key)
//! - secret:  base58(32-byte seed)
//!
//! ## Security considerations
//!
//! - Signing keys are zeroized on drop (thanks, ed25519-dalek).
//! - Key generation uses `OsRng`. If your OS RNG is broken, tessera is the
//!   least of your problems.
//! - Secrets are never logged. `Debug` prints the address only.

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use std::fmt;
use thiserror::Error;

use crate::config::{PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH};
use crate::identity::{encode_author_address, parse_author_address, validate_short_name, AddressError};

/// Errors that can occur while building an author keypair.
///
/// Deliberately vague about secret material: "invalid" is all you get.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid author address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("invalid secret: not base58 or not 32 bytes")]
    InvalidSecretKey,

    #[error("keypair validation failed: secret does not match address")]
    KeypairMismatch,
}

/// An author identity: a short name plus an Ed25519 signing key.
///
/// Like every private-key holder in this crate, `AuthorKeypair` does not
/// implement `Serialize`. Exporting a secret should be a deliberate call to
/// [`secret`](Self::secret), not a side effect of dumping a struct to JSON.
///
/// # Examples
///
/// ```
/// use tessera_protocol::crypto::keys::AuthorKeypair;
///
/// let suzy = AuthorKeypair::generate("suzy").unwrap();
/// assert!(suzy.address().starts_with("@suzy."));
///
/// let restored = AuthorKeypair::from_parts(suzy.address(), &suzy.secret()).unwrap();
/// assert_eq!(restored.address(), suzy.address());
/// ```
pub struct AuthorKeypair {
    short_name: String,
    /// Cached so borrowers get a `&str` without re-encoding base58.
    address: String,
    signing_key: SigningKey,
}

impl AuthorKeypair {
    /// Generate a fresh author identity with the OS cryptographic RNG.
    ///
    /// Fails only if `short_name` breaks the grammar (four chars of
    /// `[a-z0-9]`, first one a letter).
    pub fn generate(short_name: &str) -> Result<Self, KeyError> {
        validate_short_name(short_name)?;
        Ok(Self::with_signing_key(
            short_name,
            SigningKey::generate(&mut OsRng),
        ))
    }

    /// Deterministically build an author from a 32-byte seed.
    ///
    /// A weak seed gives a weak key. Tests only, or a proper KDF.
    pub fn from_seed(short_name: &str, seed: &[u8; SECRET_KEY_LENGTH]) -> Result<Self, KeyError> {
        validate_short_name(short_name)?;
        Ok(Self::with_signing_key(
            short_name,
            SigningKey::from_bytes(seed),
        ))
    }

    /// Rebuild a keypair from its text form (address + base58 secret).
    ///
    /// The public key is re-derived from the secret and must match the one
    /// embedded in the address, otherwise we would happily sign documents
    /// under someone else's name that nobody could ever verify.
    pub fn from_parts(address: &str, secret: &str) -> Result<Self, KeyError> {
        let parsed = parse_author_address(address)?;
        let seed = decode_secret(secret)?;
        let signing_key = SigningKey::from_bytes(&seed);
        if signing_key.verifying_key().to_bytes() != parsed.public_key {
            return Err(KeyError::KeypairMismatch);
        }
        Ok(Self::with_signing_key(&parsed.short_name, signing_key))
    }

    fn with_signing_key(short_name: &str, signing_key: SigningKey) -> Self {
        let address = encode_author_address(short_name, &signing_key.verifying_key().to_bytes());
        Self {
            short_name: short_name.to_string(),
            address,
            signing_key,
        }
    }

    /// The author address, e.g. `@suzy.6Bz9...`.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Base58 of the 32-byte seed.
    ///
    /// **Handle with care.** This string is the whole identity.
    pub fn secret(&self) -> String {
        bs58::encode(self.signing_key.to_bytes()).into_string()
    }

    /// Raw public key bytes. Safe to share, log, print on a mug.
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.signing_key.verifying_key().to_bytes()
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Sign `message` and return the base58 signature.
    ///
    /// Ed25519 is deterministic: same key, same message, same signature.
    /// Replicas rely on that when they compare documents byte-for-byte.
    pub fn sign(&self, message: &[u8]) -> String {
        bs58::encode(self.signing_key.sign(message).to_bytes()).into_string()
    }
}

/// Decode a base58 secret into its 32-byte seed.
pub(crate) fn decode_secret(secret: &str) -> Result<[u8; SECRET_KEY_LENGTH], KeyError> {
    let bytes = bs58::decode(secret)
        .into_vec()
        .map_err(|_| KeyError::InvalidSecretKey)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| KeyError::InvalidSecretKey)
}

impl Clone for AuthorKeypair {
    /// Every copy of a private key is another thing to protect.
    fn clone(&self) -> Self {
        Self::with_signing_key(
            &self.short_name,
            SigningKey::from_bytes(&self.signing_key.to_bytes()),
        )
    }
}

impl fmt::Debug for AuthorKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Address only. A partial secret is still a leak.
        write!(f, "AuthorKeypair({})", self.address)
    }
}

impl PartialEq for AuthorKeypair {
    /// Identity equality: same address. Secrets are not compared.
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for AuthorKeypair {}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier};

    #[test]
    fn test_generate_produces_valid_address() {
        let kp = AuthorKeypair::generate("suzy").unwrap();
        assert!(kp.address().starts_with("@suzy."));
        assert_eq!(kp.short_name(), "suzy");
        assert!(parse_author_address(kp.address()).is_ok());
    }

    #[test]
    fn generate_rejects_bad_short_names() {
        assert!(matches!(
            AuthorKeypair::generate("toolong"),
            Err(KeyError::InvalidAddress(AddressError::InvalidShortName(_)))
        ));
        assert!(AuthorKeypair::generate("9abc").is_err());
        assert!(AuthorKeypair::generate("").is_err());
    }

    #[test]
    fn test_two_generated_keypairs_are_different() {
        // If this fails, your RNG is broken and you should panic (the emotion,
        // not the macro).
        let a = AuthorKeypair::generate("suzy").unwrap();
        let b = AuthorKeypair::generate("suzy").unwrap();
        assert_ne!(a.address(), b.address());
        assert_ne!(a, b);
    }

    #[test]
    fn parts_roundtrip() {
        let kp = AuthorKeypair::generate("fred").unwrap();
        let restored = AuthorKeypair::from_parts(kp.address(), &kp.secret()).unwrap();
        assert_eq!(kp, restored);
        assert_eq!(kp.secret(), restored.secret());
    }

    #[test]
    fn from_parts_rejects_mismatched_secret() {
        let suzy = AuthorKeypair::generate("suzy").unwrap();
        let fred = AuthorKeypair::generate("fred").unwrap();
        assert!(matches!(
            AuthorKeypair::from_parts(suzy.address(), &fred.secret()),
            Err(KeyError::KeypairMismatch)
        ));
    }

    #[test]
    fn from_parts_rejects_garbage_secret() {
        let kp = AuthorKeypair::generate("suzy").unwrap();
        assert!(matches!(
            AuthorKeypair::from_parts(kp.address(), "not base58 0OIl"),
            Err(KeyError::InvalidSecretKey)
        ));
        assert!(matches!(
            AuthorKeypair::from_parts(kp.address(), "abc"),
            Err(KeyError::InvalidSecretKey)
        ));
    }

    #[test]
    fn deterministic_from_seed() {
        let seed = [42u8; 32];
        let a = AuthorKeypair::from_seed("test", &seed).unwrap();
        let b = AuthorKeypair::from_seed("test", &seed).unwrap();
        assert_eq!(a.address(), b.address());
        assert_eq!(a.secret(), bs58::encode(seed).into_string());
    }

    #[test]
    fn test_deterministic_signatures() {
        let kp = AuthorKeypair::generate("suzy").unwrap();
        assert_eq!(kp.sign(b"same"), kp.sign(b"same"));
        assert_ne!(kp.sign(b"same"), kp.sign(b"different"));
    }

    #[test]
    fn signature_is_base58_of_64_bytes() {
        let kp = AuthorKeypair::generate("suzy").unwrap();
        let sig = kp.sign(b"hello");
        let bytes = bs58::decode(&sig).into_vec().unwrap();
        assert_eq!(bytes.len(), 64);

        let sig = Signature::from_slice(&bytes).unwrap();
        assert!(kp.verifying_key().verify(b"hello", &sig).is_ok());
    }

    #[test]
    fn test_clone_preserves_identity() {
        let kp = AuthorKeypair::generate("suzy").unwrap();
        let cloned = kp.clone();
        assert_eq!(kp.address(), cloned.address());
        assert_eq!(kp.secret(), cloned.secret());
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = AuthorKeypair::generate("suzy").unwrap();
        let debug_str = format!("{:?}", kp);
        assert!(debug_str.starts_with("AuthorKeypair(@suzy."));
        assert!(!debug_str.contains(&kp.secret()));
    }
}
