//! # Author Addresses
//!
//! An author address is derived from an Ed25519 public key:
//!
//! ```text
//! public_key (32 bytes)
//!     -> base58(public_key)
//!     -> "@" + short_name + "." + base58
//!     -> @suzy.6Bz9kKQ2...
//! ```
//!
//! Because the full public key is embedded, anyone holding a document can
//! verify its signature without a key directory. The short name exists so
//! humans can tell `@suzy` from `@fred` at a glance; two authors may pick the
//! same short name and still be different identities.

use ed25519_dalek::VerifyingKey;

use super::{is_lower_alnum, AddressError};
use crate::config::{AUTHOR_SHORTNAME_LENGTH, AUTHOR_SIGIL, PUBLIC_KEY_LENGTH};

/// The components of a successfully parsed author address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAuthor {
    /// The address exactly as given.
    pub address: String,
    /// The four-character human hint.
    pub short_name: String,
    /// The decoded Ed25519 public key.
    pub public_key: [u8; PUBLIC_KEY_LENGTH],
}

impl ParsedAuthor {
    /// The public key as an ed25519-dalek verifying key.
    ///
    /// Infallible in practice: [`parse_author_address`] already rejected
    /// bytes that are not a valid point.
    pub fn verifying_key(&self) -> Result<VerifyingKey, AddressError> {
        VerifyingKey::from_bytes(&self.public_key).map_err(|_| AddressError::InvalidPublicKey)
    }
}

/// Check a short name: exactly four characters of `[a-z0-9]`, starting with a
/// letter.
pub fn validate_short_name(short_name: &str) -> Result<(), AddressError> {
    let mut chars = short_name.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    if !starts_with_letter
        || short_name.len() != AUTHOR_SHORTNAME_LENGTH
        || !short_name.chars().all(is_lower_alnum)
    {
        return Err(AddressError::InvalidShortName(short_name.to_string()));
    }
    Ok(())
}

/// Build the address string for a short name and public key.
///
/// Does not validate the short name; callers that accept user input go
/// through [`crate::crypto::keys::AuthorKeypair::generate`] instead.
pub fn encode_author_address(short_name: &str, public_key: &[u8; PUBLIC_KEY_LENGTH]) -> String {
    format!(
        "{}{}.{}",
        AUTHOR_SIGIL,
        short_name,
        bs58::encode(public_key).into_string()
    )
}

/// Parse and fully validate an author address, including the key bytes.
pub fn parse_author_address(address: &str) -> Result<ParsedAuthor, AddressError> {
    let rest = address
        .strip_prefix(AUTHOR_SIGIL)
        .ok_or(AddressError::MissingSigil {
            expected: AUTHOR_SIGIL,
        })?;

    let mut parts = rest.split('.');
    let (short_name, key_b58) = match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(key), None) => (name, key),
        _ => return Err(AddressError::MissingSeparator),
    };

    validate_short_name(short_name)?;

    let key_bytes = bs58::decode(key_b58)
        .into_vec()
        .map_err(|_| AddressError::InvalidKeyEncoding)?;
    let public_key: [u8; PUBLIC_KEY_LENGTH] =
        key_bytes
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::InvalidKeyLength {
                got: key_bytes.len(),
            })?;

    VerifyingKey::from_bytes(&public_key).map_err(|_| AddressError::InvalidPublicKey)?;

    Ok(ParsedAuthor {
        address: address.to_string(),
        short_name: short_name.to_string(),
        public_key,
    })
}

/// Cheap syntactic test: does this token *look like* an author address?
///
/// `@` + one or more `[a-z0-9]` + `.` + one or more ASCII alphanumerics. The
/// key is not decoded. Used to recognise owner slots in paths, where the
/// question is "is this an ownership claim?", not "is this key real?".
pub fn looks_like_author_address(token: &str) -> bool {
    let Some(rest) = token.strip_prefix(AUTHOR_SIGIL) else {
        return false;
    };
    let Some((name, key)) = rest.split_once('.') else {
        return false;
    };
    !name.is_empty()
        && name.chars().all(is_lower_alnum)
        && !key.is_empty()
        && key.chars().all(|c| c.is_ascii_alphanumeric())
}
