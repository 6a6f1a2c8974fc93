//! Author keypairs on disk.
//!
//! A keyfile is a small JSON object, `{"address": "@suzy.…", "secret": "…"}`.
//! Loading re-derives the public key from the secret and refuses a file whose
//! halves don't belong together.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use tessera_protocol::crypto::keys::AuthorKeypair;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyFile {
    pub address: String,
    pub secret: String,
}

impl KeyFile {
    pub fn from_keypair(keypair: &AuthorKeypair) -> Self {
        Self {
            address: keypair.address().to_string(),
            secret: keypair.secret(),
        }
    }

    pub fn to_keypair(&self) -> Result<AuthorKeypair> {
        AuthorKeypair::from_parts(&self.address, &self.secret)
            .with_context(|| format!("keyfile for {} is not a valid keypair", self.address))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Write `keyfile` to `path`, readable only by the owner on Unix.
pub fn write(path: &Path, keyfile: &KeyFile) -> Result<()> {
    std::fs::write(path, keyfile.to_json()?)
        .with_context(|| format!("failed to write keyfile to {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("failed to restrict permissions on {}", path.display()))?;
    }
    Ok(())
}

pub fn load(path: &Path) -> Result<AuthorKeypair> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read keyfile {}", path.display()))?;
    let keyfile: KeyFile = serde_json::from_str(&raw)
        .with_context(|| format!("keyfile {} is not valid JSON", path.display()))?;
    keyfile.to_keypair()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suzy.json");
        let keypair = AuthorKeypair::generate("suzy").unwrap();

        write(&path, &KeyFile::from_keypair(&keypair)).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded, keypair);
        assert_eq!(loaded.secret(), keypair.secret());
    }

    #[cfg(unix)]
    #[test]
    fn keyfile_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fred.json");
        let keypair = AuthorKeypair::generate("fred").unwrap();
        write(&path, &KeyFile::from_keypair(&keypair)).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn mismatched_halves_are_refused() {
        let suzy = AuthorKeypair::generate("suzy").unwrap();
        let fred = AuthorKeypair::generate("fred").unwrap();
        let mixed = KeyFile {
            address: suzy.address().to_string(),
            secret: fred.secret(),
        };
        assert!(mixed.to_keypair().is_err());
    }

    #[test]
    fn unknown_fields_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odd.json");
        std::fs::write(&path, r#"{"address":"@suzy.x","secret":"y","extra":1}"#).unwrap();
        assert!(load(&path).is_err());
    }
}
