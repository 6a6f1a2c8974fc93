//! Workspace addresses: `+<name>.<suffix>`.
//!
//! The name is a readable label (`gardenclub`); the suffix is usually random
//! so that two groups picking the same name do not collide by accident.

use super::{is_lower_alnum, AddressError};
use crate::config::{WORKSPACE_NAME_MAX_LENGTH, WORKSPACE_SIGIL, WORKSPACE_SUFFIX_MAX_LENGTH};

/// The components of a successfully parsed workspace address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedWorkspace {
    pub address: String,
    pub name: String,
    pub suffix: String,
}

/// Parse a workspace address.
///
/// Name: `[a-z][a-z0-9]{0,14}`. Suffix: `[a-z0-9]{1,53}`.
pub fn parse_workspace_address(address: &str) -> Result<ParsedWorkspace, AddressError> {
    let rest = address
        .strip_prefix(WORKSPACE_SIGIL)
        .ok_or(AddressError::MissingSigil {
            expected: WORKSPACE_SIGIL,
        })?;

    let mut parts = rest.split('.');
    let (name, suffix) = match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(suffix), None) => (name, suffix),
        _ => return Err(AddressError::MissingSeparator),
    };

    let name_ok = name.chars().next().is_some_and(|c| c.is_ascii_lowercase())
        && name.len() <= WORKSPACE_NAME_MAX_LENGTH
        && name.chars().all(is_lower_alnum);
    if !name_ok {
        return Err(AddressError::InvalidWorkspaceName(name.to_string()));
    }

    let suffix_ok = !suffix.is_empty()
        && suffix.len() <= WORKSPACE_SUFFIX_MAX_LENGTH
        && suffix.chars().all(is_lower_alnum);
    if !suffix_ok {
        return Err(AddressError::InvalidWorkspaceSuffix(suffix.to_string()));
    }

    Ok(ParsedWorkspace {
        address: address.to_string(),
        name: name.to_string(),
        suffix: suffix.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_workspaces() {
        let ws = parse_workspace_address("+gardenclub.xxxxxxxxxxxxxxxxxxxx").unwrap();
        assert_eq!(ws.name, "gardenclub");
        assert_eq!(ws.suffix, "xxxxxxxxxxxxxxxxxxxx");
        assert!(parse_workspace_address("+a.1").is_ok());
        assert!(parse_workspace_address("+another.xxxxxxxxxxxxxxxxxxxx").is_ok());
    }

    #[test]
    fn invalid_workspaces() {
        assert!(parse_workspace_address("bad-workspace-address").is_err());
        assert!(parse_workspace_address("xxx").is_err());
        assert!(parse_workspace_address("").is_err());
        assert!(parse_workspace_address("+gardenclub").is_err());
        assert!(parse_workspace_address("+gardenclub.").is_err());
        assert!(parse_workspace_address("+.abc").is_err());
        assert!(parse_workspace_address("+1garden.abc").is_err());
        assert!(parse_workspace_address("+Garden.abc").is_err());
        assert!(parse_workspace_address("+garden.a.b").is_err());
        assert!(parse_workspace_address("+abcdefghijklmnop.abc").is_err(), "16-char name");
        assert!(parse_workspace_address(&format!("+garden.{}", "a".repeat(54))).is_err());
    }
}
