//! Path grammar and write permission.
//!
//! Paths look like file paths: `/wiki/shared/Garden%20Gnome`. A path that
//! mentions an author after a `~` belongs to that author:
//!
//! ```text
//! /about/~@suzy.6Bz9.../name          only suzy may write
//! /chat/~@suzy.6Bz9...~@fred.9kQ2...  suzy or fred may write
//! /zzz/~/zzz                          nobody may write (malformed marker)
//! /hello                              anyone may write
//! ```
//!
//! Malformed ownership markers fail closed. A path with a `~` that doesn't
//! name anyone is unwritable, even by an author who is named elsewhere in
//! the same path. Relaxing that would let a typo turn a private path public.

use crate::config::{AUTHOR_SIGIL, OWNER_MARKER};
use crate::identity::looks_like_author_address;

/// Characters that are printable ASCII but still not allowed in a path.
const FORBIDDEN_PATH_CHARS: [char; 4] = [' ', '\\', '"', '<'];

/// Check the path grammar. `Err` carries a short reason for logs.
pub fn check_path(path: &str) -> Result<(), &'static str> {
    let Some(rest) = path.strip_prefix('/') else {
        return Err("must start with '/'");
    };
    if rest.starts_with(AUTHOR_SIGIL) {
        return Err("must not start with '/@'");
    }
    if path.contains("//") {
        return Err("must not contain '//'");
    }
    for c in path.chars() {
        if !is_printable_ascii(c) {
            return Err("must be printable ASCII");
        }
        if FORBIDDEN_PATH_CHARS.contains(&c) {
            return Err("must not contain space, '\\', '\"' or '<'");
        }
    }
    Ok(())
}

pub fn path_is_valid(path: &str) -> bool {
    check_path(path).is_ok()
}

/// 0x20..=0x7E.
pub fn is_printable_ascii(c: char) -> bool {
    (' '..='~').contains(&c)
}

/// What the `~` markers in a path say about who may write it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ownership<'a> {
    /// No `~` at all.
    Public,
    /// Writable by any of these authors. May be empty, e.g. `/~`.
    Owners(Vec<&'a str>),
    /// A `~` that doesn't introduce an author.
    Malformed,
}

/// Read the ownership markers out of a path.
///
/// Each `~` starts a token that runs until the next `/`, `~`, or the end of
/// the path. A plausible author address is an owner slot. A `~` as the very
/// last character is ignored. Anything else is malformed.
pub fn ownership(path: &str) -> Ownership<'_> {
    if !path.contains(OWNER_MARKER) {
        return Ownership::Public;
    }

    let mut owners = Vec::new();
    let mut rest = path;
    while let Some(idx) = rest.find(OWNER_MARKER) {
        let after = &rest[idx + OWNER_MARKER.len_utf8()..];
        if after.is_empty() {
            break;
        }
        let end = after.find(['/', OWNER_MARKER]).unwrap_or(after.len());
        let token = &after[..end];
        if !looks_like_author_address(token) {
            return Ownership::Malformed;
        }
        owners.push(token);
        rest = &after[end..];
    }
    Ownership::Owners(owners)
}

pub fn author_can_write_to_path(author: &str, path: &str) -> bool {
    match ownership(path) {
        Ownership::Public => true,
        Ownership::Owners(owners) => owners.contains(&author),
        Ownership::Malformed => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_vectors() {
        let invalid = [
            "",
            " ",
            "\0",
            "not/starting/with/slash",
            " /starts-with-space",
            "/ends-with-space ",
            "/space in the middle",
            "/double//slash/in/middle",
            "//double/slash/at/start",
            "/double/slash/at/end//",
            "/backslash\\",
            "/withquote\"",
            "/withbracket<",
            "/with\nnewline",
            "/with\ttab",
            "/@starts/with/at/sign",
            "/\u{2603}",
            "/\u{2604}",
            "{}",
        ];
        for p in invalid {
            assert!(!path_is_valid(p), "{p:?} should be invalid");
        }

        let valid = [
            "/",
            "/foo",
            "/FOO",
            "/foo/",
            "/foo/1234",
            "/about/~@suzy.abc/name",
            "/wiki/shared/Garden%20Gnome",
            "/not/@start",
        ];
        for p in valid {
            assert!(path_is_valid(p), "{p:?} should be valid");
        }
    }

    #[test]
    fn public_paths() {
        let author = "@suzy.abc";
        assert!(author_can_write_to_path(author, "/hello"));
        assert!(author_can_write_to_path(author, "/public"));
        assert!(author_can_write_to_path(author, &format!("/{author}/about")));
    }

    #[test]
    fn owned_paths() {
        let author = "@suzy.abc";
        assert!(author_can_write_to_path(author, &format!("/~{author}/about")));
        assert!(author_can_write_to_path(
            author,
            &format!("/chat/~@notme.ed25519~{author}")
        ));
        assert!(author_can_write_to_path(
            author,
            &format!("/~{author}/about/~@notme.ed25519")
        ));
        assert!(!author_can_write_to_path(author, "/~@notme.ed25519/about"));
    }

    #[test]
    fn owner_slot_must_match_exactly() {
        assert!(!author_can_write_to_path("@suzy.abc", "/~@suzy.abcd/x"));
        assert!(!author_can_write_to_path("@suzy.abcd", "/~@suzy.abc/x"));
    }

    #[test]
    fn trailing_tilde_is_inert() {
        let author = "@suzy.abc";
        assert!(author_can_write_to_path(author, &format!("/~{author}/about/~")));
        assert_eq!(ownership("/~"), Ownership::Owners(vec![]));
        assert!(!author_can_write_to_path(author, "/~"));
    }

    #[test]
    fn bare_tilde_fails_closed() {
        let author = "@suzy.abc";
        assert!(!author_can_write_to_path(author, "/zzz/~/zzz"));
        assert!(!author_can_write_to_path(author, "/zzz~zzz"));
        assert!(!author_can_write_to_path(author, "/a/~~"));
        // Being named elsewhere doesn't rescue a malformed path.
        assert!(!author_can_write_to_path(author, &format!("/~{author}/zzz/~/zzz")));
        assert!(!author_can_write_to_path(author, &format!("/~{author}/~notme")));
        assert_eq!(ownership("/zzz/~/zzz"), Ownership::Malformed);
    }

    #[test]
    fn ownership_lists_every_slot() {
        assert_eq!(
            ownership("/chat/~@aaaa.x1~@bbbb.y2/room/~@cccc.z3"),
            Ownership::Owners(vec!["@aaaa.x1", "@bbbb.y2", "@cccc.z3"])
        );
        assert_eq!(ownership("/no/markers"), Ownership::Public);
    }
}
