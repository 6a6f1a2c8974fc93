//! Queries and the selection rules every backend shares.
//!
//! Backends only have to do one thing: walk their rows in ascending path
//! order, starting at [`Query::scan_start`] and stopping at
//! [`Query::scan_done`], handing over each path's rows as a group. Winner
//! selection, author filtering, ordering and limits all happen in
//! [`Query::select`], so the two backends cannot drift apart.

use serde::{Deserialize, Serialize};

use crate::document::Document;

/// Which documents to return. Every filter is optional and they compose.
///
/// `Query::default()` returns the current winner of every path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Exact path.
    pub path: Option<String>,
    /// Inclusive lower bound on path.
    pub low_path: Option<String>,
    /// Exclusive upper bound on path.
    pub high_path: Option<String>,
    /// Literal prefix. No wildcards; `%` and `_` mean themselves.
    pub path_prefix: Option<String>,
    /// Only rows by this author. Without history, a path is reported only
    /// when its winner is by this author.
    pub versions_by_author: Option<String>,
    /// Every author's latest row per path instead of just the winner.
    pub include_history: bool,
    /// Cap on rows returned, applied after ordering. `Some(0)` is a real cap
    /// and returns nothing; it is not read as "unlimited". Use `None` for no
    /// cap.
    pub limit: Option<usize>,
}

impl Query {
    /// Every stored row.
    pub fn history() -> Self {
        Self {
            include_history: true,
            ..Self::default()
        }
    }

    /// The winner at one path.
    pub fn at_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }

    pub fn with_range(mut self, low: impl Into<String>, high: impl Into<String>) -> Self {
        self.low_path = Some(low.into());
        self.high_path = Some(high.into());
        self
    }

    pub fn by_author(mut self, author: impl Into<String>) -> Self {
        self.versions_by_author = Some(author.into());
        self
    }

    pub fn with_history(mut self, include_history: bool) -> Self {
        self.include_history = include_history;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Does `path` pass every path filter?
    pub fn matches_path(&self, path: &str) -> bool {
        self.path.as_deref().map_or(true, |p| path == p)
            && self.low_path.as_deref().map_or(true, |low| path >= low)
            && self.high_path.as_deref().map_or(true, |high| path < high)
            && self
                .path_prefix
                .as_deref()
                .map_or(true, |prefix| path.starts_with(prefix))
    }

    /// Smallest path that can possibly match, if the filters imply one.
    pub(crate) fn scan_start(&self) -> Option<&str> {
        [
            self.path.as_deref(),
            self.low_path.as_deref(),
            self.path_prefix.as_deref(),
        ]
        .into_iter()
        .flatten()
        .max()
    }

    /// During an ascending scan: once this returns `true` for a path, no
    /// later path can match either.
    pub(crate) fn scan_done(&self, path: &str) -> bool {
        self.path.as_deref().is_some_and(|p| path > p)
            || self.high_path.as_deref().is_some_and(|high| path >= high)
            || self
                .path_prefix
                .as_deref()
                .is_some_and(|prefix| path > prefix && !path.starts_with(prefix))
    }

    fn author_matches(&self, doc: &Document) -> bool {
        self.versions_by_author
            .as_deref()
            .map_or(true, |author| doc.author == author)
    }

    /// Turn per-path row groups into the query's answer.
    ///
    /// `groups` must arrive in ascending path order, one group per path, and
    /// already filtered by [`matches_path`](Self::matches_path). Rows inside
    /// a group may be in any order. Consumes only as many groups as the
    /// limit needs.
    pub fn select<I>(&self, groups: I) -> Vec<Document>
    where
        I: IntoIterator<Item = Vec<Document>>,
    {
        let limit = self.limit.unwrap_or(usize::MAX);
        let mut out = Vec::new();
        if limit == 0 {
            return out;
        }

        for mut rows in groups {
            rows.sort_by(|a, b| b.cmp_version(a));
            if self.include_history {
                out.extend(rows.into_iter().filter(|d| self.author_matches(d)));
            } else if let Some(winner) = rows.into_iter().next() {
                // Filter after picking the winner: the author filter decides
                // whether a path is reported, never which document wins.
                if self.author_matches(&winner) {
                    out.push(winner);
                }
            }
            if out.len() >= limit {
                out.truncate(limit);
                break;
            }
        }
        out
    }
}
