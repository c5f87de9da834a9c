//! Path classification and candidate resolution
//!
//! Provides:
//! - [`PathPattern`]: the ambiguity class of a raw path string
//! - [`resolve_candidates`]: the storage locations an ambiguous write may have landed on
//!
//! Both are pure functions of their string inputs. Any string is legal,
//! including `""` and strings with consecutive slashes.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Ambiguity class of a raw path string
///
/// Classification is order-sensitive: `"/"` and `""` are checked first, then
/// `"//"` anywhere in the string, then a leading slash. A path such as
/// `"//a/b"` is therefore [`PathPattern::DoubleSlash`], never
/// [`PathPattern::LeadingSlash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PathPattern {
    /// Exactly `"/"`
    Root,
    /// Exactly `""`
    Empty,
    /// Contains `"//"`
    DoubleSlash,
    /// Starts with `/`
    LeadingSlash,
    /// Everything else
    NoLeadingSlash,
}

impl PathPattern {
    /// Every pattern, in classification priority order
    pub const ALL: [PathPattern; 5] = [
        PathPattern::Root,
        PathPattern::Empty,
        PathPattern::DoubleSlash,
        PathPattern::LeadingSlash,
        PathPattern::NoLeadingSlash,
    ];

    /// Classify a raw path string
    #[inline]
    #[must_use]
    pub fn classify(path: &str) -> Self {
        if path == "/" {
            Self::Root
        } else if path.is_empty() {
            Self::Empty
        } else if path.contains("//") {
            Self::DoubleSlash
        } else if path.starts_with('/') {
            Self::LeadingSlash
        } else {
            Self::NoLeadingSlash
        }
    }

    /// Human-readable label for reports
    #[inline]
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Root => "Root Path (/)",
            Self::Empty => "Empty Path (\"\")",
            Self::DoubleSlash => "Double Slash (//path)",
            Self::LeadingSlash => "With Leading Slash (/path)",
            Self::NoLeadingSlash => "Without Leading Slash (path)",
        }
    }
}

impl Display for PathPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Root => "root",
            Self::Empty => "empty",
            Self::DoubleSlash => "doubleSlash",
            Self::LeadingSlash => "leadingSlash",
            Self::NoLeadingSlash => "noLeadingSlash",
        };
        f.write_str(name)
    }
}

/// Whether a base path addresses the store root
#[inline]
#[must_use]
pub fn is_root_base(base_path: &str) -> bool {
    base_path.is_empty() || base_path == "/"
}

/// Candidate storage locations for `update_key` written under `base_path`
///
/// Always returns exactly two entries. Index 0 is the location naive
/// concatenation would pick; index 1 is the alternate, root-relative
/// hypothesis. Duplicates are kept.
///
/// | base | key | candidates |
/// |------|-----|------------|
/// | root (`""`/`"/"`) | `/k` | `["/k", "k"]` |
/// | root | `k` | `["k", "/k"]` |
/// | `b` | `/k` | `["/k", "b/k"]` |
/// | `b` | `k` | `["b/k", "k"]` |
#[must_use]
pub fn resolve_candidates(base_path: &str, update_key: &str) -> [String; 2] {
    let absolute = update_key.starts_with('/');

    if is_root_base(base_path) {
        if absolute {
            [update_key.to_string(), update_key[1..].to_string()]
        } else {
            [update_key.to_string(), format!("/{update_key}")]
        }
    } else if absolute {
        // No separator: an absolute key is probed both as a root override and glued onto the base
        [update_key.to_string(), format!("{base_path}{update_key}")]
    } else {
        [format!("{base_path}/{update_key}"), update_key.to_string()]
    }
}

/// First segment of a path once empty segments are dropped
///
/// Returns `None` for paths that address the root.
#[must_use]
pub fn top_level_segment(path: &str) -> Option<&str> {
    path.split('/').find(|segment| !segment.is_empty())
}
