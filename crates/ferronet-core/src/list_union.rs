//! Pipe-delimited set attributes
//!
//! Multi-valued node and edge attributes (`source_db`, `pathways`,
//! `interaction_types`, ...) are stored as `|`-joined strings. Merging two of
//! them is a set union; the empty string, `-` and `_NA_` stand for "no value".
//! Output tokens are sorted, so the union is commutative and idempotent on the
//! rendered string, not only on the underlying set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub const SEPARATOR: char = '|';

const ABSENT_MARKERS: [&str; 3] = ["", "-", "_NA_"];

/// True for tokens that carry no information
pub fn is_absent(token: &str) -> bool {
    ABSENT_MARKERS.contains(&token.trim())
}

/// Meaningful tokens of a pipe-delimited value
pub fn tokens(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(SEPARATOR)
        .map(str::trim)
        .filter(|token| !is_absent(token))
}

/// Union of two pipe-delimited values
///
/// ```
/// use ferronet_core::list_union::merge_strings;
///
/// assert_eq!(merge_strings("A|B", "B|C"), "A|B|C");
/// assert_eq!(merge_strings("-", ""), "");
/// ```
pub fn merge_strings(a: &str, b: &str) -> String {
    let mut set = TagSet::parse(a);
    set.extend_from(b);
    set.to_string()
}

/// Canonical rendering of a single value (deduplicated, sorted, absent markers dropped)
pub fn normalize(value: &str) -> String {
    TagSet::parse(value).to_string()
}

/// Parsed form of a pipe-delimited attribute
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagSet {
    tags: BTreeSet<String>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(value: &str) -> Self {
        Self {
            tags: tokens(value).map(str::to_string).collect(),
        }
    }

    pub fn extend_from(&mut self, value: &str) {
        self.tags.extend(tokens(value).map(str::to_string));
    }

    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if is_absent(&tag) {
            return false;
        }
        self.tags.insert(tag.trim().to_string())
    }

    pub fn union(&mut self, other: &TagSet) {
        self.tags.extend(other.tags.iter().cloned());
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// True if any tag starts with `prefix`
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.tags.iter().any(|tag| tag.starts_with(prefix))
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for tag in &self.tags {
            if !first {
                write!(f, "{}", SEPARATOR)?;
            }
            f.write_str(tag)?;
            first = false;
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}
