//! Invalidation tags

use std::fmt;

/// Tag provided by every book list and detail entry
pub const BOOKS: &str = "Books";
/// Tag provided by the identity query
pub const SESSION: &str = "Session";

/// Label shared by cache entries and mutations.
///
/// A general tag (`Books`) matches every tag of its kind, including
/// per-item tags (`Books:3`). An item tag only matches itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    kind: String,
    id: Option<String>,
}

impl Tag {
    pub fn general(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
        }
    }

    pub fn item(kind: impl Into<String>, id: impl ToString) -> Self {
        Self {
            kind: kind.into(),
            id: Some(id.to_string()),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Whether invalidating `self` invalidates an entry that provides `provided`
    pub fn matches(&self, provided: &Tag) -> bool {
        self.kind == provided.kind && (self.id.is_none() || self.id == provided.id)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}:{}", self.kind, id),
            None => f.write_str(&self.kind),
        }
    }
}
