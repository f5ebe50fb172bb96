//! Entry model — one atomic knowledge unit.
//!
//! An entry is parsed from a markdown document with YAML frontmatter and is
//! immutable once constructed; reloads replace whole entries, never patch
//! fields in place.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};
use thiserror::Error;

/// Closed set of entry kinds
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntryType {
    Concept,
    Reference,
    Insight,
    Question,
    Note,
}

/// A typed, directed link from the owning entry to another entry.
/// The target may not exist in the current set (dangling edges are legal).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub label: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An external citation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Derived reverse-direction view of an edge, attached to the target entry.
/// Never stored on disk; recomputed from the edge set on every load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Backlink {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub path: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Repo-relative document path (e.g. "/knowledge/rlhf.md"). Primary key.
    pub path: String,
    /// Display identifier derived from the path; not guaranteed unique.
    pub slug: String,
    pub title: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub summary: String,
    pub tags: Vec<String>,
    pub created: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<NaiveDate>,
    pub edges: Vec<Edge>,
    pub sources: Vec<Source>,
    #[serde(skip)]
    pub body: String,
}

/// One malformed document. The batch loader skips the document and keeps
/// going; nothing here is fatal to a load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing frontmatter block")]
    MissingFrontmatter,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid {field}: {message}")]
    InvalidField { field: &'static str, message: String },
}

impl ParseError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }
}

/// Slugify a name for display (e.g. "RLHF Reward Hacking" -> "rlhf-reward-hacking").
/// Non-alphanumeric runs collapse to a single dash. Display-only, never a
/// lookup key.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<&str>>()
        .join("-")
}

/// Derive the display slug for a document path from its file stem.
pub fn slug_for_path(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    let stem = name.strip_suffix(".md").unwrap_or(name);
    slugify(stem)
}
