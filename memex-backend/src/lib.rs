//! memex-backend — personal knowledge base server and index engine.
//!
//! Entries are atomic markdown documents with YAML frontmatter living in a
//! git-backed `knowledge/` directory. The engine parses them into an
//! immutable in-memory snapshot with a derived backlink graph and serves
//! ranked search, filtered listing, and statistics through a tool registry
//! (HTTP) and a CLI. Mutations happen out-of-band: a cloud agent opens PRs
//! with new entries, and image assets go through the GitHub contents API.

use std::sync::Arc;

pub mod cloud_agent;
pub mod config;
pub mod controllers;
pub mod github;
pub mod kb;
pub mod prompt;
pub mod site;
pub mod tools;

use config::Config;
use kb::KnowledgeBase;
use tools::ToolRegistry;

/// Shared application state for the HTTP surface
pub struct AppState {
    pub kb: Arc<KnowledgeBase>,
    pub registry: Arc<ToolRegistry>,
    pub config: Config,
}
