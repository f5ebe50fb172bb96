//! Knowledge query tools: kb_search, kb_list, kb_read.
//!
//! Read-only views over the index. Each execution is one query session:
//! freshness is ensured once up front, then every read runs against that
//! acquired snapshot.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::defaults;
use crate::kb::{search, EntryType, Snapshot};
use crate::tools::types::{
    PropertySchema, Tool, ToolContext, ToolDefinition, ToolGroup, ToolInputSchema, ToolResult,
};

fn entry_type_values() -> Vec<String> {
    use strum::IntoEnumIterator;
    EntryType::iter().map(|t| t.as_ref().to_string()).collect()
}

// --- kb_search ---

pub struct KbSearchTool {
    definition: ToolDefinition,
}

impl KbSearchTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "query".to_string(),
            PropertySchema::string("Search terms. Matched against entry titles, tags, and summaries."),
        );

        Self {
            definition: ToolDefinition {
                name: "kb_search".to_string(),
                description: "Search the knowledge base. Returns matching entries with \
                              title, path, type, tags, summary, and backlink count. \
                              Entries are atomic knowledge units linked via typed edges."
                    .to_string(),
                input_schema: ToolInputSchema::object(properties, &["query"]),
                group: ToolGroup::Knowledge,
            },
        }
    }
}

impl Default for KbSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: String,
}

#[async_trait]
impl Tool for KbSearchTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let params: SearchParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        context.kb.ensure_fresh().await;
        let snapshot = context.kb.snapshot();
        let results = search::search(&snapshot, &params.query, defaults::SEARCH_LIMIT);

        if results.is_empty() {
            return ToolResult::success("No results found.");
        }

        let blocks: Vec<String> = results
            .iter()
            .map(|r| {
                format!(
                    "[{}] {}\n  path: {}\n  tags: {}\n  summary: {}\n  backlinks: {}",
                    r.entry.entry_type.as_ref(),
                    r.entry.title,
                    r.entry.path,
                    r.entry.tags.join(", "),
                    r.entry.summary,
                    r.backlink_count
                )
            })
            .collect();

        ToolResult::success(blocks.join("\n\n")).with_metadata(json!({
            "query": params.query,
            "result_count": results.len(),
        }))
    }
}

// --- kb_list ---

pub struct KbListTool {
    definition: ToolDefinition,
}

impl KbListTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "type".to_string(),
            PropertySchema::string("Filter by entry type.").with_enum(entry_type_values()),
        );
        properties.insert(
            "tag".to_string(),
            PropertySchema::string("Filter by tag. Combined with type as AND."),
        );

        Self {
            definition: ToolDefinition {
                name: "kb_list".to_string(),
                description: "List knowledge base entries. Filter by type \
                              (concept, reference, insight, question, note) and/or tag. \
                              Returns title, type, summary, tags, and connection density \
                              for each entry."
                    .to_string(),
                input_schema: ToolInputSchema::object(properties, &[]),
                group: ToolGroup::Knowledge,
            },
        }
    }
}

impl Default for KbListTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(rename = "type")]
    type_filter: Option<String>,
    tag: Option<String>,
}

#[async_trait]
impl Tool for KbListTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let params: ListParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        let type_filter = match params.type_filter.as_deref() {
            Some(raw) => match raw.parse::<EntryType>() {
                Ok(t) => Some(t),
                Err(_) => return ToolResult::error(format!("Unknown entry type: {}", raw)),
            },
            None => None,
        };

        context.kb.ensure_fresh().await;
        let snapshot = context.kb.snapshot();
        let entries = search::list(&snapshot, type_filter, params.tag.as_deref());

        if entries.is_empty() {
            return ToolResult::success("No entries found.");
        }

        let blocks: Vec<String> = entries
            .iter()
            .map(|e| {
                format!(
                    "[{}] {}\n  path: {}\n  tags: {}\n  summary: {}\n  edges: {}  backlinks: {}",
                    e.entry_type.as_ref(),
                    e.title,
                    e.path,
                    e.tags.join(", "),
                    e.summary,
                    e.edges.len(),
                    snapshot.backlink_count(&e.path)
                )
            })
            .collect();

        ToolResult::success(blocks.join("\n\n")).with_metadata(json!({
            "result_count": entries.len(),
        }))
    }
}

// --- kb_read ---

pub struct KbReadTool {
    definition: ToolDefinition,
}

impl KbReadTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "path".to_string(),
            PropertySchema::string("Entry path, e.g. /knowledge/rlhf.md."),
        );

        Self {
            definition: ToolDefinition {
                name: "kb_read".to_string(),
                description: "Read a knowledge base entry by path \
                              (e.g. /knowledge/rlhf.md). Returns frontmatter \
                              (title, summary, tags, edges, sources) and markdown body \
                              with cross-reference links. Also returns computed backlinks."
                    .to_string(),
                input_schema: ToolInputSchema::object(properties, &["path"]),
                group: ToolGroup::Knowledge,
            },
        }
    }
}

impl Default for KbReadTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ReadParams {
    path: String,
}

/// Render one entry with its computed backlinks, shared by tool and CLI
pub fn render_entry(snapshot: &Snapshot, path: &str) -> Option<String> {
    let entry = snapshot.get(path)?;
    let backlinks = snapshot.backlinks(path);

    let mut parts = vec![
        format!("# {}", entry.title),
        format!("type: {}", entry.entry_type.as_ref()),
        format!("summary: {}", entry.summary),
        format!("tags: {}", entry.tags.join(", ")),
        format!("created: {}", entry.created),
    ];
    if let Some(updated) = entry.updated {
        parts.push(format!("updated: {}", updated));
    }
    if !entry.edges.is_empty() {
        parts.push("\nedges:".to_string());
        for edge in &entry.edges {
            let desc = edge
                .description
                .as_deref()
                .map(|d| format!(" - {}", d))
                .unwrap_or_default();
            parts.push(format!("  [{}] {}{}", edge.label, edge.path, desc));
        }
    }
    if !entry.sources.is_empty() {
        parts.push("\nsources:".to_string());
        for source in &entry.sources {
            let title = source
                .title
                .as_deref()
                .map(|t| format!(" ({})", t))
                .unwrap_or_default();
            parts.push(format!("  {}{}", source.url, title));
        }
    }
    if !backlinks.is_empty() {
        parts.push("\nbacklinks:".to_string());
        for bl in backlinks {
            let desc = bl
                .description
                .as_deref()
                .map(|d| format!(" - {}", d))
                .unwrap_or_default();
            parts.push(format!("  [{}] {} ({}){}", bl.label, bl.path, bl.title, desc));
        }
    }
    parts.push(format!("\n---\n{}", entry.body));
    Some(parts.join("\n"))
}

#[async_trait]
impl Tool for KbReadTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let params: ReadParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        context.kb.ensure_fresh().await;
        let snapshot = context.kb.snapshot();

        match render_entry(&snapshot, &params.path) {
            Some(output) => ToolResult::success(output).with_metadata(json!({
                "path": params.path,
                "backlink_count": snapshot.backlink_count(&params.path),
            })),
            None => ToolResult::error(format!("Entry not found: {}", params.path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::kb::frontmatter::parse_entry;
    use crate::kb::source::{RawDocument, RefreshOutcome};
    use crate::kb::{DocumentSource, KnowledgeBase, RefreshError};
    use std::path::PathBuf;
    use std::sync::Arc;

    struct StaticSource(Vec<RawDocument>);

    #[async_trait]
    impl DocumentSource for StaticSource {
        async fn documents(&self) -> std::io::Result<Vec<RawDocument>> {
            Ok(self.0.clone())
        }

        async fn refresh(&self) -> Result<RefreshOutcome, RefreshError> {
            Ok(RefreshOutcome { changed: false })
        }
    }

    fn test_config() -> Config {
        Config {
            knowledge_root: PathBuf::from("."),
            github_owner: None,
            github_repo: None,
            default_branch: "main".to_string(),
            auto_pull: false,
            port: 8080,
        }
    }

    async fn context() -> ToolContext {
        let alpha = (
            "/knowledge/alpha.md".to_string(),
            "---\ntitle: Alpha\ntype: concept\nsummary: first letter\ntags: [greek]\ncreated: 2025-01-01\nedges:\n  - label: relates-to\n    path: /knowledge/beta.md\n---\nAlpha body.\n".to_string(),
        );
        let beta = (
            "/knowledge/beta.md".to_string(),
            "---\ntitle: Beta\ntype: concept\nsummary: second letter\ntags: [greek]\ncreated: 2025-01-02\n---\nBeta body.\n".to_string(),
        );
        let kb = KnowledgeBase::open(Box::new(StaticSource(vec![alpha, beta])), false)
            .await
            .unwrap();
        ToolContext {
            kb: Arc::new(kb),
            config: test_config(),
        }
    }

    #[tokio::test]
    async fn test_search_tool_ranks_beta_first() {
        let ctx = context().await;
        let tool = KbSearchTool::new();
        let result = tool.execute(json!({"query": "beta"}), &ctx).await;
        assert!(result.success);
        assert!(result.output.starts_with("[concept] Beta"));
    }

    #[tokio::test]
    async fn test_search_tool_no_results() {
        let ctx = context().await;
        let tool = KbSearchTool::new();
        let result = tool.execute(json!({"query": "zzz"}), &ctx).await;
        assert!(result.success);
        assert_eq!(result.output, "No results found.");
    }

    #[tokio::test]
    async fn test_list_tool_rejects_unknown_type() {
        let ctx = context().await;
        let tool = KbListTool::new();
        let result = tool.execute(json!({"type": "diagram"}), &ctx).await;
        assert!(!result.success);
        assert!(result.output.contains("Unknown entry type"));
    }

    #[tokio::test]
    async fn test_list_tool_filters() {
        let ctx = context().await;
        let tool = KbListTool::new();
        let result = tool
            .execute(json!({"type": "concept", "tag": "greek"}), &ctx)
            .await;
        assert!(result.success);
        assert!(result.output.contains("Alpha"));
        assert!(result.output.contains("Beta"));
    }

    #[tokio::test]
    async fn test_read_tool_includes_backlinks() {
        let ctx = context().await;
        let tool = KbReadTool::new();
        let result = tool.execute(json!({"path": "/knowledge/beta.md"}), &ctx).await;
        assert!(result.success);
        assert!(result.output.contains("# Beta"));
        assert!(result.output.contains("backlinks:"));
        assert!(result.output.contains("[relates-to] /knowledge/alpha.md (Alpha)"));
        assert!(result.output.contains("Beta body."));
    }

    #[tokio::test]
    async fn test_read_tool_not_found() {
        let ctx = context().await;
        let tool = KbReadTool::new();
        let result = tool.execute(json!({"path": "/knowledge/nope.md"}), &ctx).await;
        assert!(!result.success);
        assert!(result.output.contains("Entry not found"));
    }

    #[test]
    fn test_render_entry_orders_edges() {
        let doc = "---\ntitle: T\ntype: note\nsummary: s\ncreated: 2025-01-01\nedges:\n  - label: first\n    path: /knowledge/a.md\n  - label: second\n    path: /knowledge/b.md\n---\n";
        let snap = Snapshot::build(vec![parse_entry("/knowledge/t.md", doc).unwrap()]);
        let rendered = render_entry(&snap, "/knowledge/t.md").unwrap();
        let first = rendered.find("[first]").unwrap();
        let second = rendered.find("[second]").unwrap();
        assert!(first < second);
    }
}
