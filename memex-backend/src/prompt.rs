//! Builds the instruction prompt handed to the cloud agent for kb_add.
//!
//! The agent sees the entry format contract, the current corpus inventory
//! (so new entries can link into the existing graph), and any uploaded
//! assets it may embed.

use crate::kb::Snapshot;

const ENTRY_FORMAT: &str = r#"Each entry is a markdown file under knowledge/ with YAML frontmatter:

---
title: Short display title
type: concept | reference | insight | question | note
summary: One or two sentences capturing the core idea.
tags: [lowercase, short, topical]
created: YYYY-MM-DD
edges:
  - label: relates-to
    path: /knowledge/other-entry.md
    description: optional note on why the link exists
sources:
  - url: https://example.com
    title: optional source title
---

Body in markdown. Keep entries atomic: one idea per file.
"#;

/// Render the decomposition prompt for a knowledge addition
pub fn build_prompt(summary: &str, snapshot: &Snapshot, images: &[String]) -> String {
    let mut out = String::new();

    out.push_str(
        "You maintain a personal knowledge base of atomic entries. \
         Decompose the new knowledge below into one entry per idea, \
         cross-referenced with typed edges, and open a pull request with \
         the new files.\n\n",
    );

    out.push_str("## Entry format\n\n");
    out.push_str(ENTRY_FORMAT);
    out.push('\n');

    out.push_str("## Rules\n\n");
    out.push_str(
        "- File names are lowercase slugs of the title (e.g. knowledge/reward-hacking.md).\n\
         - Link new entries to existing ones where a real relationship exists; \
           edge labels are short verb phrases like relates-to, supports, contradicts.\n\
         - Reuse existing tags when they fit before inventing new ones.\n\
         - Do not edit existing entries except to add a meaningful edge.\n\n",
    );

    if snapshot.is_empty() {
        out.push_str("## Existing entries\n\nThe knowledge base is currently empty.\n\n");
    } else {
        out.push_str("## Existing entries\n\n");
        for entry in snapshot.all() {
            out.push_str(&format!(
                "- {} [{}] {}\n",
                entry.path,
                entry.entry_type.as_ref(),
                entry.title
            ));
        }
        out.push('\n');
    }

    if !images.is_empty() {
        out.push_str("## Available images\n\n");
        out.push_str("Already uploaded to the repo; embed with ![alt](/path) where relevant:\n");
        for image in images {
            out.push_str(&format!("- /{}\n", image.trim_start_matches('/')));
        }
        out.push('\n');
    }

    out.push_str("## New knowledge\n\n");
    out.push_str(summary.trim());
    out.push('\n');

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kb::frontmatter::parse_entry;
    use crate::kb::Snapshot;

    fn snapshot() -> Snapshot {
        let doc = "---\ntitle: Alpha\ntype: concept\nsummary: first\ncreated: 2025-01-01\n---\n";
        Snapshot::build(vec![parse_entry("/knowledge/alpha.md", doc).unwrap()])
    }

    #[test]
    fn test_prompt_lists_inventory_and_summary() {
        let prompt = build_prompt("Transformers use attention.", &snapshot(), &[]);
        assert!(prompt.contains("- /knowledge/alpha.md [concept] Alpha"));
        assert!(prompt.contains("Transformers use attention."));
        assert!(prompt.contains("type: concept | reference | insight | question | note"));
        assert!(!prompt.contains("Available images"));
    }

    #[test]
    fn test_prompt_includes_images() {
        let images = vec!["knowledge/assets/diagram.png".to_string()];
        let prompt = build_prompt("s", &snapshot(), &images);
        assert!(prompt.contains("- /knowledge/assets/diagram.png"));
    }

    #[test]
    fn test_prompt_on_empty_corpus() {
        let prompt = build_prompt("s", &Snapshot::empty(), &[]);
        assert!(prompt.contains("currently empty"));
    }
}
