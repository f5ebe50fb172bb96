//! Static site snapshot builder.
//!
//! Walks the knowledge directory, parses entries, and writes the viewer's
//! `data.json`: all entries with computed backlinks, the full link graph,
//! and corpus statistics. Markdown bodies ship raw; the viewer renders
//! them client-side.

use std::io;
use std::path::Path;

use serde_json::{json, Value};

use crate::kb::frontmatter::parse_entry;
use crate::kb::source::read_knowledge_documents;
use crate::kb::{search, Snapshot};

#[derive(Debug)]
pub struct SiteReport {
    pub entries: usize,
    pub edges: usize,
    pub skipped: usize,
}

/// Build the viewer data snapshot from a knowledge checkout and write it to
/// `output`. Unparseable documents are skipped, like any other load.
pub fn build(root: &Path, output: &Path) -> io::Result<SiteReport> {
    let documents = read_knowledge_documents(root)?;

    let mut skipped = 0;
    let mut entries = Vec::new();
    for (path, content) in documents {
        match parse_entry(&path, &content) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                log::warn!("[SITE] skipping {}: {}", path, e);
                skipped += 1;
            }
        }
    }

    let snapshot = Snapshot::build(entries);
    let data = render(&snapshot);

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, serde_json::to_string_pretty(&data)?)?;

    let report = SiteReport {
        entries: snapshot.len(),
        edges: snapshot.edge_count(),
        skipped,
    };
    log::info!(
        "[SITE] Built {}: {} entries, {} edges",
        output.display(),
        report.entries,
        report.edges
    );
    Ok(report)
}

/// Render the full viewer payload from a snapshot
pub fn render(snapshot: &Snapshot) -> Value {
    let mut entries_data = Vec::new();
    let mut graph_nodes = Vec::new();
    let mut graph_edges = Vec::new();

    for entry in snapshot.all() {
        entries_data.push(json!({
            "path": entry.path,
            "slug": entry.slug,
            "title": entry.title,
            "type": entry.entry_type,
            "summary": entry.summary,
            "tags": entry.tags,
            "created": entry.created,
            "updated": entry.updated,
            "edges": entry.edges,
            "backlinks": snapshot.backlinks(&entry.path),
            "sources": entry.sources,
            "body": entry.body,
        }));

        graph_nodes.push(json!({
            "id": entry.path,
            "title": entry.title,
            "type": entry.entry_type,
        }));

        for edge in &entry.edges {
            graph_edges.push(json!({
                "from": entry.path,
                "to": edge.path,
                "label": edge.label,
            }));
        }
    }

    let mut tags: Vec<String> = search::tag_counts(snapshot).into_keys().collect();
    tags.sort();

    json!({
        "entries": entries_data,
        "graph": {
            "nodes": graph_nodes,
            "edges": graph_edges,
        },
        "stats": {
            "total": snapshot.len(),
            "by_type": search::type_counts(snapshot)
                .into_iter()
                .map(|(t, c)| (t.as_ref().to_string(), c))
                .collect::<std::collections::HashMap<String, usize>>(),
            "tags": tags,
            "total_edges": graph_edges.len(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_doc(dir: &Path, name: &str, title: &str, extra: &str) {
        let doc = format!(
            "---\ntitle: {}\ntype: concept\nsummary: about {}\ncreated: 2025-01-01\n{}---\nbody of {}\n",
            title, title, extra, title
        );
        fs::write(dir.join(name), doc).unwrap();
    }

    #[test]
    fn test_build_writes_snapshot() {
        let dir = tempdir().unwrap();
        let kb = dir.path().join("knowledge");
        fs::create_dir(&kb).unwrap();
        write_doc(
            &kb,
            "alpha.md",
            "Alpha",
            "edges:\n  - label: relates-to\n    path: /knowledge/beta.md\n",
        );
        write_doc(&kb, "beta.md", "Beta", "");
        fs::write(kb.join("broken.md"), "no frontmatter").unwrap();

        let output = dir.path().join("viewer/data.json");
        let report = build(dir.path(), &output).unwrap();
        assert_eq!(report.entries, 2);
        assert_eq!(report.edges, 1);
        assert_eq!(report.skipped, 1);

        let data: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(data["stats"]["total"], 2);
        assert_eq!(data["stats"]["total_edges"], 1);
        assert_eq!(data["stats"]["by_type"]["concept"], 2);
        assert_eq!(data["graph"]["edges"][0]["to"], "/knowledge/beta.md");

        // beta carries the computed backlink from alpha
        let beta = data["entries"]
            .as_array()
            .unwrap()
            .iter()
            .find(|e| e["path"] == "/knowledge/beta.md")
            .unwrap();
        assert_eq!(beta["backlinks"][0]["path"], "/knowledge/alpha.md");
        assert_eq!(beta["backlinks"][0]["label"], "relates-to");
    }
}
