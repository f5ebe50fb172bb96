//! Graph index — the authoritative in-memory snapshot.
//!
//! A `Snapshot` is immutable: entries in load order, a path lookup map, and
//! the derived backlink index. `GraphIndex` holds the current snapshot
//! behind a single swap point; `load` builds a brand-new snapshot and swaps
//! the Arc, so in-flight readers keep whatever snapshot they acquired and
//! never observe a partially rebuilt index.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::entry::{Backlink, Entry};

pub struct Snapshot {
    entries: Vec<Entry>,
    by_path: HashMap<String, usize>,
    backlinks: HashMap<String, Vec<Backlink>>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            by_path: HashMap::new(),
            backlinks: HashMap::new(),
        }
    }

    /// Build a snapshot from parsed entries. A duplicate path overwrites the
    /// earlier entry in place (the set never holds two entries for one
    /// path). The backlink index is recomputed in full: entries in snapshot
    /// order, edges in entry order, appending to each target present in the
    /// set. Dangling edges stay on their source entry and produce nothing.
    pub fn build(parsed: Vec<Entry>) -> Self {
        let mut entries: Vec<Entry> = Vec::with_capacity(parsed.len());
        let mut by_path: HashMap<String, usize> = HashMap::with_capacity(parsed.len());

        for entry in parsed {
            match by_path.get(&entry.path) {
                Some(&idx) => entries[idx] = entry,
                None => {
                    by_path.insert(entry.path.clone(), entries.len());
                    entries.push(entry);
                }
            }
        }

        let mut backlinks: HashMap<String, Vec<Backlink>> = HashMap::new();
        for entry in &entries {
            for edge in &entry.edges {
                if !by_path.contains_key(&edge.path) {
                    continue;
                }
                backlinks.entry(edge.path.clone()).or_default().push(Backlink {
                    label: edge.label.clone(),
                    description: edge.description.clone(),
                    path: entry.path.clone(),
                    title: entry.title.clone(),
                });
            }
        }

        Self {
            entries,
            by_path,
            backlinks,
        }
    }

    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.by_path.get(path).map(|&idx| &self.entries[idx])
    }

    /// All entries in snapshot order (source load order)
    pub fn all(&self) -> &[Entry] {
        &self.entries
    }

    /// Backlinks for a path, ordered by the position of the source entries
    /// in the snapshot. Empty for unknown or unlinked paths.
    pub fn backlinks(&self, path: &str) -> &[Backlink] {
        self.backlinks.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn backlink_count(&self, path: &str) -> usize {
        self.backlinks(path).len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total forward edges across all entries (dangling included)
    pub fn edge_count(&self) -> usize {
        self.entries.iter().map(|e| e.edges.len()).sum()
    }
}

/// Single swap point for the current snapshot. Reads clone the Arc and
/// continue lock-free against that snapshot; `load` replaces it atomically.
pub struct GraphIndex {
    current: RwLock<Arc<Snapshot>>,
}

impl GraphIndex {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::empty())),
        }
    }

    /// Atomically replace the whole snapshot
    pub fn load(&self, entries: Vec<Entry>) {
        let snapshot = Arc::new(Snapshot::build(entries));
        *self.current.write() = snapshot;
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }
}

impl Default for GraphIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kb::frontmatter::parse_entry;

    fn entry(path: &str, title: &str, edges: &[(&str, &str)]) -> Entry {
        let mut doc = format!(
            "---\ntitle: {}\ntype: concept\nsummary: about {}\ncreated: 2025-01-01\n",
            title, title
        );
        if !edges.is_empty() {
            doc.push_str("edges:\n");
            for (label, target) in edges {
                doc.push_str(&format!("  - label: {}\n    path: {}\n", label, target));
            }
        }
        doc.push_str("---\nbody\n");
        parse_entry(path, &doc).unwrap()
    }

    #[test]
    fn test_get_and_path_uniqueness() {
        let snap = Snapshot::build(vec![
            entry("/knowledge/a.md", "Alpha", &[]),
            entry("/knowledge/b.md", "Beta", &[]),
            entry("/knowledge/a.md", "Alpha v2", &[]),
        ]);
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.get("/knowledge/a.md").unwrap().title, "Alpha v2");
        // first position kept
        assert_eq!(snap.all()[0].path, "/knowledge/a.md");
    }

    #[test]
    fn test_backlinks_basic() {
        let snap = Snapshot::build(vec![
            entry("/knowledge/a.md", "Alpha", &[("relates-to", "/knowledge/b.md")]),
            entry("/knowledge/b.md", "Beta", &[]),
        ]);

        let bls = snap.backlinks("/knowledge/b.md");
        assert_eq!(bls.len(), 1);
        assert_eq!(bls[0].path, "/knowledge/a.md");
        assert_eq!(bls[0].title, "Alpha");
        assert_eq!(bls[0].label, "relates-to");
        assert_eq!(snap.backlink_count("/knowledge/a.md"), 0);
    }

    #[test]
    fn test_dangling_edge_is_legal() {
        let snap = Snapshot::build(vec![entry(
            "/knowledge/a.md",
            "Alpha",
            &[("relates-to", "/knowledge/missing.md")],
        )]);

        // edge stays on the source entry
        assert_eq!(snap.get("/knowledge/a.md").unwrap().edges.len(), 1);
        // but never produces a backlink
        assert!(snap.backlinks("/knowledge/missing.md").is_empty());
        assert_eq!(snap.backlink_count("/knowledge/missing.md"), 0);
        assert_eq!(snap.edge_count(), 1);
    }

    #[test]
    fn test_backlink_order_follows_snapshot_order() {
        let snap = Snapshot::build(vec![
            entry("/knowledge/c.md", "Gamma", &[("supports", "/knowledge/t.md")]),
            entry("/knowledge/a.md", "Alpha", &[("relates-to", "/knowledge/t.md")]),
            entry("/knowledge/t.md", "Target", &[]),
        ]);

        let froms: Vec<&str> = snap
            .backlinks("/knowledge/t.md")
            .iter()
            .map(|b| b.path.as_str())
            .collect();
        // load order, not alphabetical
        assert_eq!(froms, vec!["/knowledge/c.md", "/knowledge/a.md"]);
    }

    #[test]
    fn test_reload_is_idempotent() {
        let docs = || {
            vec![
                entry("/knowledge/a.md", "Alpha", &[("relates-to", "/knowledge/b.md")]),
                entry("/knowledge/b.md", "Beta", &[]),
            ]
        };

        let index = GraphIndex::new();
        index.load(docs());
        let first = index.snapshot();
        index.load(docs());
        let second = index.snapshot();

        assert_eq!(first.all(), second.all());
        assert_eq!(
            first.backlinks("/knowledge/b.md"),
            second.backlinks("/knowledge/b.md")
        );
    }

    #[test]
    fn test_readers_keep_acquired_snapshot_across_load() {
        let index = GraphIndex::new();
        index.load(vec![entry("/knowledge/a.md", "Alpha", &[])]);

        let held = index.snapshot();
        index.load(vec![entry("/knowledge/b.md", "Beta", &[])]);

        assert!(held.get("/knowledge/a.md").is_some());
        assert!(held.get("/knowledge/b.md").is_none());
        let fresh = index.snapshot();
        assert!(fresh.get("/knowledge/b.md").is_some());
        assert!(fresh.get("/knowledge/a.md").is_none());
    }
}
