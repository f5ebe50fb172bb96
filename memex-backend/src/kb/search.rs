//! Query engine — ranked search and filtered listing over one snapshot.
//!
//! Every function here is a pure read of the snapshot it is handed; nothing
//! triggers a reload. Freshness is the sync coordinator's job, before the
//! snapshot is acquired.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::entry::{Entry, EntryType};
use super::index::Snapshot;

// Fixed ranking weights, per term occurrence. Backlink bonus only applies
// once some text term matched, so well-linked entries rank higher on ties
// without ever surfacing on link count alone.
const TITLE_WEIGHT: f64 = 3.0;
const TAG_WEIGHT: f64 = 2.0;
const SUMMARY_WEIGHT: f64 = 1.0;
const BACKLINK_BONUS: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub entry: Entry,
    pub score: f64,
    pub backlink_count: usize,
}

/// Ranked full-text search. Query is lower-cased and whitespace-tokenized;
/// entries with no matching token are excluded. Sorted by descending score,
/// ties broken by ascending path, capped at `limit`.
pub fn search(snapshot: &Snapshot, query: &str, limit: usize) -> Vec<SearchResult> {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    if terms.is_empty() {
        return Vec::new();
    }

    let mut results: Vec<SearchResult> = Vec::new();
    for entry in snapshot.all() {
        let title = entry.title.to_lowercase();
        let summary = entry.summary.to_lowercase();
        let tags: Vec<String> = entry.tags.iter().map(|t| t.to_lowercase()).collect();

        let mut score = 0.0;
        for term in &terms {
            score += title.matches(term.as_str()).count() as f64 * TITLE_WEIGHT;
            score += tags.iter().filter(|t| *t == term).count() as f64 * TAG_WEIGHT;
            score += summary.matches(term.as_str()).count() as f64 * SUMMARY_WEIGHT;
        }
        if score == 0.0 {
            continue;
        }

        let backlink_count = snapshot.backlink_count(&entry.path);
        results.push(SearchResult {
            entry: entry.clone(),
            score: score + backlink_count as f64 * BACKLINK_BONUS,
            backlink_count,
        });
    }

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.entry.path.cmp(&b.entry.path))
    });
    results.truncate(limit);
    results
}

/// Unranked listing in snapshot order. Filters are optional and AND-combined.
pub fn list(
    snapshot: &Snapshot,
    type_filter: Option<EntryType>,
    tag_filter: Option<&str>,
) -> Vec<Entry> {
    snapshot
        .all()
        .iter()
        .filter(|e| type_filter.is_none_or(|t| e.entry_type == t))
        .filter(|e| tag_filter.is_none_or(|tag| e.tags.iter().any(|t| t == tag)))
        .cloned()
        .collect()
}

/// Entry count per type. Unsorted; display ordering is the caller's choice.
pub fn type_counts(snapshot: &Snapshot) -> HashMap<EntryType, usize> {
    let mut counts = HashMap::new();
    for entry in snapshot.all() {
        *counts.entry(entry.entry_type).or_insert(0) += 1;
    }
    counts
}

/// Entry count per tag. Unsorted; display ordering is the caller's choice.
pub fn tag_counts(snapshot: &Snapshot) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for entry in snapshot.all() {
        for tag in &entry.tags {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kb::frontmatter::parse_entry;
    use crate::kb::index::Snapshot;

    fn doc(path: &str, title: &str, entry_type: &str, tags: &str, summary: &str) -> Entry {
        let doc = format!(
            "---\ntitle: {}\ntype: {}\nsummary: {}\ntags: [{}]\ncreated: 2025-01-01\n---\n",
            title, entry_type, summary, tags
        );
        parse_entry(path, &doc).unwrap()
    }

    fn linked(path: &str, title: &str, target: &str) -> Entry {
        let doc = format!(
            "---\ntitle: {}\ntype: concept\nsummary: links out\ncreated: 2025-01-01\nedges:\n  - label: relates-to\n    path: {}\n---\n",
            title, target
        );
        parse_entry(path, &doc).unwrap()
    }

    #[test]
    fn test_search_excludes_zero_match_entries() {
        let snap = Snapshot::build(vec![
            doc("/knowledge/a.md", "Alpha", "concept", "greek", "first letter"),
            doc("/knowledge/b.md", "Beta", "concept", "greek", "second letter"),
        ]);

        let results = search(&snap, "beta", 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entry.path, "/knowledge/b.md");
        assert!(results[0].score > 0.0);
    }

    #[test]
    fn test_title_outranks_tag_outranks_summary() {
        let snap = Snapshot::build(vec![
            doc("/knowledge/s.md", "Other", "note", "misc", "gradient descent explained"),
            doc("/knowledge/t.md", "Gradient Descent", "note", "misc", "optimizer"),
            doc("/knowledge/g.md", "Optimizers", "note", "gradient", "various methods"),
        ]);

        let results = search(&snap, "gradient", 10);
        let paths: Vec<&str> = results.iter().map(|r| r.entry.path.as_str()).collect();
        assert_eq!(paths, vec!["/knowledge/t.md", "/knowledge/g.md", "/knowledge/s.md"]);
    }

    #[test]
    fn test_backlink_bonus_breaks_text_ties() {
        let snap = Snapshot::build(vec![
            doc("/knowledge/a.md", "Attention", "concept", "", "mechanism"),
            doc("/knowledge/b.md", "Attention", "concept", "", "mechanism"),
            linked("/knowledge/c.md", "Citer", "/knowledge/b.md"),
        ]);

        let results = search(&snap, "attention", 10);
        assert_eq!(results[0].entry.path, "/knowledge/b.md");
        assert_eq!(results[0].backlink_count, 1);
        assert_eq!(results[1].entry.path, "/knowledge/a.md");
    }

    #[test]
    fn test_exact_ties_break_by_ascending_path() {
        let snap = Snapshot::build(vec![
            doc("/knowledge/z.md", "Twin", "note", "", "same text"),
            doc("/knowledge/a.md", "Twin", "note", "", "same text"),
        ]);

        let results = search(&snap, "twin", 10);
        assert_eq!(results[0].entry.path, "/knowledge/a.md");
        assert_eq!(results[1].entry.path, "/knowledge/z.md");
    }

    #[test]
    fn test_search_respects_limit() {
        let entries: Vec<Entry> = (0..10)
            .map(|i| {
                doc(
                    &format!("/knowledge/n{}.md", i),
                    "Common Topic",
                    "note",
                    "",
                    "shared",
                )
            })
            .collect();
        let snap = Snapshot::build(entries);
        assert_eq!(search(&snap, "common", 3).len(), 3);
    }

    #[test]
    fn test_list_filters_and_combine() {
        let snap = Snapshot::build(vec![
            doc("/knowledge/a.md", "A", "concept", "ml", "alpha"),
            doc("/knowledge/b.md", "B", "concept", "systems", "beta"),
            doc("/knowledge/c.md", "C", "question", "ml", "gamma"),
        ]);

        let concepts = list(&snap, Some(EntryType::Concept), None);
        assert_eq!(concepts.len(), 2);
        assert!(concepts.iter().all(|e| e.entry_type == EntryType::Concept));
        // snapshot order preserved
        assert_eq!(concepts[0].path, "/knowledge/a.md");

        let ml_concepts = list(&snap, Some(EntryType::Concept), Some("ml"));
        assert_eq!(ml_concepts.len(), 1);
        assert_eq!(ml_concepts[0].path, "/knowledge/a.md");

        assert_eq!(list(&snap, None, None).len(), 3);
    }

    #[test]
    fn test_counts() {
        let snap = Snapshot::build(vec![
            doc("/knowledge/a.md", "A", "concept", "ml, systems", "alpha"),
            doc("/knowledge/b.md", "B", "concept", "ml", "beta"),
            doc("/knowledge/c.md", "C", "note", "", "gamma"),
        ]);

        let types = type_counts(&snap);
        assert_eq!(types[&EntryType::Concept], 2);
        assert_eq!(types[&EntryType::Note], 1);

        let tags = tag_counts(&snap);
        assert_eq!(tags["ml"], 2);
        assert_eq!(tags["systems"], 1);
    }
}
