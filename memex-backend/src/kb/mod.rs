//! Knowledge index engine.
//!
//! Parses entry documents into a validated in-memory snapshot, derives the
//! backlink graph, and answers search/listing/statistics queries. The
//! snapshot is rebuilt wholesale from source documents; nothing derived is
//! ever persisted.

pub mod entry;
pub mod frontmatter;
pub mod index;
pub mod search;
pub mod source;

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::defaults;

pub use entry::{Backlink, Edge, Entry, EntryType, ParseError, Source};
pub use index::{GraphIndex, Snapshot};
pub use search::SearchResult;
pub use source::{DocumentSource, GitDocumentSource, RefreshError};

/// Outcome of one batch load. Skipped documents carry their parse errors;
/// they never abort the load.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<(String, ParseError)>,
}

/// The knowledge base: owns the graph index, the document source, and the
/// freshness policy. Queries read an acquired snapshot; `ensure_fresh`
/// runs before the snapshot is handed out, never during a query.
pub struct KnowledgeBase {
    index: GraphIndex,
    source: Box<dyn DocumentSource>,
    auto_pull: bool,
    /// Completion time of the last freshness check. The lock also
    /// serializes refreshes (single writer); the previous snapshot keeps
    /// serving readers while one is in flight.
    last_check: tokio::sync::Mutex<Option<Instant>>,
    debounce: Duration,
}

impl KnowledgeBase {
    /// Build the index from whatever documents the source currently has.
    /// Parse failures are logged and skipped; an unreadable source is fatal
    /// here (there is nothing to serve yet).
    pub async fn open(source: Box<dyn DocumentSource>, auto_pull: bool) -> io::Result<Self> {
        let kb = Self {
            index: GraphIndex::new(),
            source,
            auto_pull,
            last_check: tokio::sync::Mutex::new(None),
            debounce: Duration::from_secs(defaults::REFRESH_DEBOUNCE_SECS),
        };
        kb.reload().await?;
        Ok(kb)
    }

    /// At most one freshness check per entry point (tool call or CLI
    /// invocation), debounced so bursts against a long-lived server do not
    /// re-pull on every call. Best-effort: a failed or timed-out refresh
    /// logs a warning and leaves the last snapshot serving.
    pub async fn ensure_fresh(&self) {
        if !self.auto_pull {
            return;
        }

        let mut last_check = self.last_check.lock().await;
        if let Some(at) = *last_check {
            if at.elapsed() < self.debounce {
                return;
            }
        }

        match self.source.refresh().await {
            Ok(outcome) => {
                if outcome.changed {
                    if let Err(e) = self.reload().await {
                        log::warn!("[SYNC] reload after pull failed: {}", e);
                    }
                }
            }
            Err(e) => {
                log::warn!("[SYNC] refresh failed, serving last snapshot: {}", e);
            }
        }
        // failures debounce too; one warning per window is enough
        *last_check = Some(Instant::now());
    }

    /// Re-parse every source document and atomically replace the snapshot
    pub async fn reload(&self) -> io::Result<LoadReport> {
        let documents = self.source.documents().await?;

        let mut report = LoadReport::default();
        let mut entries = Vec::with_capacity(documents.len());
        for (path, content) in documents {
            match frontmatter::parse_entry(&path, &content) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    log::warn!("[KB] skipping {}: {}", path, e);
                    report.skipped.push((path, e));
                }
            }
        }
        report.loaded = entries.len();

        self.index.load(entries);
        log::info!(
            "[KB] Indexed {} entries ({} skipped)",
            report.loaded,
            report.skipped.len()
        );
        Ok(report)
    }

    /// The current snapshot. Holders keep it valid across later reloads.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.index.snapshot()
    }

    pub fn entry_count(&self) -> usize {
        self.snapshot().len()
    }

    pub fn edge_count(&self) -> usize {
        self.snapshot().edge_count()
    }

    pub fn type_counts(&self) -> std::collections::HashMap<EntryType, usize> {
        search::type_counts(&self.snapshot())
    }

    pub fn tag_counts(&self) -> std::collections::HashMap<String, usize> {
        search::tag_counts(&self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::source::{RawDocument, RefreshOutcome};
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSource {
        docs: parking_lot::Mutex<Vec<RawDocument>>,
        refreshes: AtomicUsize,
        fail_refresh: bool,
    }

    impl FakeSource {
        fn new(docs: Vec<RawDocument>) -> Arc<Self> {
            Arc::new(Self {
                docs: parking_lot::Mutex::new(docs),
                refreshes: AtomicUsize::new(0),
                fail_refresh: false,
            })
        }

        fn failing(docs: Vec<RawDocument>) -> Arc<Self> {
            Arc::new(Self {
                docs: parking_lot::Mutex::new(docs),
                refreshes: AtomicUsize::new(0),
                fail_refresh: true,
            })
        }
    }

    #[async_trait]
    impl DocumentSource for Arc<FakeSource> {
        async fn documents(&self) -> io::Result<Vec<RawDocument>> {
            Ok(self.docs.lock().clone())
        }

        async fn refresh(&self) -> Result<RefreshOutcome, RefreshError> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            if self.fail_refresh {
                return Err(RefreshError::Pull("remote unreachable".to_string()));
            }
            Ok(RefreshOutcome { changed: true })
        }
    }

    fn doc(path: &str, title: &str) -> RawDocument {
        (
            path.to_string(),
            format!(
                "---\ntitle: {}\ntype: concept\nsummary: about {}\ncreated: 2025-01-01\n---\nbody\n",
                title, title
            ),
        )
    }

    #[tokio::test]
    async fn test_open_skips_bad_documents() {
        let bad = (
            "/knowledge/bad.md".to_string(),
            "---\ntype: note\nsummary: s\ncreated: 2025-01-01\n---\n".to_string(),
        );
        let source = FakeSource::new(vec![doc("/knowledge/a.md", "Alpha"), bad]);
        let kb = KnowledgeBase::open(Box::new(source.clone()), false)
            .await
            .unwrap();

        assert_eq!(kb.entry_count(), 1);
        let report = kb.reload().await.unwrap();
        assert_eq!(report.loaded, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].1, ParseError::MissingField("title"));
        // the valid document still serves
        assert!(kb.snapshot().get("/knowledge/a.md").is_some());
    }

    #[tokio::test]
    async fn test_refresh_failure_degrades_to_stale_snapshot() {
        let source = FakeSource::failing(vec![doc("/knowledge/a.md", "Alpha")]);
        let kb = KnowledgeBase::open(Box::new(source.clone()), true)
            .await
            .unwrap();

        kb.ensure_fresh().await;
        assert_eq!(source.refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(kb.entry_count(), 1);
        assert!(kb.snapshot().get("/knowledge/a.md").is_some());
    }

    #[tokio::test]
    async fn test_ensure_fresh_reloads_on_change() {
        let source = FakeSource::new(vec![doc("/knowledge/a.md", "Alpha")]);
        let kb = KnowledgeBase::open(Box::new(source.clone()), true)
            .await
            .unwrap();
        assert_eq!(kb.entry_count(), 1);

        // the source grows a document between sessions
        source.docs.lock().push(doc("/knowledge/b.md", "Beta"));

        kb.ensure_fresh().await;
        assert_eq!(kb.entry_count(), 2);
    }

    #[tokio::test]
    async fn test_ensure_fresh_debounces() {
        let source = FakeSource::new(vec![doc("/knowledge/a.md", "Alpha")]);
        let kb = KnowledgeBase::open(Box::new(source.clone()), true)
            .await
            .unwrap();

        kb.ensure_fresh().await;
        kb.ensure_fresh().await;
        kb.ensure_fresh().await;

        assert_eq!(source.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_auto_pull_disabled_never_refreshes() {
        let source = FakeSource::new(vec![doc("/knowledge/a.md", "Alpha")]);
        let kb = KnowledgeBase::open(Box::new(source.clone()), false)
            .await
            .unwrap();

        kb.ensure_fresh().await;
        assert_eq!(source.refreshes.load(Ordering::SeqCst), 0);
    }
}
