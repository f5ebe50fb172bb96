//! Document source — supplies (path, raw text) pairs and a refresh hook.
//!
//! The index engine never pulls the remote itself; it is handed a source
//! whose `refresh` is best-effort and bounded. A failed or timed-out
//! refresh leaves the previous snapshot serving.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::config::defaults;

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("refresh timed out after {0}s")]
    Timeout(u64),
    #[error("git pull failed: {0}")]
    Pull(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy)]
pub struct RefreshOutcome {
    /// Whether the local document set changed
    pub changed: bool,
}

/// One raw document: repo-relative path (leading slash) + contents
pub type RawDocument = (String, String);

#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Current documents under the knowledge root, in stable (lexicographic) order
    async fn documents(&self) -> io::Result<Vec<RawDocument>>;

    /// Pull the latest documents from the external source
    async fn refresh(&self) -> Result<RefreshOutcome, RefreshError>;
}

/// Knowledge documents in a local git checkout; refresh is `git pull`.
pub struct GitDocumentSource {
    root: PathBuf,
    timeout_secs: u64,
}

impl GitDocumentSource {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            timeout_secs: defaults::REFRESH_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl DocumentSource for GitDocumentSource {
    async fn documents(&self) -> io::Result<Vec<RawDocument>> {
        read_knowledge_documents(&self.root)
    }

    async fn refresh(&self) -> Result<RefreshOutcome, RefreshError> {
        let mut pull = tokio::process::Command::new("git");
        pull.args(["pull", "--ff-only"])
            .current_dir(&self.root)
            .kill_on_drop(true);

        let output = tokio::time::timeout(
            std::time::Duration::from_secs(self.timeout_secs),
            pull.output(),
        )
        .await
        .map_err(|_| RefreshError::Timeout(self.timeout_secs))??;

        if !output.status.success() {
            return Err(RefreshError::Pull(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let changed = !stdout.contains("Already up to date");
        log::debug!("[SYNC] git pull completed (changed: {})", changed);
        Ok(RefreshOutcome { changed })
    }
}

/// List and read `knowledge/*.md` under a checkout root, sorted by filename.
/// Paths are repo-relative with a leading slash ("/knowledge/foo.md").
/// Hidden files and subdirectories (e.g. knowledge/assets/) are skipped.
pub fn read_knowledge_documents(root: &Path) -> io::Result<Vec<RawDocument>> {
    let dir = root.join(defaults::KNOWLEDGE_DIR);
    let mut files: Vec<PathBuf> = Vec::new();

    if !dir.exists() {
        return Ok(Vec::new());
    }

    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        let path = entry.path();
        if path
            .file_name()
            .map(|n| n.to_string_lossy().starts_with('.'))
            .unwrap_or(false)
        {
            continue;
        }
        if path.is_file() && path.extension().map(|e| e == "md").unwrap_or(false) {
            files.push(path);
        }
    }
    files.sort();

    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let content = std::fs::read_to_string(&path)?;
        documents.push((format!("/{}/{}", defaults::KNOWLEDGE_DIR, name), content));
    }
    Ok(documents)
}
