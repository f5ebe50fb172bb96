//! GitHub contents/refs API client for knowledge repo assets.
//!
//! Uploads image assets and creates feature branches so the cloud agent can
//! pick them up. Entry documents themselves are never written from here;
//! they arrive via agent PRs.

use base64::Engine;
use reqwest::header;
use serde_json::{json, Value};

const API_BASE: &str = "https://api.github.com";

/// Image types accepted for asset upload
pub const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg"];

/// Whether a filename carries a supported image extension
pub fn is_supported_image(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

#[derive(Debug, Clone)]
pub struct UploadResult {
    pub path: String,
    pub branch: String,
    pub sha: String,
}

pub struct GitHubClient {
    client: reqwest::Client,
    owner: String,
    repo: String,
}

impl GitHubClient {
    pub fn new(token: &str, owner: &str, repo: &str) -> Result<Self, String> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {}", token)
                .parse()
                .map_err(|_| "Invalid token for Authorization header".to_string())?,
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static("2022-11-28"),
        );

        let client = reqwest::Client::builder()
            .user_agent(concat!("memex-backend/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    fn repo_prefix(&self) -> String {
        format!("{}/repos/{}/{}", API_BASE, self.owner, self.repo)
    }

    /// Ensure a branch exists, creating it from `base` if needed.
    /// Returns the sha the branch points at (base sha when newly created).
    pub async fn ensure_branch(&self, branch: &str, base: &str) -> Result<String, String> {
        let resp = self
            .client
            .get(format!("{}/git/ref/heads/{}", self.repo_prefix(), branch))
            .send()
            .await
            .map_err(|e| format!("Failed to query branch '{}': {}", branch, e))?;

        if resp.status().is_success() {
            let body: Value = resp.json().await.map_err(|e| e.to_string())?;
            return ref_sha(&body).ok_or_else(|| "Malformed ref response".to_string());
        }

        let base_resp = self
            .client
            .get(format!("{}/git/ref/heads/{}", self.repo_prefix(), base))
            .send()
            .await
            .map_err(|e| format!("Failed to query base branch '{}': {}", base, e))?;
        if !base_resp.status().is_success() {
            return Err(format!(
                "Base branch '{}' not found: {}",
                base,
                base_resp.status()
            ));
        }
        let base_body: Value = base_resp.json().await.map_err(|e| e.to_string())?;
        let base_sha = ref_sha(&base_body).ok_or_else(|| "Malformed ref response".to_string())?;

        let create_resp = self
            .client
            .post(format!("{}/git/refs", self.repo_prefix()))
            .json(&json!({
                "ref": format!("refs/heads/{}", branch),
                "sha": base_sha,
            }))
            .send()
            .await
            .map_err(|e| format!("Failed to create branch '{}': {}", branch, e))?;

        if !create_resp.status().is_success() {
            let status = create_resp.status();
            let body = create_resp.text().await.unwrap_or_default();
            return Err(format!(
                "Failed to create branch '{}': {} {}",
                branch, status, body
            ));
        }

        log::info!("[GITHUB] Created branch '{}' from '{}'", branch, base);
        Ok(base_sha)
    }

    /// Upload (create or update) a file via the contents API
    pub async fn upload_file(
        &self,
        repo_path: &str,
        content: &[u8],
        branch: &str,
        message: Option<&str>,
    ) -> Result<UploadResult, String> {
        let filename = repo_path.rsplit('/').next().unwrap_or(repo_path);
        let message = message
            .map(|m| m.to_string())
            .unwrap_or_else(|| format!("upload {}", filename));

        let encoded = base64::engine::general_purpose::STANDARD.encode(content);

        // updating an existing file requires its current sha
        let mut payload = json!({
            "message": message,
            "content": encoded,
            "branch": branch,
        });
        if let Some(sha) = self.get_file_sha(repo_path, branch).await {
            payload["sha"] = json!(sha);
        }

        let resp = self
            .client
            .put(format!("{}/contents/{}", self.repo_prefix(), repo_path))
            .json(&payload)
            .send()
            .await
            .map_err(|e| format!("Failed to upload '{}': {}", repo_path, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("Failed to upload '{}': {} {}", repo_path, status, body));
        }

        let body: Value = resp.json().await.map_err(|e| e.to_string())?;
        let sha = body
            .get("content")
            .and_then(|c| c.get("sha"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        log::info!("[GITHUB] Uploaded {} to branch '{}'", repo_path, branch);
        Ok(UploadResult {
            path: repo_path.to_string(),
            branch: branch.to_string(),
            sha,
        })
    }

    /// List file paths in a repo directory; an absent directory lists empty
    pub async fn list_directory(&self, dir_path: &str, branch: &str) -> Result<Vec<String>, String> {
        let resp = self
            .client
            .get(format!("{}/contents/{}", self.repo_prefix(), dir_path))
            .query(&[("ref", branch)])
            .send()
            .await
            .map_err(|e| format!("Failed to list '{}': {}", dir_path, e))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !resp.status().is_success() {
            return Err(format!("Failed to list '{}': {}", dir_path, resp.status()));
        }

        let body: Value = resp.json().await.map_err(|e| e.to_string())?;
        let Some(items) = body.as_array() else {
            return Ok(Vec::new());
        };
        Ok(items
            .iter()
            .filter(|item| item.get("type").and_then(Value::as_str) == Some("file"))
            .filter_map(|item| item.get("path").and_then(Value::as_str))
            .map(|s| s.to_string())
            .collect())
    }

    async fn get_file_sha(&self, repo_path: &str, branch: &str) -> Option<String> {
        let resp = self
            .client
            .get(format!("{}/contents/{}", self.repo_prefix(), repo_path))
            .query(&[("ref", branch)])
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }
        let body: Value = resp.json().await.ok()?;
        body.get("sha").and_then(Value::as_str).map(|s| s.to_string())
    }
}

fn ref_sha(body: &Value) -> Option<String> {
    body.get("object")
        .and_then(|o| o.get("sha"))
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported_image() {
        assert!(is_supported_image("diagram.png"));
        assert!(is_supported_image("PHOTO.JPG"));
        assert!(is_supported_image("anim.webp"));
        assert!(!is_supported_image("notes.md"));
        assert!(!is_supported_image("archive.tar.gz"));
    }

    #[test]
    fn test_ref_sha() {
        let body = serde_json::json!({"object": {"sha": "abc123"}});
        assert_eq!(ref_sha(&body).as_deref(), Some("abc123"));
        assert!(ref_sha(&serde_json::json!({})).is_none());
    }
}
