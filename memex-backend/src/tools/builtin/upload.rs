//! kb_upload — push image assets to the knowledge repo.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::config::{self, defaults};
use crate::github::{is_supported_image, GitHubClient, IMAGE_EXTENSIONS};
use crate::tools::types::{
    PropertySchema, Tool, ToolContext, ToolDefinition, ToolGroup, ToolInputSchema, ToolResult,
};

pub struct KbUploadTool {
    definition: ToolDefinition,
}

impl KbUploadTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "source".to_string(),
            PropertySchema::string(
                "Local file path or URL of the image. Local paths require the \
                 server to run on the same machine; URLs work regardless.",
            ),
        );
        properties.insert(
            "branch".to_string(),
            PropertySchema::string(
                "Branch to push to. Created from the default branch if missing; \
                 omit to push to the default branch.",
            ),
        );

        Self {
            definition: ToolDefinition {
                name: "kb_upload".to_string(),
                description: "Upload an image to the knowledge base assets on GitHub. \
                              Accepts a local file path or a URL as the source. \
                              Optionally specify a branch - if omitted, pushes to the \
                              default branch. Returns the repo-relative path for use in \
                              markdown entries: ![alt](/knowledge/assets/filename.png)"
                    .to_string(),
                input_schema: ToolInputSchema::object(properties, &["source"]),
                group: ToolGroup::Assets,
            },
        }
    }
}

impl Default for KbUploadTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct UploadParams {
    source: String,
    branch: Option<String>,
}

/// Filename component of a local path or URL source
pub fn source_filename(source: &str) -> Option<String> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let url = Url::parse(source).ok()?;
        url.path_segments()?
            .filter(|s| !s.is_empty())
            .next_back()
            .map(|s| s.to_string())
    } else {
        Path::new(source)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
    }
}

/// Fetch the source bytes, from the network or the local filesystem
pub async fn read_source(source: &str) -> Result<Vec<u8>, String> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let resp = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?
            .get(source)
            .send()
            .await
            .map_err(|e| format!("Failed to fetch URL: {}", e))?;
        if !resp.status().is_success() {
            return Err(format!("Failed to fetch URL: {}", resp.status()));
        }
        Ok(resp.bytes().await.map_err(|e| e.to_string())?.to_vec())
    } else {
        tokio::fs::read(source)
            .await
            .map_err(|e| format!("File not found: {} ({})", source, e))
    }
}

#[async_trait]
impl Tool for KbUploadTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let params: UploadParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        let Some(token) = config::git_token() else {
            return ToolResult::error("Error: MEMEX_GIT_TOKEN not configured");
        };
        let (Some(owner), Some(repo)) = (
            context.config.github_owner.as_deref(),
            context.config.github_repo.as_deref(),
        ) else {
            return ToolResult::error("Error: GitHub repository not configured");
        };

        let Some(filename) = source_filename(&params.source) else {
            return ToolResult::error(format!("Cannot determine filename from: {}", params.source));
        };
        if !is_supported_image(&filename) {
            return ToolResult::error(format!(
                "Unsupported image type for '{}'. Supported: {}",
                filename,
                IMAGE_EXTENSIONS.join(", ")
            ));
        }

        let content = match read_source(&params.source).await {
            Ok(bytes) => bytes,
            Err(e) => return ToolResult::error(format!("Error: {}", e)),
        };

        let gh = match GitHubClient::new(&token, owner, repo) {
            Ok(gh) => gh,
            Err(e) => return ToolResult::error(format!("Error: {}", e)),
        };

        let default_branch = context.config.default_branch.as_str();
        let target_branch = params.branch.as_deref().unwrap_or(default_branch);
        if params.branch.is_some() {
            if let Err(e) = gh.ensure_branch(target_branch, default_branch).await {
                return ToolResult::error(format!("Error: {}", e));
            }
        }

        let repo_path = format!("{}/{}", defaults::ASSETS_DIR, filename);
        match gh.upload_file(&repo_path, &content, target_branch, None).await {
            Ok(result) => ToolResult::success(format!(
                "Uploaded: /{}\nBranch: {}\nUse in entries: ![alt](/{})",
                result.path, result.branch, result.path
            ))
            .with_metadata(json!({
                "path": format!("/{}", result.path),
                "branch": result.branch,
                "sha": result.sha,
            })),
            Err(e) => ToolResult::error(format!("Error: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_filename_from_url() {
        assert_eq!(
            source_filename("https://example.com/img/chart.png?raw=1").as_deref(),
            Some("chart.png")
        );
        assert_eq!(
            source_filename("https://example.com/").as_deref(),
            None
        );
    }

    #[test]
    fn test_source_filename_from_path() {
        assert_eq!(
            source_filename("/tmp/assets/photo.jpeg").as_deref(),
            Some("photo.jpeg")
        );
    }
}
