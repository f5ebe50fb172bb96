//! kb_add / kb_status — knowledge additions via the cloud agent.
//!
//! kb_add never writes entry documents itself: it hands the decomposition
//! prompt to a background agent that opens a PR against the knowledge repo.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::cloud_agent::CloudAgentClient;
use crate::config::{self, defaults};
use crate::github::GitHubClient;
use crate::prompt::build_prompt;
use crate::tools::types::{
    PropertySchema, Tool, ToolContext, ToolDefinition, ToolGroup, ToolInputSchema, ToolResult,
};

pub struct KbAddTool {
    definition: ToolDefinition,
}

impl KbAddTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "summary".to_string(),
            PropertySchema::string(
                "Natural language summary of the knowledge to add - concepts, \
                 insights, references, questions.",
            ),
        );
        properties.insert(
            "branch".to_string(),
            PropertySchema::string(
                "Branch to base the agent on (e.g. one where images were \
                 uploaded via kb_upload). Defaults to the default branch.",
            ),
        );

        Self {
            definition: ToolDefinition {
                name: "kb_add".to_string(),
                description: "Add knowledge to the base. Pass a natural language summary - \
                              concepts, insights, references, questions. A cloud agent will \
                              decompose it into atomic entries, create cross-references, \
                              and open a PR. Returns agent ID for status tracking."
                    .to_string(),
                input_schema: ToolInputSchema::object(properties, &["summary"]),
                group: ToolGroup::Agent,
            },
        }
    }
}

impl Default for KbAddTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct AddParams {
    summary: String,
    branch: Option<String>,
}

#[async_trait]
impl Tool for KbAddTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let params: AddParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        if params.summary.trim().is_empty() {
            return ToolResult::error("Error: Summary cannot be empty");
        }
        let Some(api_key) = config::cursor_api_key() else {
            return ToolResult::error("Error: CURSOR_API_KEY not configured");
        };
        let Some(repo_url) = context.config.repo_url() else {
            return ToolResult::error("Error: GitHub repository not configured");
        };

        let target_branch = params
            .branch
            .as_deref()
            .unwrap_or(context.config.default_branch.as_str());

        // best-effort asset inventory for the prompt
        let mut images: Vec<String> = Vec::new();
        if let (Some(token), Some(owner), Some(repo)) = (
            config::git_token(),
            context.config.github_owner.as_deref(),
            context.config.github_repo.as_deref(),
        ) {
            if let Ok(gh) = GitHubClient::new(&token, owner, repo) {
                match gh.list_directory(defaults::ASSETS_DIR, target_branch).await {
                    Ok(listing) => images = listing,
                    Err(e) => log::debug!("[AGENT] asset listing unavailable: {}", e),
                }
            }
        }

        context.kb.ensure_fresh().await;
        let prompt = build_prompt(params.summary.trim(), &context.kb.snapshot(), &images);

        let client = match CloudAgentClient::new(&api_key) {
            Ok(c) => c,
            Err(e) => return ToolResult::error(format!("Error: {}", e)),
        };
        match client.launch_agent(&prompt, &repo_url, target_branch).await {
            Ok(launch) => ToolResult::success(format!(
                "Cloud agent launched.\nAgent ID: {}\nDashboard: {}\nUse kb_status with this agent_id to check progress.",
                launch.agent_id, launch.agent_url
            ))
            .with_metadata(json!({
                "agent_id": launch.agent_id,
                "agent_url": launch.agent_url,
                "branch": target_branch,
            })),
            Err(e) => ToolResult::error(format!("Error: {}", e)),
        }
    }
}

pub struct KbStatusTool {
    definition: ToolDefinition,
}

impl KbStatusTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "agent_id".to_string(),
            PropertySchema::string("Agent ID returned by kb_add."),
        );

        Self {
            definition: ToolDefinition {
                name: "kb_status".to_string(),
                description: "Check status of a knowledge base update. \
                              Returns state (running/completed/failed) and PR URL when ready."
                    .to_string(),
                input_schema: ToolInputSchema::object(properties, &["agent_id"]),
                group: ToolGroup::Agent,
            },
        }
    }
}

impl Default for KbStatusTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct StatusParams {
    agent_id: String,
}

#[async_trait]
impl Tool for KbStatusTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, _context: &ToolContext) -> ToolResult {
        let params: StatusParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        let Some(api_key) = config::cursor_api_key() else {
            return ToolResult::error("Error: CURSOR_API_KEY not configured");
        };

        let client = match CloudAgentClient::new(&api_key) {
            Ok(c) => c,
            Err(e) => return ToolResult::error(format!("Error: {}", e)),
        };
        match client.get_status(&params.agent_id).await {
            Ok(status) => {
                let mut parts = vec![
                    format!("Status: {}", status.status),
                    format!("Dashboard: {}", status.agent_url),
                ];
                if let Some(pr_url) = &status.pr_url {
                    parts.push(format!("PR: {}", pr_url));
                }
                ToolResult::success(parts.join("\n")).with_metadata(json!({
                    "agent_id": params.agent_id,
                    "status": status.status,
                    "pr_url": status.pr_url,
                }))
            }
            Err(e) => ToolResult::error(format!("Error: {}", e)),
        }
    }
}
