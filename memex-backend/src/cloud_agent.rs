//! Cloud agent client — launches and polls long-running remote agents.
//!
//! Knowledge additions are decomposed into atomic entries by a background
//! agent running against the knowledge repository; it opens a PR when done.
//! This client only starts agents and reads their status.

use reqwest::header;
use serde::Deserialize;
use serde_json::json;

const API_BASE: &str = "https://api.cursor.com/v0";

#[derive(Debug, Clone)]
pub struct AgentLaunch {
    pub agent_id: String,
    pub agent_url: String,
}

#[derive(Debug, Clone)]
pub struct AgentStatus {
    pub status: String,
    pub agent_url: String,
    pub pr_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AgentResponse {
    id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    target: Option<AgentTarget>,
}

#[derive(Debug, Deserialize)]
struct AgentTarget {
    #[serde(default)]
    url: Option<String>,
    #[serde(default, rename = "prUrl")]
    pr_url: Option<String>,
}

pub struct CloudAgentClient {
    client: reqwest::Client,
}

impl CloudAgentClient {
    pub fn new(api_key: &str) -> Result<Self, String> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {}", api_key)
                .parse()
                .map_err(|_| "Invalid API key for Authorization header".to_string())?,
        );

        let client = reqwest::Client::builder()
            .user_agent(concat!("memex-backend/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

        Ok(Self { client })
    }

    /// Launch an agent against the knowledge repository at the given ref
    pub async fn launch_agent(
        &self,
        prompt: &str,
        repository: &str,
        git_ref: &str,
    ) -> Result<AgentLaunch, String> {
        let resp = self
            .client
            .post(format!("{}/agents", API_BASE))
            .json(&json!({
                "prompt": { "text": prompt },
                "source": { "repository": repository, "ref": git_ref },
            }))
            .send()
            .await
            .map_err(|e| format!("Failed to launch agent: {}", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("Agent launch rejected: {} {}", status, body));
        }

        let body: AgentResponse = resp.json().await.map_err(|e| e.to_string())?;
        log::info!("[AGENT] Launched agent {}", body.id);
        Ok(AgentLaunch {
            agent_url: body
                .target
                .and_then(|t| t.url)
                .unwrap_or_else(|| format!("{}/agents/{}", API_BASE, body.id)),
            agent_id: body.id,
        })
    }

    /// Current state of a previously launched agent
    pub async fn get_status(&self, agent_id: &str) -> Result<AgentStatus, String> {
        let resp = self
            .client
            .get(format!("{}/agents/{}", API_BASE, agent_id))
            .send()
            .await
            .map_err(|e| format!("Failed to get agent status: {}", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("Agent status query failed: {} {}", status, body));
        }

        let body: AgentResponse = resp.json().await.map_err(|e| e.to_string())?;
        let (url, pr_url) = match body.target {
            Some(t) => (t.url, t.pr_url),
            None => (None, None),
        };
        Ok(AgentStatus {
            status: body.status.unwrap_or_else(|| "unknown".to_string()),
            agent_url: url.unwrap_or_else(|| format!("{}/agents/{}", API_BASE, body.id)),
            pr_url,
        })
    }
}
