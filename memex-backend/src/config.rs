use std::env;
use std::path::PathBuf;

/// Environment variable names - single source of truth
pub mod env_vars {
    /// Fine-grained GitHub token used for asset uploads and branch creation.
    pub const GIT_TOKEN: &str = "MEMEX_GIT_TOKEN";
    /// API key for the cloud agent service that decomposes summaries into entries.
    pub const CURSOR_API_KEY: &str = "CURSOR_API_KEY";
    /// Local checkout of the knowledge repository. Defaults to the current directory.
    pub const KNOWLEDGE_ROOT: &str = "MEMEX_KNOWLEDGE_ROOT";
    pub const GITHUB_OWNER: &str = "MEMEX_GITHUB_OWNER";
    pub const GITHUB_REPO: &str = "MEMEX_GITHUB_REPO";
    pub const DEFAULT_BRANCH: &str = "MEMEX_DEFAULT_BRANCH";
    /// Set to "false" or "0" to skip the pull-before-read freshness check.
    /// Default: true (auto-pull enabled).
    pub const AUTO_PULL: &str = "MEMEX_AUTO_PULL";
    pub const PORT: &str = "PORT";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const KNOWLEDGE_DIR: &str = "knowledge";
    pub const ASSETS_DIR: &str = "knowledge/assets";
    pub const VIEWER_DIR: &str = "viewer";
    pub const DEFAULT_BRANCH: &str = "main";
    pub const SEARCH_LIMIT: usize = 20;
    pub const REFRESH_TIMEOUT_SECS: u64 = 30;
    pub const REFRESH_DEBOUNCE_SECS: u64 = 60;
}

/// Get the GitHub token from environment (for uploads and branch ops)
pub fn git_token() -> Option<String> {
    env::var(env_vars::GIT_TOKEN).ok()
}

/// Get the cloud agent API key from environment
pub fn cursor_api_key() -> Option<String> {
    env::var(env_vars::CURSOR_API_KEY).ok()
}

#[derive(Clone, Debug)]
pub struct Config {
    pub knowledge_root: PathBuf,
    pub github_owner: Option<String>,
    pub github_repo: Option<String>,
    pub default_branch: String,
    pub auto_pull: bool,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        let knowledge_root = env::var(env_vars::KNOWLEDGE_ROOT)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        let auto_pull = match env::var(env_vars::AUTO_PULL) {
            Ok(v) => !matches!(v.trim(), "false" | "0" | "no"),
            Err(_) => true,
        };

        Self {
            knowledge_root,
            github_owner: env::var(env_vars::GITHUB_OWNER).ok(),
            github_repo: env::var(env_vars::GITHUB_REPO).ok(),
            default_branch: env::var(env_vars::DEFAULT_BRANCH)
                .unwrap_or_else(|_| defaults::DEFAULT_BRANCH.to_string()),
            auto_pull,
            port: env::var(env_vars::PORT)
                .unwrap_or_else(|_| defaults::PORT.to_string())
                .parse()
                .expect("PORT must be a valid number"),
        }
    }

    /// Repository URL for launching cloud agents, if the repo is configured
    pub fn repo_url(&self) -> Option<String> {
        match (&self.github_owner, &self.github_repo) {
            (Some(owner), Some(repo)) => Some(format!("https://github.com/{}/{}", owner, repo)),
            _ => None,
        }
    }

    /// Get the knowledge directory inside the local checkout
    pub fn knowledge_dir(&self) -> PathBuf {
        self.knowledge_root.join(defaults::KNOWLEDGE_DIR)
    }

    /// Get the viewer output directory inside the local checkout
    pub fn viewer_dir(&self) -> PathBuf {
        self.knowledge_root.join(defaults::VIEWER_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_url() {
        let mut config = Config {
            knowledge_root: PathBuf::from("."),
            github_owner: Some("acme".to_string()),
            github_repo: Some("memex-kb".to_string()),
            default_branch: "main".to_string(),
            auto_pull: true,
            port: 8080,
        };
        assert_eq!(
            config.repo_url().as_deref(),
            Some("https://github.com/acme/memex-kb")
        );

        config.github_repo = None;
        assert!(config.repo_url().is_none());
    }
}
