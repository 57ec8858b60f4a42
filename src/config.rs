use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

const CONFIG_FILE: &str = ".sui-digest.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .sui-digest.toml.
/// Every section is optional; the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub paging: PagingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN then GITHUB_PAT.
    pub token: Option<String>,
    pub api_base: String,
    /// Repository holding the proposals
    pub owner: String,
    pub repo: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: "https://api.github.com".to_string(),
            owner: "sui-foundation".to_string(),
            repo: "sips".to_string(),
            user_agent: "sui-digest".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Time-to-live per endpoint class, in seconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub proposals_ttl_secs: u64,
    pub content_ttl_secs: u64,
    pub comments_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            proposals_ttl_secs: 60 * 60,
            content_ttl_secs: 24 * 60 * 60,
            comments_ttl_secs: 30 * 60,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JitterMode {
    #[default]
    None,
    Full,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub jitter: JitterMode,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            jitter: JitterMode::None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    pub per_page: usize,
    /// Pause between successful page fetches
    pub page_delay_ms: u64,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            per_page: 30,
            page_delay_ms: 1000,
        }
    }
}

impl PagingConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

impl Config {
    /// Load configuration from .sui-digest.toml in the current directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };

        if config.github.token.is_none() {
            config.github.token = token_from_env();
        }

        Ok(config)
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the GitHub token: config file value takes precedence,
    /// then GITHUB_TOKEN, then GITHUB_PAT.
    pub fn github_token(&self) -> Option<String> {
        self.github.token.clone().or_else(token_from_env)
    }
}

fn token_from_env() -> Option<String> {
    std::env::var("GITHUB_TOKEN")
        .or_else(|_| std::env::var("GITHUB_PAT"))
        .ok()
        .filter(|token| !token.trim().is_empty())
}
