use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_FILE: &str = ".pr-drafter.toml";

pub const DEFAULT_BASE_BRANCH: &str = "dev";
pub const DEFAULT_N_COMMITS: u32 = 14;
pub const DEFAULT_LLM_MODEL: &str = "gemini-2.0-flash-lite";
pub const DEFAULT_PR_TEMPLATE: &str = "## Changes\n- \n\n## Review Points\n- ";

const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Invalid listen address: {0}")]
    InvalidAddr(String),
}

/// Process-wide defaults loaded from .pr-drafter.toml and the environment.
///
/// Every field is optional. A request field left empty by the caller falls
/// back to the value here, then to the built-in defaults above.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub pr: PrConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    pub owner: Option<String>,
    pub repository: Option<String>,
    /// Falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,
    /// Source branch the pull request is opened from
    pub branch: Option<String>,
    pub base_branch: Option<String>,
    /// REST API root, override for GitHub Enterprise
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitConfig {
    pub n_commits: Option<u32>,
    /// Working tree the collector runs in (defaults to the current directory)
    pub repo_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrConfig {
    pub template: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmConfig {
    /// "gemini" or "gpt"; validated per request
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub openai_url: Option<String>,
    pub gemini_url: Option<String>,
}

/// Outbound HTTP client settings, shared by the LLM and GitHub calls.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl Config {
    /// Load configuration from .pr-drafter.toml in the current directory,
    /// then fill whatever the file left unset from the environment.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load from a specific path without consulting the environment.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Fill unset fields from `lookup`. Values already present (from the
    /// config file) win; empty variables count as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        fill(&mut self.github.owner, lookup("GITHUB_OWNER"));
        fill(&mut self.github.repository, lookup("GITHUB_REPOSITORY"));
        fill(&mut self.github.token, lookup("GITHUB_TOKEN"));
        fill(&mut self.github.branch, lookup("GITHUB_BRANCH"));
        fill(&mut self.github.base_branch, lookup("GITHUB_BASE_BRANCH"));
        fill(&mut self.pr.template, lookup("PR_TEMPLATE"));
        fill(&mut self.llm.provider, lookup("LLM_PROVIDER"));
        fill(&mut self.llm.api_key, lookup("LLM_API_KEY"));
        fill(&mut self.llm.model, lookup("LLM_MODEL"));

        if self.git.n_commits.is_none() {
            if let Some(raw) = lookup("GIT_N_COMMITS") {
                let parsed = raw.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnv {
                    key: "GIT_N_COMMITS",
                    value: raw.clone(),
                })?;
                self.git.n_commits = Some(parsed);
            }
        }

        Ok(())
    }

    pub fn github_api_url(&self) -> String {
        self.github
            .api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string())
    }

    pub fn openai_url(&self) -> String {
        self.llm
            .openai_url
            .clone()
            .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string())
    }

    pub fn gemini_url(&self) -> String {
        self.llm
            .gemini_url
            .clone()
            .unwrap_or_else(|| DEFAULT_GEMINI_URL.to_string())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn repo_path(&self) -> PathBuf {
        self.git
            .repo_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let host = self.server.host.as_deref().unwrap_or(DEFAULT_HOST);
        let port = self.server.port.unwrap_or(DEFAULT_PORT);
        let raw = format!("{host}:{port}");
        raw.parse().map_err(|_| ConfigError::InvalidAddr(raw))
    }
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value;
    }
}
