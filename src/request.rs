use serde::Deserialize;
use std::fmt;
use thiserror::Error;

use crate::config::{
    Config, DEFAULT_BASE_BRANCH, DEFAULT_LLM_MODEL, DEFAULT_N_COMMITS, DEFAULT_PR_TEMPLATE,
};
use crate::llm::Provider;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Unsupported LLM provider: {0:?}")]
    UnsupportedProvider(String),
}

/// Per-call parameters as they arrive on the wire. Anything left out falls
/// back to the process configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DraftRequest {
    pub owner: Option<String>,
    pub repository: Option<String>,
    pub token: Option<String>,
    pub branch: Option<String>,
    pub base_branch: Option<String>,
    pub n_commits: Option<u32>,
    pub pr_template: Option<String>,
    pub llm_provider: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_model: Option<String>,
}

/// Fully resolved parameters for one pipeline run.
#[derive(Clone)]
pub struct RequestConfig {
    pub owner: String,
    pub repository: String,
    pub token: String,
    pub branch: String,
    pub base_branch: String,
    pub n_commits: u32,
    pub pr_template: String,
    pub llm_provider: Provider,
    pub llm_api_key: String,
    pub llm_model: String,
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("owner", &self.owner)
            .field("repository", &self.repository)
            .field("token", &"<redacted>")
            .field("branch", &self.branch)
            .field("base_branch", &self.base_branch)
            .field("n_commits", &self.n_commits)
            .field("llm_provider", &self.llm_provider)
            .field("llm_api_key", &"<redacted>")
            .field("llm_model", &self.llm_model)
            .finish_non_exhaustive()
    }
}

impl DraftRequest {
    /// Merge with `defaults`: request value, then configured value, then the
    /// built-in default. Fields with none of the three are an error.
    pub fn resolve(self, defaults: &Config) -> Result<RequestConfig, RequestError> {
        let provider_name = required(
            self.llm_provider,
            &defaults.llm.provider,
            "llm_provider",
        )?;
        let llm_provider = provider_name
            .parse::<Provider>()
            .map_err(RequestError::UnsupportedProvider)?;

        Ok(RequestConfig {
            owner: required(self.owner, &defaults.github.owner, "owner")?,
            repository: required(self.repository, &defaults.github.repository, "repository")?,
            token: required(self.token, &defaults.github.token, "token")?,
            branch: required(self.branch, &defaults.github.branch, "branch")?,
            base_branch: self
                .base_branch
                .or_else(|| defaults.github.base_branch.clone())
                .unwrap_or_else(|| DEFAULT_BASE_BRANCH.to_string()),
            n_commits: self
                .n_commits
                .or(defaults.git.n_commits)
                .unwrap_or(DEFAULT_N_COMMITS),
            pr_template: self
                .pr_template
                .or_else(|| defaults.pr.template.clone())
                .unwrap_or_else(|| DEFAULT_PR_TEMPLATE.to_string()),
            llm_provider,
            llm_api_key: required(self.llm_api_key, &defaults.llm.api_key, "llm_api_key")?,
            llm_model: self
                .llm_model
                .or_else(|| defaults.llm.model.clone())
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
        })
    }
}

fn required(
    value: Option<String>,
    fallback: &Option<String>,
    field: &'static str,
) -> Result<String, RequestError> {
    value
        .or_else(|| fallback.clone())
        .ok_or(RequestError::MissingField(field))
}
