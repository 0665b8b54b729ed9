pub mod types;

pub use types::{NewPullRequest, PullRequestResult};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("GitHub Error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected GitHub response: {body}")]
    InvalidResponse { body: String },
}

/// A hosting service that can open pull requests.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn create_pull_request(
        &self,
        pr: &NewPullRequest,
    ) -> Result<PullRequestResult, PublishError>;
}

/// Creates pull requests through the GitHub REST API.
pub struct GitHubPublisher {
    client: Client,
    api_url: String,
    owner: String,
    repo: String,
    token: String,
}

impl GitHubPublisher {
    pub fn new(client: Client, api_url: String, owner: String, repo: String, token: String) -> Self {
        Self {
            client,
            api_url,
            owner,
            repo,
            token,
        }
    }
}

#[async_trait]
impl Publisher for GitHubPublisher {
    /// POST /repos/{owner}/{repo}/pulls. Anything but 201 Created is an error
    /// carrying GitHub's response body.
    #[instrument(skip(self, pr), fields(owner = %self.owner, repo = %self.repo, head = %pr.head, base = %pr.base))]
    async fn create_pull_request(
        &self,
        pr: &NewPullRequest,
    ) -> Result<PullRequestResult, PublishError> {
        let url = format!(
            "{}/repos/{}/{}/pulls",
            self.api_url.trim_end_matches('/'),
            self.owner,
            self.repo
        );

        debug!("creating pull request on GitHub");
        let response = self
            .client
            .post(&url)
            .header("User-Agent", "pr-drafter")
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .json(pr)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::CREATED {
            return Err(PublishError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let created: PullRequestResult = serde_json::from_str(&body)
            .map_err(|_| PublishError::InvalidResponse { body: body.clone() })?;
        debug!(number = created.number, url = %created.html_url, "pull request created");
        Ok(created)
    }
}
