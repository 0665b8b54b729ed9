use serde::{Deserialize, Serialize};

/// Body of the GitHub create-pull-request call.
#[derive(Debug, Clone, Serialize)]
pub struct NewPullRequest {
    pub title: String,
    pub body: String,
    /// Source branch
    pub head: String,
    /// Branch the PR merges into
    pub base: String,
}

/// The part of GitHub's pull request response we hand back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequestResult {
    /// Web URL of the PR (e.g., https://github.com/org/repo/pull/42)
    pub html_url: String,
    pub number: u64,
}
