use crate::git::FileChange;
use crate::llm::Provider;
use crate::pr::PullRequestResult;

/// Summary of one CLI run, rendered to the terminal or a markdown file.
#[derive(Debug)]
pub struct DraftReport {
    /// Source branch
    pub branch: String,
    /// Target branch
    pub base_branch: String,
    pub provider: Provider,
    pub model: String,
    /// Generated PR title
    pub title: String,
    /// Generated PR body (markdown)
    pub body: String,
    /// Files touched between the anchor and HEAD
    pub files: Vec<FileChange>,
    /// Lines added
    pub additions: usize,
    /// Lines deleted
    pub deletions: usize,
    /// Whether the diff sent to the model was cut short
    pub diff_truncated: bool,
    /// Set once the PR has been opened; None on a dry run
    pub pull_request: Option<PullRequestResult>,
}
