pub mod diff;
pub mod types;

pub use types::{ChangeContext, FileChange, MAX_DIFF_CHARS};

use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Debug, Error)]
pub enum GitError {
    #[error("Failed to run git {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Git command failed: git {command}: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("No changes found between {base} and {branch}, or the commit range is invalid")]
    EmptyRange { base: String, branch: String },

    #[error("Failed to parse diff: {0}")]
    DiffParse(String),
}

/// Runs a single git invocation and returns its stdout.
///
/// Implementations must fail on a non-zero exit status.
pub trait GitRunner: Send + Sync {
    fn run(&self, args: &[&str]) -> Result<String, GitError>;
}

/// Shells out to the system `git` binary inside a working tree, inheriting
/// the user's git config, SSH agent and credential store.
#[derive(Debug, Clone)]
pub struct SystemGit {
    repo_dir: PathBuf,
}

impl SystemGit {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }
}

impl GitRunner for SystemGit {
    fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let command = args.join(" ");
        debug!(%command, "running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .output()
            .map_err(|source| GitError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::CommandFailed {
                command,
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Build the change context for `branch` relative to `base`.
///
/// Refreshes remotes, checks out the branch (without any `origin/` prefix),
/// picks the anchor commit from the last `n_commits` commits ahead of
/// `base`, and diffs `anchor^..HEAD`. Mutates the working tree.
#[instrument(skip(git))]
pub fn collect(
    git: &dyn GitRunner,
    n_commits: u32,
    base: &str,
    branch: &str,
) -> Result<ChangeContext, GitError> {
    git.run(&["fetch", "origin"])?;
    git.run(&["checkout", local_branch_name(branch)])?;

    let range = format!("{base}..HEAD");
    let rev_list = git.run(&["rev-list", "--reverse", &range])?;
    let anchor = select_anchor(&rev_list, n_commits as usize)
        .ok_or_else(|| GitError::EmptyRange {
            base: base.to_string(),
            branch: branch.to_string(),
        })?
        .to_string();
    debug!(%anchor, "selected anchor commit");

    let diff_range = format!("{anchor}^..HEAD");
    let n_arg = n_commits.to_string();
    let full_diff = git.run(&["diff", &diff_range])?;
    let commit_summary = git.run(&[
        "log",
        &range,
        "-n",
        &n_arg,
        "--pretty=format:%h %s",
        "--name-status",
    ])?;
    let changes_stat = git.run(&["diff", "--stat", &diff_range])?;

    let files = diff::summarize_diff(&full_diff).unwrap_or_else(|err| {
        warn!(error = %err, "could not summarize diff, continuing without file counts");
        Vec::new()
    });

    let (diff, diff_truncated) = truncate_chars(&full_diff, MAX_DIFF_CHARS);
    if diff_truncated {
        debug!(full_len = full_diff.len(), "diff truncated");
    }

    Ok(ChangeContext {
        anchor,
        commit_summary,
        changes_stat,
        diff: diff.to_string(),
        diff_truncated,
        files,
    })
}

/// Strip a leading `origin/` so the checkout targets the local branch.
pub fn local_branch_name(branch: &str) -> &str {
    branch.strip_prefix("origin/").unwrap_or(branch)
}

/// Pick the anchor from oldest-first `rev-list` output: the oldest of the
/// last `n` commits, or the oldest commit overall when fewer exist.
pub fn select_anchor(rev_list: &str, n: usize) -> Option<&str> {
    let commits: Vec<&str> = rev_list
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if n == 0 || commits.is_empty() {
        return None;
    }
    Some(commits[commits.len().saturating_sub(n)])
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;

    /// In-memory git that answers by command prefix and records every call.
    ///
    /// Rules are matched in insertion order, so register `diff --stat`
    /// before `diff`. Unmatched commands succeed with empty output.
    #[derive(Default)]
    pub struct ScriptedGit {
        rules: Vec<(String, Result<String, String>)>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedGit {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(mut self, prefix: &str, stdout: &str) -> Self {
            self.rules.push((prefix.to_string(), Ok(stdout.to_string())));
            self
        }

        pub fn fail(mut self, prefix: &str, stderr: &str) -> Self {
            self.rules.push((prefix.to_string(), Err(stderr.to_string())));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        /// A branch `commits` commits ahead of its base, named c01, c02, ...
        pub fn with_commits(commits: usize) -> Self {
            let rev_list: String = (1..=commits).map(|i| format!("c{i:02}\n")).collect();
            Self::new()
                .respond("rev-list", &rev_list)
                .respond("diff --stat", " src/lib.rs | 2 +-\n 1 file changed")
                .respond(
                    "diff",
                    "diff --git a/src/lib.rs b/src/lib.rs\n--- a/src/lib.rs\n+++ b/src/lib.rs\n@@ -1 +1 @@\n-old\n+new\n",
                )
                .respond("log", "c20 Latest change\nM\tsrc/lib.rs")
        }
    }

    impl GitRunner for ScriptedGit {
        fn run(&self, args: &[&str]) -> Result<String, GitError> {
            let command = args.join(" ");
            self.calls.lock().unwrap().push(command.clone());
            match self.rules.iter().find(|(prefix, _)| command.starts_with(prefix.as_str())) {
                Some((_, Ok(stdout))) => Ok(stdout.clone()),
                Some((_, Err(stderr))) => Err(GitError::CommandFailed {
                    command,
                    stderr: stderr.clone(),
                }),
                None => Ok(String::new()),
            }
        }
    }

    #[test]
    fn test_select_anchor_window() {
        let rev_list: String = (1..=20).map(|i| format!("c{i:02}\n")).collect();
        assert_eq!(select_anchor(&rev_list, 14), Some("c07"));
        assert_eq!(select_anchor(&rev_list, 1), Some("c20"));
        assert_eq!(select_anchor(&rev_list, 50), Some("c01"));
    }

    #[test]
    fn test_select_anchor_empty() {
        assert_eq!(select_anchor("", 14), None);
        assert_eq!(select_anchor("\n  \n", 3), None);
        assert_eq!(select_anchor("c01\n", 0), None);
    }

    #[test]
    fn test_local_branch_name() {
        assert_eq!(local_branch_name("origin/feature/x"), "feature/x");
        assert_eq!(local_branch_name("feature/x"), "feature/x");
        assert_eq!(local_branch_name("upstream/origin/x"), "upstream/origin/x");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        let text = "변경사항".repeat(5);
        let (cut, truncated) = truncate_chars(&text, 6);
        assert!(truncated);
        assert_eq!(cut.chars().count(), 6);

        let (whole, truncated) = truncate_chars("short", 10);
        assert!(!truncated);
        assert_eq!(whole, "short");
    }

    #[test]
    fn test_collect_command_sequence() {
        let git = ScriptedGit::with_commits(20);
        let context = collect(&git, 14, "dev", "origin/feature/x").unwrap();

        assert_eq!(context.anchor, "c07");
        assert_eq!(
            git.calls(),
            vec![
                "fetch origin",
                "checkout feature/x",
                "rev-list --reverse dev..HEAD",
                "diff c07^..HEAD",
                "log dev..HEAD -n 14 --pretty=format:%h %s --name-status",
                "diff --stat c07^..HEAD",
            ]
        );
        assert_eq!(context.files.len(), 1);
        assert_eq!(context.additions(), 1);
        assert!(context.commit_summary.contains("Latest change"));
    }

    #[test]
    fn test_collect_truncates_large_diff() {
        let huge = format!(
            "diff --git a/big.txt b/big.txt\n@@ -0,0 +1 @@\n+{}\n",
            "x".repeat(MAX_DIFF_CHARS * 2)
        );
        let git = ScriptedGit::new()
            .respond("rev-list", "c01\n")
            .respond("diff --stat", " big.txt | 1 +")
            .respond("diff", &huge);

        let context = collect(&git, 14, "dev", "feature/x").unwrap();
        assert!(context.diff.chars().count() <= MAX_DIFF_CHARS);
        assert!(context.diff_truncated);
        assert_eq!(context.files[0].additions, 1);
    }

    #[test]
    fn test_collect_empty_range() {
        let git = ScriptedGit::new().respond("rev-list", "");
        let err = collect(&git, 14, "dev", "feature/x").unwrap_err();
        assert!(matches!(err, GitError::EmptyRange { .. }));
        assert!(!git.calls().iter().any(|c| c.starts_with("diff")));
    }

    #[test]
    fn test_collect_stops_on_failed_command() {
        let git = ScriptedGit::new().fail("checkout", "pathspec 'nope' did not match");
        let err = collect(&git, 14, "dev", "nope").unwrap_err();
        assert!(err.to_string().contains("did not match"));
        assert_eq!(git.calls().len(), 2);
    }

    #[test]
    fn test_system_git_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let git = SystemGit::new(dir.path());
        assert!(git.run(&["--version"]).is_ok());
        assert!(matches!(
            git.run(&["not-a-real-command"]),
            Err(GitError::CommandFailed { .. })
        ));
    }

    fn sh_git(dir: &Path, args: &[&str]) -> String {
        let output = Command::new("git")
            .args([
                "-c",
                "user.name=Test",
                "-c",
                "user.email=test@example.com",
                "-c",
                "commit.gpgsign=false",
            ])
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    fn commit_file(dir: &Path, name: &str, message: &str) {
        std::fs::write(dir.join(name), format!("{message}\n")).unwrap();
        sh_git(dir, &["add", name]);
        sh_git(dir, &["commit", "-m", message]);
    }

    /// Work tree with a local bare `origin`, a `dev` base branch and a
    /// `feature/x` branch three commits ahead. Leaves `dev` checked out.
    fn repo_with_feature_branch() -> (tempfile::TempDir, PathBuf) {
        let root = tempfile::tempdir().unwrap();
        sh_git(root.path(), &["init", "--bare", "origin.git"]);
        sh_git(root.path(), &["init", "work"]);
        let work = root.path().join("work");
        let origin = root.path().join("origin.git");

        sh_git(&work, &["checkout", "-b", "dev"]);
        commit_file(&work, "base.txt", "base");
        sh_git(&work, &["remote", "add", "origin", origin.to_str().unwrap()]);
        sh_git(&work, &["checkout", "-b", "feature/x"]);
        commit_file(&work, "f1.txt", "feature 1");
        commit_file(&work, "f2.txt", "feature 2");
        commit_file(&work, "f3.txt", "feature 3");
        sh_git(&work, &["push", "origin", "dev", "feature/x"]);
        sh_git(&work, &["checkout", "dev"]);
        (root, work)
    }

    #[test]
    fn test_collect_against_real_repository() {
        let (_root, work) = repo_with_feature_branch();
        let git = SystemGit::new(&work);

        let context = collect(&git, 2, "dev", "origin/feature/x").unwrap();

        let head = sh_git(&work, &["rev-parse", "--abbrev-ref", "HEAD"]);
        assert_eq!(head.trim(), "feature/x");
        let paths: Vec<&str> = context.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["f2.txt", "f3.txt"]);
        assert!(context.files.iter().all(|f| f.is_new));
        assert!(context.commit_summary.contains("feature 3"));
        assert!(context.commit_summary.contains("feature 2"));
        assert!(!context.commit_summary.contains("feature 1"));
        assert!(context.changes_stat.contains("2 files changed"));
        assert!(!context.diff_truncated);
    }

    #[test]
    fn test_collect_real_repository_without_changes() {
        let (_root, work) = repo_with_feature_branch();
        let git = SystemGit::new(&work);
        let err = collect(&git, 14, "dev", "dev").unwrap_err();
        assert!(matches!(err, GitError::EmptyRange { .. }));
    }
}
