/// Upper bound on the diff body forwarded to the language model, in characters.
pub const MAX_DIFF_CHARS: usize = 10_000;

/// Bounded summary of the changes on a branch, handed to the draft generator.
/// Lives only for the duration of a single request.
#[derive(Debug, Clone)]
pub struct ChangeContext {
    /// Commit whose parent is the diff base
    pub anchor: String,
    /// `git log --name-status` output, one line per commit plus touched files
    pub commit_summary: String,
    /// `git diff --stat` output
    pub changes_stat: String,
    /// Diff body, at most MAX_DIFF_CHARS characters
    pub diff: String,
    /// Whether `diff` was cut short
    pub diff_truncated: bool,
    /// Per-file counts parsed from the full, untruncated diff
    pub files: Vec<FileChange>,
}

impl ChangeContext {
    pub fn additions(&self) -> usize {
        self.files.iter().map(|f| f.additions).sum()
    }

    pub fn deletions(&self) -> usize {
        self.files.iter().map(|f| f.deletions).sum()
    }

    /// Text block embedded in the prompt.
    pub fn render(&self) -> String {
        format!(
            "\n=== COMMIT SUMMARY ===\n{}\n\n=== CHANGES STAT ===\n{}\n\n=== GIT DIFF (Detail) ===\n{}\n",
            self.commit_summary, self.changes_stat, self.diff
        )
    }
}

/// One file touched by the diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// File path (e.g., "src/auth/config.rs")
    pub path: String,
    pub is_new: bool,
    pub is_deleted: bool,
    pub additions: usize,
    pub deletions: usize,
}
