use super::types::FileChange;
use super::GitError;

/// Summarize a unified diff (as printed by `git diff`) into per-file counts.
///
/// Each file section starts with `diff --git a/{path} b/{path}`. New files
/// have `--- /dev/null`, deleted files `+++ /dev/null`. Only lines inside a
/// hunk (after an `@@` header) are counted, so a removed line that itself
/// begins with `--` is not mistaken for a file header.
pub fn summarize_diff(raw_diff: &str) -> Result<Vec<FileChange>, GitError> {
    if raw_diff.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let mut current: Option<FileChange> = None;
    let mut in_hunk = false;

    for line in raw_diff.lines() {
        if let Some(rest) = line.strip_prefix("diff --git ") {
            if let Some(file) = current.take() {
                files.push(file);
            }
            current = Some(FileChange {
                path: parse_header_path(rest)?,
                is_new: false,
                is_deleted: false,
                additions: 0,
                deletions: 0,
            });
            in_hunk = false;
            continue;
        }

        let Some(file) = current.as_mut() else {
            continue;
        };

        if line.starts_with("@@") {
            in_hunk = true;
            continue;
        }

        if !in_hunk {
            if let Some(path) = line.strip_prefix("--- ") {
                file.is_new |= path.trim() == "/dev/null";
            } else if let Some(path) = line.strip_prefix("+++ ") {
                let path = path.trim_end_matches(['\t', '\r']);
                if path == "/dev/null" {
                    file.is_deleted = true;
                } else if let Some(new_path) = path.strip_prefix("b/") {
                    file.path = new_path.to_string();
                }
            }
            continue;
        }

        if line.starts_with('+') {
            file.additions += 1;
        } else if line.starts_with('-') {
            file.deletions += 1;
        }
    }

    if let Some(file) = current.take() {
        files.push(file);
    }
    Ok(files)
}

/// Path from `a/{path} b/{path}`. Paths may contain spaces, so split on
/// the ` b/` marker first; the `+++ b/` line refines it later when present.
fn parse_header_path(rest: &str) -> Result<String, GitError> {
    if let Some((_, b_path)) = rest.split_once(" b/") {
        return Ok(b_path.to_string());
    }

    let mut parts = rest.split_whitespace();
    let a_path = parts
        .next()
        .ok_or_else(|| GitError::DiffParse("Missing a/ path in diff header".to_string()))?;
    let b_path = parts
        .next()
        .ok_or_else(|| GitError::DiffParse("Missing b/ path in diff header".to_string()))?;
    Ok(b_path
        .strip_prefix("b/")
        .or_else(|| a_path.strip_prefix("a/"))
        .unwrap_or(b_path)
        .to_string())
}
