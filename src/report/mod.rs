pub mod types;

pub use types::DraftReport;

use crate::git::ChangeContext;
use crate::llm::Draft;
use crate::pr::PullRequestResult;
use crate::request::RequestConfig;
use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Merge the pipeline outputs into a DraftReport.
pub fn build(
    request: &RequestConfig,
    context: ChangeContext,
    draft: Draft,
    pull_request: Option<PullRequestResult>,
) -> DraftReport {
    DraftReport {
        branch: request.branch.clone(),
        base_branch: request.base_branch.clone(),
        provider: request.llm_provider,
        model: request.llm_model.clone(),
        title: draft.title,
        body: draft.body,
        additions: context.additions(),
        deletions: context.deletions(),
        diff_truncated: context.diff_truncated,
        files: context.files,
        pull_request,
    }
}

/// Print the report to the terminal (default) or write markdown to `output_path`.
#[instrument(skip(report), fields(branch = %report.branch, published = report.pull_request.is_some()))]
pub fn output(report: &DraftReport, output_path: Option<&Path>) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing report to terminal");
            print_terminal_report(report);
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing report to file");
            std::fs::write(path, render_markdown(report))?;
            Ok(())
        }
    }
}

/// PR: "Automated PR by Gemini"
/// feature/x → dev | gemini (gemini-2.0-flash-lite) | Files changed: 3 | +40 -2
///
/// ═══ Body ═══
/// ...
///
/// ═══ Created: https://github.com/org/repo/pull/42 ═══
fn print_terminal_report(report: &DraftReport) {
    println!();
    println!("PR: \"{}\"", report.title.bold());
    println!(
        "{} → {} | {} ({}) | Files changed: {} | {} {}",
        report.branch.cyan(),
        report.base_branch.cyan(),
        report.provider,
        report.model,
        report.files.len(),
        format!("+{}", report.additions).green(),
        format!("-{}", report.deletions).red()
    );
    if report.diff_truncated {
        println!("{}", "Diff was truncated before generation.".yellow());
    }
    println!();

    println!("═══ Body ═══");
    println!("{}", report.body);
    println!();

    match &report.pull_request {
        Some(pr) => println!("═══ Created #{}: {} ═══", pr.number, pr.html_url.green().bold()),
        None => println!("═══ {} ═══", "Dry run: no pull request created".yellow().bold()),
    }
    println!();
}

fn render_markdown(report: &DraftReport) -> String {
    let mut md = String::new();
    md.push_str(&format!("# {}\n\n", report.title));
    md.push_str(&format!(
        "**Branch:** `{}` → `{}` | **Model:** {} ({}) | **Files changed:** {} | **+{} -{}**\n\n",
        report.branch,
        report.base_branch,
        report.provider,
        report.model,
        report.files.len(),
        report.additions,
        report.deletions
    ));
    if let Some(pr) = &report.pull_request {
        md.push_str(&format!("**Pull request:** [#{}]({})\n\n", pr.number, pr.html_url));
    }

    md.push_str(&report.body);
    md.push_str("\n\n");

    if !report.files.is_empty() {
        md.push_str("## Files\n\n");
        for file in &report.files {
            let marker = if file.is_new {
                " (new)"
            } else if file.is_deleted {
                " (deleted)"
            } else {
                ""
            };
            md.push_str(&format!(
                "- `{}`{} +{} -{}\n",
                file.path, marker, file.additions, file.deletions
            ));
        }
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::FileChange;
    use crate::llm::Provider;

    fn sample_request() -> RequestConfig {
        RequestConfig {
            owner: "org".to_string(),
            repository: "repo".to_string(),
            token: "ghp_test".to_string(),
            branch: "feature/login".to_string(),
            base_branch: "dev".to_string(),
            n_commits: 14,
            pr_template: "## Changes".to_string(),
            llm_provider: Provider::Gemini,
            llm_api_key: "key".to_string(),
            llm_model: "gemini-2.0-flash-lite".to_string(),
        }
    }

    fn sample_context() -> ChangeContext {
        ChangeContext {
            anchor: "abc1234".to_string(),
            commit_summary: String::new(),
            changes_stat: String::new(),
            diff: String::new(),
            diff_truncated: true,
            files: vec![
                FileChange {
                    path: "src/login.rs".to_string(),
                    is_new: true,
                    is_deleted: false,
                    additions: 30,
                    deletions: 0,
                },
                FileChange {
                    path: "src/lib.rs".to_string(),
                    is_new: false,
                    is_deleted: false,
                    additions: 2,
                    deletions: 1,
                },
            ],
        }
    }

    fn sample_draft() -> Draft {
        Draft {
            title: "Automated PR by Gemini".to_string(),
            body: "## Changes\n- Add OAuth2 login flow".to_string(),
        }
    }

    #[test]
    fn test_build_report_totals() {
        let report = build(&sample_request(), sample_context(), sample_draft(), None);
        assert_eq!(report.additions, 32);
        assert_eq!(report.deletions, 1);
        assert_eq!(report.files.len(), 2);
        assert!(report.diff_truncated);
        assert_eq!(report.base_branch, "dev");
    }

    #[test]
    fn test_markdown_report() {
        let pr = PullRequestResult {
            html_url: "https://github.com/org/repo/pull/42".to_string(),
            number: 42,
        };
        let report = build(&sample_request(), sample_context(), sample_draft(), Some(pr));
        let md = render_markdown(&report);

        assert!(md.starts_with("# Automated PR by Gemini"));
        assert!(md.contains("`feature/login` → `dev`"));
        assert!(md.contains("[#42](https://github.com/org/repo/pull/42)"));
        assert!(md.contains("- Add OAuth2 login flow"));
        assert!(md.contains("- `src/login.rs` (new) +30 -0"));
    }

    #[test]
    fn test_output_to_file() {
        let report = build(&sample_request(), sample_context(), sample_draft(), None);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.md");
        output(&report, Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("## Files"));
        assert!(!content.contains("**Pull request:**"));
    }

    #[test]
    fn test_output_to_terminal() {
        let report = build(&sample_request(), sample_context(), sample_draft(), None);
        // Should not panic
        output(&report, None).unwrap();
    }
}
