use super::types::Prompt;

pub const SYSTEM_PROMPT: &str = "You are an expert software developer and technical writer. Your task is to refine a Pull Request (PR) template and then draft a PR description using that refined template, referencing provided file changes.";

/// Build the prompt. `template` and `changes` are embedded verbatim.
pub fn build(template: &str, changes: &str) -> Prompt {
    let user = format!(
        "\nPlease write a Pull Request body.\n\n[PR Template]\n{template}\n\n[Code Changes & Logs]\n{changes}\n\nFill out the template based on the changes. Keep the tone professional.\n"
    );
    Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_inputs_verbatim() {
        let template = "## Changes\n- {{ fill me }}\n\n## Review Points\n- ";
        let changes = "=== COMMIT SUMMARY ===\nabc123 Fix {bug}\n\\n literal";
        let prompt = build(template, changes);

        assert!(prompt.user.contains(template));
        assert!(prompt.user.contains(changes));
        assert_eq!(prompt.system, SYSTEM_PROMPT);
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let a = build("tpl", "ctx");
        let b = build("tpl", "ctx");
        assert_eq!(a.user, b.user);
        assert!(a.user.find("[PR Template]").unwrap() < a.user.find("[Code Changes & Logs]").unwrap());
    }
}
