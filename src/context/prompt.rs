//! Prompt construction for commit partitioning.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::collector::RepositoryState;
use crate::git::DiffScope;

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(\x07|\x1b\\)|\x1b[@-Z\\-_]")
        .expect("valid ANSI escape pattern")
});

/// System instruction sent with every run.
const SYSTEM_INSTRUCTIONS: &str = r#"You split pending git changes into small, coherent commits that follow the Conventional Commits format.

## Rules
- Group files by intent: one logical change per commit. Never put a file in more than one commit.
- Every changed file listed by the user must appear in exactly one commit.
- Order commits so that each one builds on the previous ones (foundations first).
- `type` is one of: feat, fix, docs, style, refactor, perf, test, build, ci, chore, revert.
- `scope` is the user-facing area affected (e.g. `auth`, `cli`), or null.
- `description` is imperative mood, lowercase, no trailing period, and does NOT repeat the `type(scope):` prefix.
- `breaking` is true only when a public API or CLI interface changes incompatibly.
- `body` explains WHY the change was made in plain sentences, or null for trivial changes.
- `footers` holds trailer lines such as `Refs: PROJ-12` or `BREAKING CHANGE: ...`, or null.
- `files` lists repository-relative paths exactly as given.

## Output Format
Respond with ONLY a JSON object (no markdown, no explanation) of this shape:
{"batches": [{"commits": [{"type": "feat", "scope": "auth", "description": "add login throttling", "breaking": false, "body": null, "footers": null, "files": ["src/auth/throttle.rs"]}]}]}
Emit batches in the order the commits should be applied."#;

/// Prompt for one model invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    /// System instruction followed by the user prompt, for providers that
    /// take a single text input.
    pub fn combined(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}

/// Build the prompt from the collected repository state.
///
/// `jira_ticket` is mentioned to the model so footers can reference it.
pub fn build_prompt(state: &RepositoryState, jira_ticket: Option<&str>) -> Prompt {
    let mut user = String::from("## Branch\n");
    user.push_str(state.branch.as_deref().unwrap_or("(detached HEAD)"));
    user.push('\n');
    if let Some(ticket) = jira_ticket {
        user.push_str(&format!("Jira ticket: {ticket}\n"));
    }

    let scope = match &state.scope {
        DiffScope::Staged => "staged changes only".to_string(),
        DiffScope::WorkingTree(paths) if paths.is_empty() => {
            "all working tree changes (including untracked files)".to_string()
        }
        DiffScope::WorkingTree(paths) => format!("working tree changes under: {}", paths.join(", ")),
    };
    user.push_str(&format!("\n## Scope\n{scope}\n"));

    user.push_str(&format!(
        "\n## Changed Files ({} insertions, {} deletions)\n",
        state.diff.insertions, state.diff.deletions
    ));
    for file in &state.diff.files {
        let path = sanitize_for_prompt(&file.path);
        let line = match (&file.old_path, file.binary) {
            (Some(old), _) => format!("- {path} ({}, from {})\n", file.status, sanitize_for_prompt(old)),
            (None, true) => format!("- {path} ({}, binary)\n", file.status),
            (None, false) => format!(
                "- {path} ({}, +{} -{})\n",
                file.status, file.insertions, file.deletions
            ),
        };
        user.push_str(&line);
    }

    if let Some(history) = state.history.as_ref().filter(|h| !h.is_empty()) {
        user.push_str("\n## Recent Commits (match their style)\n");
        for subject in history {
            user.push_str(&format!("- {}\n", sanitize_for_prompt(subject)));
        }
    }

    user.push_str("\n## Diff\n```diff\n");
    user.push_str(&sanitize_for_prompt(state.diff.diff_text.trim_end()));
    user.push_str("\n```");

    Prompt {
        system: SYSTEM_INSTRUCTIONS.to_string(),
        user,
    }
}

/// Strip ANSI escape sequences and control characters other than newline and
/// tab.
pub fn sanitize_for_prompt(text: &str) -> String {
    let without_ansi = ANSI_ESCAPE.replace_all(text, "");
    without_ansi
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{DiffSummary, FileChange, FileStatus, WorkingTreeStatus};

    fn make_state(history: Option<Vec<String>>) -> RepositoryState {
        RepositoryState {
            status: WorkingTreeStatus {
                unstaged: vec!["src/auth/login.rs".to_string()],
                untracked: vec!["src/auth/session.rs".to_string()],
                ..Default::default()
            },
            scope: DiffScope::WorkingTree(Vec::new()),
            diff: DiffSummary {
                files: vec![
                    FileChange {
                        path: "src/auth/login.rs".to_string(),
                        status: FileStatus::Modified,
                        old_path: None,
                        insertions: 3,
                        deletions: 1,
                        binary: false,
                    },
                    FileChange {
                        path: "assets/logo.png".to_string(),
                        status: FileStatus::Added,
                        old_path: None,
                        insertions: 0,
                        deletions: 0,
                        binary: true,
                    },
                ],
                diff_text: "+pub fn login() {}\n".to_string(),
                insertions: 3,
                deletions: 1,
            },
            branch: Some("feature/PROJ-7-login".to_string()),
            history,
        }
    }

    #[test]
    fn test_prompt_lists_files_and_diff() {
        let prompt = build_prompt(&make_state(None), None);
        assert!(prompt.user.contains("- src/auth/login.rs (Modified, +3 -1)"));
        assert!(prompt.user.contains("- assets/logo.png (Added, binary)"));
        assert!(prompt.user.contains("+pub fn login() {}"));
        assert!(prompt.user.contains("feature/PROJ-7-login"));
        assert!(!prompt.user.contains("Recent Commits"));
    }

    #[test]
    fn test_prompt_includes_history_and_ticket() {
        let state = make_state(Some(vec!["feat(auth): add sessions".to_string()]));
        let prompt = build_prompt(&state, Some("PROJ-7"));
        assert!(prompt.user.contains("## Recent Commits"));
        assert!(prompt.user.contains("- feat(auth): add sessions"));
        assert!(prompt.user.contains("Jira ticket: PROJ-7"));
    }

    #[test]
    fn test_prompt_sections_in_order() {
        let state = make_state(Some(vec!["fix: typo".to_string()]));
        let user = build_prompt(&state, Some("PROJ-7")).user;
        assert!(user.starts_with("## Branch\nfeature/PROJ-7-login\nJira ticket: PROJ-7\n"));

        let positions: Vec<usize> = ["## Scope", "## Changed Files", "## Recent Commits", "## Diff"]
            .iter()
            .map(|heading| user.find(heading).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(user.ends_with("+pub fn login() {}\n```"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let state = make_state(None);
        assert_eq!(build_prompt(&state, None), build_prompt(&state, None));
    }

    #[test]
    fn test_combined_contains_both_parts() {
        let prompt = build_prompt(&make_state(None), None);
        let combined = prompt.combined();
        assert!(combined.starts_with(&prompt.system));
        assert!(combined.ends_with(&prompt.user));
    }

    #[test]
    fn test_sanitize_strips_ansi_and_control_chars() {
        let input = "\x1b[31mred\x1b[0m\tok\r\nnext\x07line\x00";
        assert_eq!(sanitize_for_prompt(input), "red\tok\nnextline");
    }

    #[test]
    fn test_sanitize_keeps_unicode() {
        assert_eq!(sanitize_for_prompt("naïve → café"), "naïve → café");
    }
}
