//! Terminal rendering of proposals and applied commits.

use crate::commit::message::{WRAP_WIDTH, format_subject, wrap_body};
use crate::git::CommitSummary;
use crate::llm::CommitProposal;

/// Render a proposal for review: subject, body, footers, then files.
pub fn render_proposal(proposal: &CommitProposal, jira_ticket: Option<&str>) -> String {
    let mut out = format!("\n  {}\n", format_subject(proposal, jira_ticket));

    if let Some(body) = proposal.body.as_deref().filter(|b| !b.trim().is_empty()) {
        out.push('\n');
        for line in wrap_body(body, WRAP_WIDTH - 4).lines() {
            out.push_str(&format!("    {line}\n"));
        }
    }

    let footers: Vec<&String> = proposal
        .footers
        .iter()
        .flatten()
        .filter(|f| !f.trim().is_empty())
        .collect();
    if !footers.is_empty() {
        out.push('\n');
        for footer in footers {
            out.push_str(&format!("    {}\n", footer.trim()));
        }
    }

    out.push_str(&format!("\n  Files ({}):\n", proposal.files.len()));
    for file in &proposal.files {
        out.push_str(&format!("    - {file}\n"));
    }

    out.trim_end().to_string()
}

/// One-line report for a created commit.
pub fn render_applied(subject: &str, summary: &CommitSummary) -> String {
    format!(
        "  [DONE] {} {} ({} file{} changed, +{} -{})",
        summary.short_hash(),
        subject,
        summary.files_changed,
        if summary.files_changed == 1 { "" } else { "s" },
        summary.insertions,
        summary.deletions
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::CommitType;

    #[test]
    fn test_render_proposal_sections() {
        let proposal = CommitProposal {
            commit_type: CommitType::Feat,
            scope: Some("cli".to_string()),
            description: "add verbose flag".to_string(),
            breaking: false,
            body: Some("Users asked for more output.".to_string()),
            footers: Some(vec!["Refs: #4".to_string()]),
            files: vec!["src/main.rs".to_string(), "README.md".to_string()],
        };
        let rendered = render_proposal(&proposal, None);
        assert!(rendered.contains("  feat(cli): add verbose flag"));
        assert!(rendered.contains("    Users asked for more output."));
        assert!(rendered.contains("    Refs: #4"));
        assert!(rendered.contains("  Files (2):"));
        assert!(rendered.ends_with("    - README.md"));
    }

    #[test]
    fn test_render_proposal_jira_display_line() {
        let proposal = CommitProposal {
            commit_type: CommitType::Fix,
            scope: None,
            description: "Stop leak".to_string(),
            breaking: false,
            body: None,
            footers: None,
            files: vec!["a.rs".to_string()],
        };
        let rendered = render_proposal(&proposal, Some("AB-1"));
        assert!(rendered.contains("  AB-1-fix-stop-leak"));
    }

    #[test]
    fn test_render_proposal_without_body_or_footers() {
        let proposal = CommitProposal {
            commit_type: CommitType::Chore,
            scope: None,
            description: "bump deps".to_string(),
            breaking: false,
            body: None,
            footers: Some(vec!["  ".to_string()]),
            files: vec!["Cargo.lock".to_string()],
        };
        assert_eq!(
            render_proposal(&proposal, None),
            "\n  chore: bump deps\n\n  Files (1):\n    - Cargo.lock"
        );
    }

    #[test]
    fn test_render_applied() {
        let summary = CommitSummary {
            hash: "0123456789abcdef".to_string(),
            files_changed: 1,
            insertions: 3,
            deletions: 0,
        };
        assert_eq!(
            render_applied("feat: add a", &summary),
            "  [DONE] 0123456 feat: add a (1 file changed, +3 -0)"
        );
    }
}
