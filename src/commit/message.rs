//! Commit message formatting.

use crate::llm::CommitProposal;

/// Column limit for wrapped commit bodies.
pub const WRAP_WIDTH: usize = 80;

/// Lowercase the first character, leaving the rest untouched.
pub fn decapitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `type(scope)!: ` with scope and `!` omitted when absent.
pub fn conventional_prefix(proposal: &CommitProposal) -> String {
    let scope = proposal
        .scope
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("({s})"))
        .unwrap_or_default();
    let bang = if proposal.breaking { "!" } else { "" };
    format!("{}{}{}: ", proposal.commit_type, scope, bang)
}

/// The subject line.
///
/// With a Jira ticket: `{ticket}-{type}{!}-{words-joined-by-hyphens}`.
/// Otherwise a conventional commit subject; when the description already
/// starts with the exact prefix, it is used as-is instead of repeating it.
pub fn format_subject(proposal: &CommitProposal, jira_ticket: Option<&str>) -> String {
    let description = decapitalize(proposal.description.trim());

    if let Some(ticket) = jira_ticket {
        let bang = if proposal.breaking { "!" } else { "" };
        let slug = description.split_whitespace().collect::<Vec<_>>().join("-");
        return format!("{}-{}{}-{}", ticket, proposal.commit_type, bang, slug);
    }

    let prefix = conventional_prefix(proposal);
    if description.starts_with(&prefix) {
        description
    } else {
        format!("{prefix}{description}")
    }
}

/// The full message: subject, wrapped body, then footers, separated by
/// blank lines.
pub fn format_message(proposal: &CommitProposal, jira_ticket: Option<&str>) -> String {
    let mut parts = vec![format_subject(proposal, jira_ticket)];

    if let Some(body) = proposal.body.as_deref().filter(|b| !b.trim().is_empty()) {
        parts.push(wrap_body(body, WRAP_WIDTH));
    }

    let footers: Vec<&str> = proposal
        .footers
        .iter()
        .flatten()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect();
    if !footers.is_empty() {
        parts.push(footers.join("\n"));
    }

    parts.join("\n\n")
}

/// Wrap each paragraph of `body` (separated by blank lines) independently.
pub fn wrap_body(body: &str, width: usize) -> String {
    let mut paragraphs = Vec::new();
    let mut current = String::new();

    for line in body.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(wrap_text(&current, width).join("\n"));
                current.clear();
            }
        } else {
            current.push(' ');
            current.push_str(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(wrap_text(&current, width).join("\n"));
    }

    paragraphs.join("\n\n")
}

/// Greedy word wrap.
///
/// Whitespace runs collapse to single spaces. A word longer than `width`
/// gets a line of its own and is never split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if line.is_empty() {
            line.push_str(word);
            line_len = word_len;
        } else if line_len + 1 + word_len <= width {
            line.push(' ');
            line.push_str(word);
            line_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
            line_len = word_len;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }

    lines
}
