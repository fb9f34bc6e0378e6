//! Structured output the model is constrained to produce.

use std::fmt;

use serde::Deserialize;

/// Conventional commit types the model may choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    Feat,
    Fix,
    Docs,
    Style,
    Refactor,
    Perf,
    Test,
    Build,
    Ci,
    Chore,
    Revert,
}

impl CommitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitType::Feat => "feat",
            CommitType::Fix => "fix",
            CommitType::Docs => "docs",
            CommitType::Style => "style",
            CommitType::Refactor => "refactor",
            CommitType::Perf => "perf",
            CommitType::Test => "test",
            CommitType::Build => "build",
            CommitType::Ci => "ci",
            CommitType::Chore => "chore",
            CommitType::Revert => "revert",
        }
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One proposed commit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitProposal {
    #[serde(rename = "type")]
    pub commit_type: CommitType,
    #[serde(default)]
    pub scope: Option<String>,
    pub description: String,
    #[serde(default)]
    pub breaking: bool,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub footers: Option<Vec<String>>,
    pub files: Vec<String>,
}

/// One streamed element: an ordered group of proposals.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitBatch {
    pub commits: Vec<CommitProposal>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BatchElement {
    Batch(CommitBatch),
    Single(CommitProposal),
}

/// Parse one array element into a batch.
///
/// Models occasionally flatten the structure and emit bare proposals; those
/// are accepted as one-proposal batches.
pub fn parse_batch(element: &str) -> Result<CommitBatch, serde_json::Error> {
    Ok(match serde_json::from_str::<BatchElement>(element)? {
        BatchElement::Batch(batch) => batch,
        BatchElement::Single(proposal) => CommitBatch {
            commits: vec![proposal],
        },
    })
}

/// JSON schema handed to providers that enforce structured output.
pub const OUTPUT_SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "batches": {
      "type": "array",
      "items": {
        "type": "object",
        "properties": {
          "commits": {
            "type": "array",
            "items": {
              "type": "object",
              "properties": {
                "type": {
                  "type": "string",
                  "enum": ["feat", "fix", "docs", "style", "refactor", "perf", "test", "build", "ci", "chore", "revert"]
                },
                "scope": { "type": ["string", "null"] },
                "description": { "type": "string" },
                "breaking": { "type": "boolean" },
                "body": { "type": ["string", "null"] },
                "footers": {
                  "type": ["array", "null"],
                  "items": { "type": "string" }
                },
                "files": {
                  "type": "array",
                  "items": { "type": "string" }
                }
              },
              "required": ["type", "scope", "description", "breaking", "body", "footers", "files"],
              "additionalProperties": false
            }
          }
        },
        "required": ["commits"],
        "additionalProperties": false
      }
    }
  },
  "required": ["batches"],
  "additionalProperties": false
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch() {
        let batch = parse_batch(
            r#"{"commits": [{"type": "feat", "scope": "auth", "description": "add login", "breaking": false, "body": null, "footers": null, "files": ["src/login.rs"]}]}"#,
        )
        .unwrap();
        assert_eq!(batch.commits.len(), 1);
        let proposal = &batch.commits[0];
        assert_eq!(proposal.commit_type, CommitType::Feat);
        assert_eq!(proposal.scope.as_deref(), Some("auth"));
        assert_eq!(proposal.files, vec!["src/login.rs"]);
    }

    #[test]
    fn test_parse_bare_proposal_as_single_batch() {
        let batch = parse_batch(
            r#"{"type": "fix", "description": "handle empty input", "files": ["a.rs"]}"#,
        )
        .unwrap();
        assert_eq!(batch.commits.len(), 1);
        assert_eq!(batch.commits[0].commit_type, CommitType::Fix);
        assert!(!batch.commits[0].breaking);
        assert_eq!(batch.commits[0].scope, None);
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        assert!(parse_batch(r#"{"type": "wip", "description": "x", "files": []}"#).is_err());
    }

    #[test]
    fn test_parse_rejects_missing_files() {
        assert!(parse_batch(r#"{"commits": [{"type": "feat", "description": "x"}]}"#).is_err());
    }

    #[test]
    fn test_schema_is_valid_json() {
        let value: serde_json::Value =
            serde_json::from_str(OUTPUT_SCHEMA).expect("schema should be valid JSON");
        assert_eq!(value["required"][0], "batches");
        let types = &value["properties"]["batches"]["items"]["properties"]["commits"]["items"]
            ["properties"]["type"]["enum"];
        assert_eq!(types.as_array().unwrap().len(), 11);
    }
}
