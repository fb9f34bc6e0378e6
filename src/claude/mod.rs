//! Claude Code CLI integration.

pub mod subprocess;

use std::env;

use crate::context::Prompt;
use crate::llm::{BatchStream, Provider, batches_from_text};

pub use subprocess::{is_installed, stream_text};

/// Environment variable overriding the Claude model.
pub const MODEL_ENV_VAR: &str = "TAXIS_CLAUDE_MODEL";

/// Model used for deep reasoning when no override is set.
const DEEP_MODEL: &str = "opus";

/// Claude invocation options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaudeOptions {
    pub model: Option<String>,
    pub deep: bool,
}

impl ClaudeOptions {
    /// Options with the model override from `TAXIS_CLAUDE_MODEL`.
    pub fn from_env(deep: bool) -> Self {
        let model = env::var(MODEL_ENV_VAR)
            .ok()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        Self { model, deep }
    }

    /// Model passed to `--model`, if any. An explicit override beats deep mode.
    pub fn model_arg(&self) -> Option<&str> {
        match (&self.model, self.deep) {
            (Some(model), _) => Some(model),
            (None, true) => Some(DEEP_MODEL),
            (None, false) => None,
        }
    }

    /// Command-line arguments for one streamed, non-interactive run.
    pub fn args(&self, system_prompt: &str) -> Vec<String> {
        let mut args: Vec<String> = [
            "-p",
            "--output-format",
            "stream-json",
            "--verbose",
            "--include-partial-messages",
            "--append-system-prompt",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        args.push(system_prompt.to_string());
        if let Some(model) = self.model_arg() {
            args.push("--model".to_string());
            args.push(model.to_string());
        }
        args
    }
}

/// Stream commit batches from Claude.
pub fn stream_batches(prompt: Prompt, options: ClaudeOptions) -> BatchStream {
    batches_from_text(Provider::Claude, stream_text(prompt, options))
}
