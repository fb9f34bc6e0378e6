//! Codex CLI integration.

pub mod subprocess;

use std::env;

use crate::context::Prompt;
use crate::llm::{BatchStream, Provider, batches_from_text};

pub use subprocess::{is_installed, stream_text};

/// Environment variable overriding the Codex model.
pub const MODEL_ENV_VAR: &str = "TAXIS_CODEX_MODEL";

/// Codex invocation options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodexOptions {
    pub model: Option<String>,
    /// Raise the model's reasoning effort to `high`.
    pub deep: bool,
}

impl CodexOptions {
    /// Options with the model override from `TAXIS_CODEX_MODEL`.
    pub fn from_env(deep: bool) -> Self {
        let model = env::var(MODEL_ENV_VAR)
            .ok()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        Self { model, deep }
    }

    /// Arguments for `codex exec`, reading the prompt from stdin.
    pub fn args(&self, schema_path: &str) -> Vec<String> {
        let mut args = vec![
            "exec".to_string(),
            "--json".to_string(),
            "--output-schema".to_string(),
            schema_path.to_string(),
        ];
        if let Some(model) = &self.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }
        if self.deep {
            args.push("-c".to_string());
            args.push("model_reasoning_effort=\"high\"".to_string());
        }
        args.push("-".to_string());
        args
    }
}

/// Stream commit batches from Codex.
pub fn stream_batches(prompt: Prompt, options: CodexOptions) -> BatchStream {
    batches_from_text(Provider::Codex, stream_text(prompt, options))
}
