//! Prompt assembly and token-cost gating.

pub mod prompt;
pub mod tokens;

pub use prompt::{Prompt, build_prompt, sanitize_for_prompt};
pub use tokens::{RiskLevel, TokenRiskTier, classify, estimate_tokens};
