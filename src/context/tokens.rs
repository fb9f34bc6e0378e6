//! Token estimation and risk tiers.
//!
//! The estimate is deliberately coarse (about four characters per token); it
//! only has to be good enough to warn before an expensive model call.

use std::fmt;

/// Upper bound (exclusive) of the low tier.
pub const MODERATE_THRESHOLD: usize = 10_000;
/// Upper bound (exclusive) of the moderate tier.
pub const HIGH_THRESHOLD: usize = 50_000;
/// Upper bound (exclusive) of the high tier.
pub const EXTREME_THRESHOLD: usize = 150_000;

const CHARS_PER_TOKEN: usize = 4;

/// Risk levels in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Extreme,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
            RiskLevel::Extreme => "extreme",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of an estimated token count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenRiskTier {
    pub level: RiskLevel,
    pub label: &'static str,
    pub description: &'static str,
    pub needs_confirmation: bool,
}

/// Estimate the token count of `text` as `ceil(chars / 4)`.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Map a token count onto its risk tier.
pub fn classify(tokens: usize) -> TokenRiskTier {
    if tokens < MODERATE_THRESHOLD {
        TokenRiskTier {
            level: RiskLevel::Low,
            label: "Low",
            description: "Small change set, quick and cheap to analyze",
            needs_confirmation: false,
        }
    } else if tokens < HIGH_THRESHOLD {
        TokenRiskTier {
            level: RiskLevel::Moderate,
            label: "Moderate",
            description: "Medium change set, analysis may take a little while",
            needs_confirmation: false,
        }
    } else if tokens < EXTREME_THRESHOLD {
        TokenRiskTier {
            level: RiskLevel::High,
            label: "High",
            description: "Large change set, analysis will be slow and costly",
            needs_confirmation: true,
        }
    } else {
        TokenRiskTier {
            level: RiskLevel::Extreme,
            label: "Extreme",
            description: "Very large change set, consider committing in smaller pieces",
            needs_confirmation: true,
        }
    }
}
