//! Provider selection and configuration.

use std::env;
use std::fmt;
use std::pin::Pin;
use std::str::FromStr;

use futures::Stream;
use tracing::{debug, warn};

use crate::claude::{self, ClaudeOptions};
use crate::codex::{self, CodexOptions};
use crate::context::Prompt;
use crate::llm::error::LlmError;
use crate::llm::schema::CommitBatch;

/// Environment variable forcing a provider.
pub const PROVIDER_ENV_VAR: &str = "TAXIS_PROVIDER";

/// Lazy, single-pass sequence of commit batches from one model invocation.
pub type BatchStream = Pin<Box<dyn Stream<Item = Result<CommitBatch, LlmError>> + Send>>;

/// Supported LLM providers, in detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Claude,
    Codex,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Claude, Provider::Codex];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Claude => "Claude",
            Provider::Codex => "Codex",
        }
    }

    /// Whether the provider's CLI is on `PATH`.
    pub fn is_installed(&self) -> bool {
        match self {
            Provider::Claude => claude::is_installed(),
            Provider::Codex => codex::is_installed(),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" => Ok(Provider::Claude),
            "codex" => Ok(Provider::Codex),
            other => Err(format!(
                "unknown provider '{}' (expected 'claude' or 'codex')",
                other
            )),
        }
    }
}

/// Provider forced through `TAXIS_PROVIDER`, if set to a valid name.
pub fn provider_from_env() -> Option<Provider> {
    match env::var(PROVIDER_ENV_VAR) {
        Ok(v) if !v.trim().is_empty() => match v.parse() {
            Ok(provider) => Some(provider),
            Err(e) => {
                warn!("Ignoring {}: {}", PROVIDER_ENV_VAR, e);
                None
            }
        },
        _ => None,
    }
}

/// Pick the provider for this run.
///
/// An explicit request wins; otherwise the first installed CLI in
/// [`Provider::ALL`] order is used.
pub fn select_provider(
    requested: Option<Provider>,
    is_installed: impl Fn(Provider) -> bool,
) -> Result<Provider, LlmError> {
    if let Some(provider) = requested {
        debug!("Using requested provider {}", provider);
        return Ok(provider);
    }

    Provider::ALL
        .into_iter()
        .find(|p| is_installed(*p))
        .inspect(|p| debug!("Detected provider {}", p))
        .ok_or(LlmError::NoProviderAvailable)
}

/// Selected provider with its options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    Claude(ClaudeOptions),
    Codex(CodexOptions),
}

impl ProviderConfig {
    /// Options for `provider`, with model overrides read from the environment.
    pub fn for_provider(provider: Provider, deep: bool) -> Self {
        match provider {
            Provider::Claude => ProviderConfig::Claude(ClaudeOptions::from_env(deep)),
            Provider::Codex => ProviderConfig::Codex(CodexOptions::from_env(deep)),
        }
    }
}

/// A model backend that turns a prompt into a stream of commit batches.
pub trait ModelProvider {
    fn provider(&self) -> Provider;

    /// Open one model invocation. Nothing runs until the stream is polled;
    /// failures surface as an `Err` item, after which the stream ends.
    fn stream_batches(&self, prompt: &Prompt) -> BatchStream;
}

impl<T: ModelProvider + ?Sized> ModelProvider for &T {
    fn provider(&self) -> Provider {
        (**self).provider()
    }

    fn stream_batches(&self, prompt: &Prompt) -> BatchStream {
        (**self).stream_batches(prompt)
    }
}

impl ModelProvider for ProviderConfig {
    fn provider(&self) -> Provider {
        match self {
            ProviderConfig::Claude(_) => Provider::Claude,
            ProviderConfig::Codex(_) => Provider::Codex,
        }
    }

    fn stream_batches(&self, prompt: &Prompt) -> BatchStream {
        match self {
            ProviderConfig::Claude(options) => claude::stream_batches(prompt.clone(), options.clone()),
            ProviderConfig::Codex(options) => codex::stream_batches(prompt.clone(), options.clone()),
        }
    }
}
