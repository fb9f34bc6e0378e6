//! LLM provider routing and streamed response parsing.

pub mod error;
pub mod json;
pub mod router;
pub mod schema;
pub mod stream;

pub use json::{ArrayElementScanner, ScanError};
pub use error::{LlmError, LlmProviderError};
pub use router::{
    BatchStream, ModelProvider, Provider, ProviderConfig, provider_from_env, select_provider,
};
pub use schema::{CommitBatch, CommitProposal, CommitType, OUTPUT_SCHEMA};
pub use stream::batches_from_text;
