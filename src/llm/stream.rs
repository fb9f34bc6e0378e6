//! Turning streamed model text into commit batches.

use futures::{Stream, StreamExt};
use tracing::debug;

use crate::llm::json::ArrayElementScanner;
use crate::llm::error::{LlmError, LlmProviderError};
use crate::llm::router::{BatchStream, Provider};
use crate::llm::schema::parse_batch;

/// Adapt a stream of text chunks into a [`BatchStream`].
///
/// Each batch is yielded as soon as its closing brace arrives. The first
/// error (provider failure, malformed element, truncated or missing array)
/// is yielded once and ends the stream.
pub fn batches_from_text<S, E>(provider: Provider, chunks: S) -> BatchStream
where
    S: Stream<Item = Result<String, E>> + Send + 'static,
    E: Into<LlmProviderError> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut chunks = Box::pin(chunks);
        let mut scanner = ArrayElementScanner::new();
        let mut raw = String::new();

        while let Some(chunk) = chunks.next().await {
            let text = match chunk {
                Ok(text) => text,
                Err(e) => {
                    yield Err(LlmError::ProviderFailed(e.into()));
                    return;
                }
            };
            raw.push_str(&text);

            for element in scanner.feed(&text) {
                match parse_batch(&element) {
                    Ok(batch) => {
                        debug!("Received batch {} with {} proposal(s)", scanner.emitted(), batch.commits.len());
                        yield Ok(batch);
                    }
                    Err(e) => {
                        yield Err(LlmError::ResponseParseFailed {
                            provider,
                            raw_output: element,
                            parse_error: e.to_string(),
                        });
                        return;
                    }
                }
            }
        }

        if let Err(e) = scanner.finish() {
            yield Err(LlmError::ResponseParseFailed {
                provider,
                raw_output: raw,
                parse_error: e.to_string(),
            });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClaudeError;
    use futures::stream;

    fn chunks(parts: &[&str]) -> Vec<Result<String, ClaudeError>> {
        parts.iter().map(|p| Ok(p.to_string())).collect()
    }

    const PROPOSAL: &str = r#"{"type": "feat", "scope": null, "description": "add a", "breaking": false, "body": null, "footers": null, "files": ["a.rs"]}"#;

    #[tokio::test]
    async fn yields_batches_in_order() {
        let text = format!(
            r#"{{"batches": [{{"commits": [{PROPOSAL}]}}, {{"commits": [{PROPOSAL}, {PROPOSAL}]}}]}}"#
        );
        let (head, tail) = text.split_at(text.len() / 2);
        let batches: Vec<_> = batches_from_text(Provider::Claude, stream::iter(chunks(&[head, tail])))
            .collect()
            .await;

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].as_ref().unwrap().commits.len(), 1);
        assert_eq!(batches[1].as_ref().unwrap().commits.len(), 2);
    }

    #[tokio::test]
    async fn bare_proposals_become_single_batches() {
        let text = format!("[{PROPOSAL}, {PROPOSAL}]");
        let batches: Vec<_> = batches_from_text(Provider::Codex, stream::iter(chunks(&[&text])))
            .collect()
            .await;
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.as_ref().unwrap().commits.len() == 1));
    }

    #[tokio::test]
    async fn provider_error_ends_stream_after_earlier_batches() {
        let items = vec![
            Ok(format!(r#"[{{"commits": [{PROPOSAL}]}}, "#)),
            Err(ClaudeError::Timeout(30)),
            Ok(format!(r#"{{"commits": [{PROPOSAL}]}}]"#)),
        ];
        let results: Vec<_> = batches_from_text(Provider::Claude, stream::iter(items))
            .collect()
            .await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(LlmError::ProviderFailed(LlmProviderError::Claude(ClaudeError::Timeout(30))))
        ));
    }

    #[tokio::test]
    async fn malformed_element_is_fatal() {
        let text = r#"[{"commits": [{"type": "wip", "description": "x", "files": []}]}, {"commits": []}]"#;
        let results: Vec<_> = batches_from_text(Provider::Claude, stream::iter(chunks(&[text])))
            .collect()
            .await;
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(LlmError::ResponseParseFailed { .. })));
    }

    #[tokio::test]
    async fn output_without_array_is_fatal() {
        let results: Vec<_> =
            batches_from_text(Provider::Codex, stream::iter(chunks(&["I could not do that."])))
                .collect()
                .await;
        assert_eq!(results.len(), 1);
        match &results[0] {
            Err(LlmError::ResponseParseFailed { raw_output, provider, .. }) => {
                assert_eq!(raw_output, "I could not do that.");
                assert_eq!(*provider, Provider::Codex);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn truncated_output_is_fatal() {
        let text = format!(r#"[{{"commits": [{PROPOSAL}]}}, {{"commits": ["#);
        let results: Vec<_> = batches_from_text(Provider::Claude, stream::iter(chunks(&[&text])))
            .collect()
            .await;
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
