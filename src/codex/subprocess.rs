//! Codex CLI spawning and `--json` event decoding.

use std::env;
use std::io::Write;
use std::process::Stdio;
use std::time::Duration;

use futures::Stream;
use serde_json::Value;
use tempfile::NamedTempFile;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::codex::CodexOptions;
use crate::context::Prompt;
use crate::error::CodexError;
use crate::llm::OUTPUT_SCHEMA;

/// Environment variable setting the idle timeout between events.
const TIMEOUT_ENV_VAR: &str = "TAXIS_CODEX_TIMEOUT";

/// Get the configured idle timeout.
///
/// Unset means wait indefinitely. Reasoning models can stay silent for a
/// long time before their first message, so pick a generous value.
fn get_timeout() -> Option<Duration> {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
            _ => {
                warn!("Invalid {} value '{}', not applying a timeout", TIMEOUT_ENV_VAR, v);
                None
            }
        },
        _ => None,
    }
}

/// Check if the Codex CLI is on `PATH`.
pub fn is_installed() -> bool {
    which::which("codex").is_ok()
}

#[derive(Debug, PartialEq, Eq)]
enum CodexEvent {
    /// A completed agent message.
    Message(String),
    Failed(String),
    Ignored,
}

/// Decode one JSONL event. Understands both the `item.completed` event
/// format and the older `{"msg": {...}}` envelope.
fn interpret_event(line: &str) -> CodexEvent {
    let line = line.trim();
    if line.is_empty() {
        return CodexEvent::Ignored;
    }
    let event: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            debug!("Skipping unrecognized Codex output line: {}", e);
            return CodexEvent::Ignored;
        }
    };

    if let Some(msg) = event.get("msg") {
        return match msg["type"].as_str() {
            Some("agent_message") => text_of(&msg["message"]),
            Some("error") => CodexEvent::Failed(error_message(msg)),
            _ => CodexEvent::Ignored,
        };
    }

    match event["type"].as_str() {
        Some("item.completed") => {
            let item = &event["item"];
            let kind = item["type"].as_str().or_else(|| item["item_type"].as_str());
            match kind {
                Some("agent_message" | "assistant_message") => text_of(&item["text"]),
                _ => CodexEvent::Ignored,
            }
        }
        Some("turn.failed") => CodexEvent::Failed(error_message(&event["error"])),
        Some("error") => CodexEvent::Failed(error_message(&event)),
        _ => CodexEvent::Ignored,
    }
}

fn text_of(value: &Value) -> CodexEvent {
    match value.as_str() {
        Some(text) => CodexEvent::Message(text.to_string()),
        None => CodexEvent::Ignored,
    }
}

fn error_message(value: &Value) -> String {
    value["message"]
        .as_str()
        .map(String::from)
        .unwrap_or_else(|| value.to_string())
}

/// Run Codex and stream each completed agent message.
///
/// The output schema is written to a temporary file that lives as long as
/// the process. System and user prompt are sent together on stdin. The
/// process is killed if the stream is dropped early.
pub fn stream_text(
    prompt: Prompt,
    options: CodexOptions,
) -> impl Stream<Item = Result<String, CodexError>> + Send + 'static {
    async_stream::try_stream! {
        if !is_installed() {
            Err(CodexError::NotInstalled)?;
        }

        let mut schema_file = NamedTempFile::new().map_err(CodexError::SchemaFile)?;
        schema_file
            .write_all(OUTPUT_SCHEMA.as_bytes())
            .map_err(CodexError::SchemaFile)?;
        let schema_path = schema_file.path().display().to_string();

        let mut child = Command::new("codex")
            .args(options.args(&schema_path))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(CodexError::SpawnFailed)?;
        debug!("Spawned codex (model: {:?}, deep: {})", options.model, options.deep);

        if let Some(mut stdin) = child.stdin.take() {
            let input = prompt.combined();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(input.as_bytes()).await {
                    debug!("Failed to write prompt to codex stdin: {}", e);
                }
            });
        }

        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf).await;
                buf
            })
        });

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CodexError::ExecutionFailed("stdout was not captured".to_string()))?;
        let mut lines = BufReader::new(stdout).lines();
        let idle_timeout = get_timeout();

        loop {
            let next = match idle_timeout {
                Some(limit) => timeout(limit, lines.next_line())
                    .await
                    .map_err(|_| CodexError::Timeout(limit.as_secs()))?,
                None => lines.next_line().await,
            };
            let Some(line) = next.map_err(CodexError::StreamFailed)? else {
                break;
            };

            match interpret_event(&line) {
                CodexEvent::Message(text) => yield text,
                CodexEvent::Failed(message) => Err(CodexError::ExecutionFailed(message))?,
                CodexEvent::Ignored => {}
            }
        }

        let status = child.wait().await.map_err(CodexError::StreamFailed)?;
        if !status.success() {
            let stderr = match stderr_task {
                Some(task) => task.await.unwrap_or_default(),
                None => String::new(),
            };
            Err(CodexError::NonZeroExit {
                code: status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            })?;
        }

        drop(schema_file);
    }
}
