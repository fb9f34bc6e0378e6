//! Claude CLI spawning and stream-json decoding.

use std::env;
use std::process::Stdio;
use std::time::Duration;

use futures::Stream;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::claude::ClaudeOptions;
use crate::context::Prompt;
use crate::error::ClaudeError;

/// Environment variable setting the idle timeout between output lines.
const TIMEOUT_ENV_VAR: &str = "TAXIS_CLAUDE_TIMEOUT";

/// Get the configured idle timeout.
///
/// Unset means wait indefinitely. Logs a warning and waits indefinitely if
/// the variable holds something other than a positive number of seconds.
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

/// Check if the Claude Code CLI is on `PATH`.
pub fn is_installed() -> bool {
    which::which("claude").is_ok()
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamLine {
    StreamEvent {
        event: serde_json::Value,
    },
    Result {
        #[serde(default)]
        is_error: bool,
        #[serde(default)]
        result: Option<String>,
    },
    #[serde(other)]
    Other,
}

/// What one line of `--output-format stream-json` output means to us.
#[derive(Debug, PartialEq, Eq)]
enum LineEvent {
    /// A text delta of the assistant's answer.
    Text(String),
    /// The final result record.
    Done { is_error: bool, result: Option<String> },
    Ignored,
}

fn interpret_line(line: &str) -> LineEvent {
    let line = line.trim();
    if line.is_empty() {
        return LineEvent::Ignored;
    }
    match serde_json::from_str::<StreamLine>(line) {
        Ok(StreamLine::StreamEvent { event }) => {
            let is_text_delta = event["type"] == "content_block_delta"
                && event["delta"]["type"] == "text_delta";
            match event["delta"]["text"].as_str() {
                Some(text) if is_text_delta => LineEvent::Text(text.to_string()),
                _ => LineEvent::Ignored,
            }
        }
        Ok(StreamLine::Result { is_error, result }) => LineEvent::Done { is_error, result },
        Ok(StreamLine::Other) => LineEvent::Ignored,
        Err(e) => {
            debug!("Skipping unrecognized Claude output line: {}", e);
            LineEvent::Ignored
        }
    }
}

/// Run Claude and stream the text of its answer as it is generated.
///
/// The user prompt goes to stdin and the system prompt is appended to
/// Claude's own. When no partial deltas arrive (older CLI versions), the
/// final result text is yielded once at the end. The process is killed if
/// the stream is dropped early.
pub fn stream_text(
    prompt: Prompt,
    options: ClaudeOptions,
) -> impl Stream<Item = Result<String, ClaudeError>> + Send + 'static {
    async_stream::try_stream! {
        if !is_installed() {
            Err(ClaudeError::NotInstalled)?;
        }

        let mut child = Command::new("claude")
            .args(options.args(&prompt.system))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ClaudeError::SpawnFailed)?;
        debug!("Spawned claude (model: {:?})", options.model_arg());

        if let Some(mut stdin) = child.stdin.take() {
            let input = prompt.user;
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(input.as_bytes()).await {
                    debug!("Failed to write prompt to claude stdin: {}", e);
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
            .ok_or_else(|| ClaudeError::ExecutionFailed("stdout was not captured".to_string()))?;
        let mut lines = BufReader::new(stdout).lines();
        let idle_timeout = get_timeout();
        let mut saw_delta = false;
        let mut final_result = None;

        loop {
            let next = match idle_timeout {
                Some(limit) => timeout(limit, lines.next_line())
                    .await
                    .map_err(|_| ClaudeError::Timeout(limit.as_secs()))?,
                None => lines.next_line().await,
            };
            let Some(line) = next.map_err(ClaudeError::StreamFailed)? else {
                break;
            };

            match interpret_line(&line) {
                LineEvent::Text(text) => {
                    saw_delta = true;
                    yield text;
                }
                LineEvent::Done { is_error: true, result } => {
                    Err(ClaudeError::ExecutionFailed(
                        result.unwrap_or_else(|| "unknown error".to_string()),
                    ))?;
                }
                LineEvent::Done { is_error: false, result } => final_result = result,
                LineEvent::Ignored => {}
            }
        }

        let status = child.wait().await.map_err(ClaudeError::StreamFailed)?;
        if !status.success() {
            let stderr = match stderr_task {
                Some(task) => task.await.unwrap_or_default(),
                None => String::new(),
            };
            Err(ClaudeError::NonZeroExit {
                code: status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            })?;
        }

        if !saw_delta && let Some(text) = final_result {
            yield text;
        }
    }
}
