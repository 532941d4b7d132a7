//! LLM interaction: ask the provider for a document's line items.
//!
//! This module only drives the call; the prompt lives in [`crate::prompts`]
//! and the answer is decoded by [`super::items`].
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient. Each failed or
//! timed-out attempt is retried after `retry_backoff_ms * 2^(attempt-1)`:
//! with 500 ms base and 3 retries the waits are 500 ms → 1 s → 2 s.

use crate::config::ExtractionConfig;
use crate::error::LineItemError;
use crate::prompts::line_item_prompt;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// `response_format` value that switches OpenAI-compatible providers to JSON mode.
pub const JSON_RESPONSE_FORMAT: &str = "json_object";

/// Raw answer of a successful call.
#[derive(Debug, Clone)]
pub struct LlmAnswer {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub retries: u32,
    pub duration_ms: u64,
}

enum Failure {
    Api(String),
    Timeout,
}

/// Send the line-item prompt for one document.
///
/// The whole request is a single system message containing the prompt with
/// the document text embedded.
pub async fn request_line_items(
    provider: &Arc<dyn LLMProvider>,
    source: &str,
    document_text: &str,
    config: &ExtractionConfig,
) -> Result<LlmAnswer, LineItemError> {
    let start = Instant::now();
    let prompt = line_item_prompt(config.prompt_template.as_deref(), document_text);
    let messages = vec![ChatMessage::system(prompt)];
    let options = build_options(config);
    let call_timeout = Duration::from_secs(config.api_timeout_secs);

    let mut last_failure = Failure::Api("Unknown error".to_string());

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "{}: retry {}/{} after {}ms",
                source, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match timeout(call_timeout, provider.chat(&messages, Some(&options))).await {
            Ok(Ok(response)) => {
                let duration = start.elapsed();
                debug!(
                    "{}: {} input tokens, {} output tokens, {:?}",
                    source, response.prompt_tokens, response.completion_tokens, duration
                );
                return Ok(LlmAnswer {
                    content: response.content,
                    input_tokens: response.prompt_tokens as u64,
                    output_tokens: response.completion_tokens as u64,
                    retries: attempt,
                    duration_ms: duration.as_millis() as u64,
                });
            }
            Ok(Err(e)) => {
                let err_msg = format!("{}", e);
                warn!("{}: attempt {} failed: {}", source, attempt + 1, err_msg);
                last_failure = Failure::Api(err_msg);
            }
            Err(_) => {
                warn!(
                    "{}: attempt {} timed out after {}s",
                    source,
                    attempt + 1,
                    config.api_timeout_secs
                );
                last_failure = Failure::Timeout;
            }
        }
    }

    Err(match last_failure {
        Failure::Timeout => LineItemError::Timeout {
            secs: config.api_timeout_secs,
        },
        Failure::Api(detail) => LineItemError::LlmFailed {
            retries: config.max_retries,
            detail,
        },
    })
}

/// Build `CompletionOptions` from the extraction config.
///
/// JSON mode is always requested; the answer is parsed as JSON.
fn build_options(config: &ExtractionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        response_format: Some(JSON_RESPONSE_FORMAT.to_string()),
        ..Default::default()
    }
}
