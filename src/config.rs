//! Configuration types for invoice extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Table reconstruction only reads
//! [`ExtractionConfig::row_length_policy`]; every other knob concerns the
//! optional LLM line-item step or the multi-document driver.

use crate::error::ExtractError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Model used for line items when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for extracting tables and line items.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use invoice_extract::{ExtractionConfig, RowLengthPolicy};
///
/// let config = ExtractionConfig::builder()
///     .row_length_policy(RowLengthPolicy::PadOrTruncate)
///     .extract_line_items(true)
///     .model("gpt-4o-mini")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// What to do with a data row whose cell count differs from the header.
    /// Default: [`RowLengthPolicy::Reject`].
    pub row_length_policy: RowLengthPolicy,

    /// Ask the LLM for invoice line items in addition to the tables. Default: false.
    pub extract_line_items: bool,

    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "azure", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.0.
    ///
    /// Line items are transcription, not generation; zero keeps the answer
    /// stable across runs.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per document. Default: 4096.
    pub max_tokens: usize,

    /// Maximum retry attempts on a failed LLM call. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-LLM-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Number of documents processed at once. Default: 4.
    pub concurrency: usize,

    /// Custom line-item prompt. Must contain `{document_text}`.
    pub prompt_template: Option<String>,

    /// Per-document progress events. [`crate::extract::extract_documents`]
    /// also sends batch start/complete; single-document calls report as
    /// index 0 without batch events. `extract_analysis` sends none.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            row_length_policy: RowLengthPolicy::default(),
            extract_line_items: false,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.0,
            max_tokens: 4096,
            max_retries: 3,
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            concurrency: 4,
            prompt_template: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("row_length_policy", &self.row_length_policy)
            .field("extract_line_items", &self.extract_line_items)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("concurrency", &self.concurrency)
            .field("prompt_template", &self.prompt_template.as_ref().map(|_| "<custom>"))
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model to request, falling back to [`DEFAULT_MODEL`].
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`ExtractionConfig`].
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl fmt::Debug for ExtractionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ExtractionConfigBuilder {
    pub fn row_length_policy(mut self, policy: RowLengthPolicy) -> Self {
        self.config.row_length_policy = policy;
        self
    }

    pub fn extract_line_items(mut self, v: bool) -> Self {
        self.config.extract_line_items = v;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.config.prompt_template = Some(template.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(ExtractError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if let Some(ref t) = c.prompt_template {
            if !t.contains(crate::prompts::DOCUMENT_TEXT_PLACEHOLDER) {
                return Err(ExtractError::InvalidConfig(format!(
                    "Prompt template must contain {}",
                    crate::prompts::DOCUMENT_TEXT_PLACEHOLDER
                )));
            }
        }
        if c.api_timeout_secs == 0 {
            return Err(ExtractError::InvalidConfig(
                "API timeout must be at least 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Handling of data rows whose cell count differs from the header's.
///
/// Cells are placed by position, so a ragged row cannot be aligned with
/// certainty. The default rejects the whole table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RowLengthPolicy {
    /// Fail the table with [`crate::error::TableError::RowLengthMismatch`]. (default)
    #[default]
    Reject,
    /// Pad short rows with empty strings and cut long rows to the header width.
    PadOrTruncate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ExtractionConfig::default();
        assert_eq!(c.row_length_policy, RowLengthPolicy::Reject);
        assert!(!c.extract_line_items);
        assert_eq!(c.temperature, 0.0);
        assert_eq!(c.model_or_default(), DEFAULT_MODEL);
    }

    #[test]
    fn builder_clamps() {
        let c = ExtractionConfig::builder()
            .temperature(9.0)
            .concurrency(0)
            .build()
            .unwrap();
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn prompt_template_needs_placeholder() {
        let err = ExtractionConfig::builder()
            .prompt_template("List the items.")
            .build()
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidConfig(_)));

        let ok = ExtractionConfig::builder()
            .prompt_template("Items in: {document_text}")
            .build();
        assert!(ok.is_ok());
    }

    #[test]
    fn zero_timeout_rejected() {
        assert!(ExtractionConfig::builder().api_timeout_secs(0).build().is_err());
    }

    #[test]
    fn debug_hides_provider() {
        let s = format!("{:?}", ExtractionConfig::default());
        assert!(s.contains("row_length_policy"));
    }
}
