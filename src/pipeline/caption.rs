//! Vision-model captioning backed by an `edgequake_llm` provider.
//!
//! [`VisionCaptioner`] is the production [`CaptionModel`]: it sends one
//! cropped image plus the caption prompt to a multimodal provider and returns
//! the raw answer. Cleanup of that answer happens in
//! [`crate::pipeline::postprocess::clean_caption`].
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient. Exponential backoff
//! (`retry_backoff_ms * 2^attempt`) with a 500 ms base and 3 retries waits
//! 500 ms → 1 s → 2 s before giving up on an image.

use crate::error::{CaptionError, ReadError};
use crate::layout::CaptionModel;
use crate::prompts::CAPTION_SYSTEM_PROMPT;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Default model when a provider is named without one.
pub const DEFAULT_CAPTION_MODEL: &str = "gpt-4.1-nano";

/// Caption model calling a vision-capable LLM provider.
#[derive(Clone)]
pub struct VisionCaptioner {
    provider: Arc<dyn LLMProvider>,
    name: String,
    /// Sampling temperature. Default: 0.1.
    pub temperature: f32,
    /// Maximum output tokens per caption. Default: 512.
    pub max_tokens: usize,
    /// Retries per image on transient failures. Default: 3.
    pub max_retries: u32,
    /// Initial backoff between retries in milliseconds. Default: 500.
    pub retry_backoff_ms: u64,
}

impl fmt::Debug for VisionCaptioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisionCaptioner")
            .field("name", &self.name)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .finish()
    }
}

impl VisionCaptioner {
    /// Wrap an already-configured provider. `name` is reported as the OCR
    /// method of the read output.
    pub fn new(provider: Arc<dyn LLMProvider>, name: impl Into<String>) -> Self {
        Self {
            provider,
            name: name.into(),
            temperature: 0.1,
            max_tokens: 512,
            max_retries: 3,
            retry_backoff_ms: 500,
        }
    }

    /// Create a provider by name (e.g. `"openai"`) and model.
    ///
    /// The provider reads its API key from the environment.
    pub fn from_provider_name(provider: &str, model: Option<&str>) -> Result<Self, ReadError> {
        let model = model.unwrap_or(DEFAULT_CAPTION_MODEL);
        let llm = ProviderFactory::create_llm_provider(provider, model).map_err(|e| {
            ReadError::ProviderNotConfigured {
                provider: provider.to_string(),
                hint: format!("{e}"),
            }
        })?;
        Ok(Self::new(llm, format!("{provider}/{model}")))
    }

    /// Resolve a provider from the environment.
    ///
    /// Resolution order:
    /// 1. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set
    /// 2. OpenAI, when `OPENAI_API_KEY` is set (with `model` or the default)
    /// 3. `ProviderFactory::from_env` auto-detection
    pub fn from_env(model: Option<&str>) -> Result<Self, ReadError> {
        if let (Ok(prov), Ok(env_model)) = (
            std::env::var("EDGEQUAKE_LLM_PROVIDER"),
            std::env::var("EDGEQUAKE_MODEL"),
        ) {
            if !prov.is_empty() && !env_model.is_empty() {
                return Self::from_provider_name(&prov, Some(&env_model));
            }
        }

        if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
            if !openai_key.is_empty() {
                return Self::from_provider_name("openai", model);
            }
        }

        let (llm, _embedding) =
            ProviderFactory::from_env().map_err(|e| ReadError::ProviderNotConfigured {
                provider: "auto".to_string(),
                hint: format!(
                    "No LLM provider could be auto-detected from environment.\n\
                    Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                    Error: {}",
                    e
                ),
            })?;
        Ok(Self::new(llm, "auto"))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, retry_backoff_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff_ms = retry_backoff_ms;
        self
    }
}

/// Build `CompletionOptions` for one caption request.
fn build_options(temperature: f32, max_tokens: usize) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(temperature),
        max_tokens: Some(max_tokens),
        ..Default::default()
    }
}

#[async_trait]
impl CaptionModel for VisionCaptioner {
    fn name(&self) -> &str {
        &self.name
    }

    async fn extract_text(&self, image: &ImageData, prompt: &str) -> Result<String, CaptionError> {
        let start = Instant::now();
        let messages = vec![
            ChatMessage::system(CAPTION_SYSTEM_PROMPT),
            ChatMessage::user_with_images(prompt, vec![image.clone()]),
        ];
        let options = build_options(self.temperature, self.max_tokens);

        let mut last_err: Option<String> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.retry_backoff_ms * 2u64.pow(attempt - 1);
                warn!(
                    "Caption: retry {}/{} after {}ms",
                    attempt, self.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match self.provider.chat(&messages, Some(&options)).await {
                Ok(response) => {
                    debug!(
                        "Caption: {} input tokens, {} output tokens, {:?}",
                        response.prompt_tokens,
                        response.completion_tokens,
                        start.elapsed()
                    );
                    return Ok(response.content);
                }
                Err(e) => {
                    let err_msg = format!("{}", e);
                    warn!("Caption: attempt {} failed: {}", attempt + 1, err_msg);
                    last_err = Some(err_msg);
                }
            }
        }

        Err(CaptionError::RequestFailed {
            retries: self.max_retries,
            detail: last_err.unwrap_or_else(|| "Unknown error".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let opts = build_options(0.1, 512);
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(512));
    }

    #[test]
    fn default_model_constant() {
        assert_eq!(DEFAULT_CAPTION_MODEL, "gpt-4.1-nano");
    }
}
