//! Model interaction: send one page image with the menu prompt, get text back.
//!
//! The pipeline only depends on the [`MenuReader`] trait, so tests and
//! alternative backends can stand in for the hosted model. [`VisionReader`]
//! is the production implementation over any edgequake-llm provider.
//!
//! ## Retry Strategy
//!
//! No retries by default: a failed call fails the scan. With
//! `max_retries > 0` the wait before attempt `n` is
//! `retry_backoff_ms * 2^(n-1)`, so 500 ms base and 3 retries wait
//! 500 ms → 1 s → 2 s.

use crate::config::{ScanConfig, DEFAULT_MODEL};
use crate::error::MenuScanError;
use crate::pipeline::store::ImageRef;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// Reads one menu page image and returns the model's raw reply.
#[async_trait]
pub trait MenuReader: Send + Sync {
    /// `page` is 1-indexed and used for logging and error labels only.
    async fn read_page(&self, page: usize, image: &ImageRef) -> Result<String, MenuScanError>;
}

/// [`MenuReader`] backed by a vision-capable edgequake-llm provider.
pub struct VisionReader {
    provider: Arc<dyn LLMProvider>,
    system_prompt: String,
    options: CompletionOptions,
    max_retries: u32,
    retry_backoff_ms: u64,
    api_timeout_secs: Option<u64>,
}

impl VisionReader {
    /// Wrap an existing provider, taking prompt and call settings from `config`.
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ScanConfig) -> Self {
        Self {
            provider,
            system_prompt: config.effective_system_prompt().to_string(),
            options: build_options(config),
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
            api_timeout_secs: config.api_timeout_secs,
        }
    }

    /// Resolve a provider from `config` and the environment, then wrap it.
    pub fn from_config(config: &ScanConfig) -> Result<Self, MenuScanError> {
        let provider = resolve_provider(config)?;
        info!(
            "Using LLM provider {} with model {}",
            config.provider_name.as_deref().unwrap_or("auto"),
            config.model.as_deref().unwrap_or(DEFAULT_MODEL)
        );
        Ok(Self::new(provider, config))
    }

    async fn call_once(
        &self,
        page: usize,
        messages: &[ChatMessage],
    ) -> Result<String, MenuScanError> {
        let call = self.provider.chat(messages, Some(&self.options));
        let result = match self.api_timeout_secs {
            Some(secs) => timeout(Duration::from_secs(secs), call)
                .await
                .map_err(|_| MenuScanError::ApiTimeout { page, secs })?,
            None => call.await,
        };
        let response = result.map_err(|e| MenuScanError::LlmApiError {
            page,
            message: e.to_string(),
        })?;
        debug!(
            "Page {}: {} input tokens, {} output tokens",
            page, response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

#[async_trait]
impl MenuReader for VisionReader {
    async fn read_page(&self, page: usize, image: &ImageRef) -> Result<String, MenuScanError> {
        let start = Instant::now();
        let messages = vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user_with_images("", vec![image_data(image)]),
        ];

        let mut attempt = 0;
        loop {
            match self.call_once(page, &messages).await {
                Ok(content) => {
                    info!("Page {}: model replied in {}ms", page, start.elapsed().as_millis());
                    return Ok(content);
                }
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    let backoff = self.retry_backoff_ms * 2u64.pow(attempt - 1);
                    warn!(
                        "Page {}: {}; retry {}/{} after {}ms",
                        page, e, attempt, self.max_retries, backoff
                    );
                    sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Build `CompletionOptions` from the scan config.
fn build_options(config: &ScanConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Turn an [`ImageRef`] into the provider's image attachment.
///
/// Data URIs are split back into payload and MIME type; URLs become URL
/// attachments the provider fetches itself.
fn image_data(image: &ImageRef) -> ImageData {
    let data = match image {
        ImageRef::Inline(uri) => match split_data_uri(uri) {
            Some((mime, b64)) => ImageData::new(b64.to_string(), mime),
            None => ImageData::new(uri.clone(), "image/png"),
        },
        ImageRef::Url(url) => ImageData::from_url(url.clone()),
    };
    data.with_detail("high")
}

fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("data:")?;
    let (mime, b64) = rest.split_once(";base64,")?;
    Some((mime, b64))
}

// ── Provider resolution ──────────────────────────────────────────────────

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, MenuScanError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        MenuScanError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Named provider** (`config.provider_name`) with `config.model`.
/// 2. **OpenAI** when `OPENAI_API_KEY` is set.
/// 3. **Auto-detection** via [`ProviderFactory::from_env`].
///
/// An injected provider bypasses all of this: see [`VisionReader::new`].
pub fn resolve_provider(config: &ScanConfig) -> Result<Arc<dyn LLMProvider>, MenuScanError> {
    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_vision_provider(name, model);
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_vision_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| MenuScanError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let opts = build_options(&ScanConfig::default());
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(4096));
    }

    #[test]
    fn inline_image_is_split_into_payload() {
        let data = image_data(&ImageRef::Inline("data:image/png;base64,iVBORw==".into()));
        assert_eq!(data.data, "iVBORw==");
        assert_eq!(data.mime_type, "image/png");
    }

    #[test]
    fn url_image_passes_through() {
        let url = "https://orderpay-public.ams3.digitaloceanspaces.com/promptathon-cal/1.png";
        let data = image_data(&ImageRef::Url(url.into()));
        assert!(data.is_url());
        assert_eq!(data.to_api_url(), url);
    }

    #[test]
    fn inline_image_is_sent_as_data_uri() {
        let uri = "data:image/png;base64,iVBORw==";
        let data = image_data(&ImageRef::Inline(uri.into()));
        assert!(!data.is_url());
        assert_eq!(data.to_api_url(), uri);
    }

    #[test]
    fn malformed_data_uri_is_not_split() {
        assert_eq!(split_data_uri("data:image/png,raw"), None);
        assert_eq!(split_data_uri("https://x/y.png"), None);
        assert_eq!(
            split_data_uri("data:image/jpeg;base64,AAAA"),
            Some(("image/jpeg", "AAAA"))
        );
    }
}
