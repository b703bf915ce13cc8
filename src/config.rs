//! Configuration types for menu scanning.
//!
//! All pipeline behaviour is controlled through [`ScanConfig`], built via its
//! [`ScanConfigBuilder`]. The model client and object store are *not* part of
//! the config: they are injected into [`crate::scan::MenuScanner`] so tests
//! can substitute fakes without process-wide state.

use crate::error::MenuScanError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a menu scan.
///
/// # Example
/// ```rust
/// use menu2json::{ImageDelivery, ScanConfig};
///
/// let config = ScanConfig::builder()
///     .concurrency(4)
///     .delivery(ImageDelivery::Inline)
///     .artifact_dir(None)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Maximum pages in flight per fan-out (preprocess/upload, model calls). Default: 10.
    pub concurrency: usize,

    /// LLM model identifier, e.g. "gpt-4o". If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic"). If None, auto-detected.
    pub provider_name: Option<String>,

    /// Sampling temperature. Default: 0.1.
    pub temperature: f32,

    /// Maximum tokens the model may generate per page. Default: 4096.
    ///
    /// Long menus produce long JSON; a truncated reply fails to parse and
    /// the page is dropped.
    pub max_tokens: usize,

    /// Retry attempts on a failed model call. Default: 0.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-model-call timeout in seconds. Default: None (wait indefinitely).
    pub api_timeout_secs: Option<u64>,

    /// Which built-in prompt to send. Default: [`PromptStyle::ALaCarte`].
    pub prompt_style: PromptStyle,

    /// Custom system prompt. Overrides `prompt_style` when set.
    pub system_prompt: Option<String>,

    /// Gamma applied after grayscale conversion. Default: 3.0.
    ///
    /// Values above 1 darken mid-tones, which thickens thin print before the
    /// model sees it.
    pub gamma: f32,

    /// PDF rasterisation settings.
    pub raster: RasterOptions,

    /// How page images reach the model. Default: [`ImageDelivery::ObjectStore`].
    pub delivery: ImageDelivery,

    /// Object key prefix for uploaded page images. Default: "promptathon-cal".
    pub key_prefix: String,

    /// Directory incoming uploads are staged in. Default: "uploads".
    pub upload_dir: PathBuf,

    /// Directory cleaned model replies are written to as `{index}.json`.
    /// None disables the artifacts. Default: Some("json").
    pub artifact_dir: Option<PathBuf>,
}

/// Default model when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o";

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            model: None,
            provider_name: None,
            temperature: 0.1,
            max_tokens: 4096,
            max_retries: 0,
            retry_backoff_ms: 500,
            api_timeout_secs: None,
            prompt_style: PromptStyle::default(),
            system_prompt: None,
            gamma: 3.0,
            raster: RasterOptions::default(),
            delivery: ImageDelivery::default(),
            key_prefix: "promptathon-cal".to_string(),
            upload_dir: PathBuf::from("uploads"),
            artifact_dir: Some(PathBuf::from("json")),
        }
    }
}

impl ScanConfig {
    /// Create a new builder for `ScanConfig`.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder {
            config: Self::default(),
        }
    }

    /// The system prompt sent with every page.
    pub fn effective_system_prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .unwrap_or_else(|| crate::prompts::system_prompt_for(self.prompt_style))
    }
}

/// Builder for [`ScanConfig`].
#[derive(Debug)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
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
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn prompt_style(mut self, style: PromptStyle) -> Self {
        self.config.prompt_style = style;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn gamma(mut self, gamma: f32) -> Self {
        self.config.gamma = gamma;
        self
    }

    pub fn raster(mut self, raster: RasterOptions) -> Self {
        self.config.raster = raster;
        self
    }

    pub fn delivery(mut self, delivery: ImageDelivery) -> Self {
        self.config.delivery = delivery;
        self
    }

    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.key_prefix = prefix.into();
        self
    }

    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = dir.into();
        self
    }

    pub fn artifact_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.config.artifact_dir = dir;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ScanConfig, MenuScanError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(MenuScanError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if !(c.gamma.is_finite() && c.gamma > 0.0) {
            return Err(MenuScanError::InvalidConfig(format!(
                "Gamma must be a positive number, got {}",
                c.gamma
            )));
        }
        if c.raster.width == 0 || c.raster.height == 0 {
            return Err(MenuScanError::InvalidConfig(format!(
                "Raster size must be non-zero, got {}x{}",
                c.raster.width, c.raster.height
            )));
        }
        if c.max_tokens == 0 {
            return Err(MenuScanError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

// ── Enums & nested settings ──────────────────────────────────────────────

/// Which built-in prompt describes the menu schema to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PromptStyle {
    /// Categories, products and modifiers only. (default)
    #[default]
    ALaCarte,
    /// Adds fixed-price set-menu courses alongside categories.
    SetMenu,
}

/// How a preprocessed page image is handed to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageDelivery {
    /// Upload to the object store and pass the public URL. (default)
    #[default]
    ObjectStore,
    /// Embed the PNG as a `data:image/png;base64,…` URI; no upload.
    Inline,
}

/// PDF rasterisation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterOptions {
    /// Target page width in pixels. Default: 3000.
    pub width: u32,
    /// Maximum page height in pixels; the aspect ratio is preserved. Default: 2400.
    pub height: u32,
    /// Directory page PNGs are written to. Default: "converted".
    pub output_dir: PathBuf,
    /// Explicit pdfium library path. Falls back to `PDFIUM_LIB_PATH`, the
    /// working directory, then the system library.
    pub pdfium_lib_path: Option<PathBuf>,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            width: 3000,
            height: 2400,
            output_dir: PathBuf::from("converted"),
            pdfium_lib_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_behaviour() {
        let c = ScanConfig::default();
        assert_eq!(c.concurrency, 10);
        assert_eq!(c.max_tokens, 4096);
        assert_eq!(c.max_retries, 0);
        assert_eq!(c.gamma, 3.0);
        assert_eq!(c.raster.width, 3000);
        assert_eq!(c.raster.height, 2400);
        assert_eq!(c.delivery, ImageDelivery::ObjectStore);
        assert_eq!(c.key_prefix, "promptathon-cal");
        assert!(c.api_timeout_secs.is_none());
    }

    #[test]
    fn zero_concurrency_rejected() {
        let err = ScanConfig::builder().concurrency(0).build().unwrap_err();
        assert!(err.to_string().contains("Concurrency"));
    }

    #[test]
    fn non_positive_gamma_rejected() {
        assert!(ScanConfig::builder().gamma(0.0).build().is_err());
        assert!(ScanConfig::builder().gamma(f32::NAN).build().is_err());
        assert!(ScanConfig::builder().gamma(2.2).build().is_ok());
    }

    #[test]
    fn custom_prompt_overrides_style() {
        let c = ScanConfig::builder()
            .prompt_style(PromptStyle::SetMenu)
            .build()
            .unwrap();
        assert_eq!(c.effective_system_prompt(), crate::prompts::SET_MENU_PROMPT);

        let c = ScanConfig::builder().system_prompt("just JSON").build().unwrap();
        assert_eq!(c.effective_system_prompt(), "just JSON");
    }

    #[test]
    fn temperature_is_clamped() {
        let c = ScanConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }
}
