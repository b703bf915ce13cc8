//! # menu2json
//!
//! Turn a photographed or PDF restaurant menu into structured JSON using a
//! Vision Language Model (VLM).
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (PDF or image)
//!  │
//!  ├─ 1. Input       classify by MIME type, stage as a temp file
//!  ├─ 2. Render      rasterise PDF pages via pdfium (spawn_blocking)
//!  ├─ 3. Preprocess  grayscale + gamma 3 → PNG
//!  ├─ 4. Deliver     upload to object storage (public URL) or inline data URI
//!  ├─ 5. VLM         one call per page, bounded concurrency
//!  ├─ 6. Normalise   strip fences, parse + validate menu JSON
//!  └─ 7. Aggregate   first page's menu name + every page's categories
//! ```
//!
//! A page whose reply cannot be parsed contributes nothing; every other
//! failure aborts the scan.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use menu2json::{ImageDelivery, MenuKind, MenuScanner, ScanConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = ScanConfig::builder().delivery(ImageDelivery::Inline).build()?;
//!     let scanner = MenuScanner::from_config(config)?;
//!     let output = scanner.scan_file("menu.pdf".as_ref(), MenuKind::Pdf).await?;
//!     println!("{}", serde_json::to_string_pretty(&output.menu)?);
//!     eprintln!("{}/{} pages parsed", output.stats.parsed_pages, output.stats.total_pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | axum HTTP surface ([`server::create_app`]) |
//! | `cli`    | on      | The `menu2json` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable both when using only the library:
//! ```toml
//! menu2json = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod menu;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod scan;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ImageDelivery, PromptStyle, RasterOptions, ScanConfig, ScanConfigBuilder, DEFAULT_MODEL,
};
pub use error::{MenuScanError, PageError};
pub use menu::{AggregatedMenu, Category, MenuDocument, Product};
pub use output::{PageReport, ScanOutput, ScanStats};
pub use pipeline::input::{MenuKind, UploadedMenu};
pub use pipeline::llm::{MenuReader, VisionReader};
pub use pipeline::store::{ImageRef, ObjectStore};
pub use progress::{NoopProgressCallback, ProgressCallback, ScanProgressCallback};
pub use scan::MenuScanner;
pub use spaces_upload::{SpacesClient, SpacesConfig};
