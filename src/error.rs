//! Error types for the menu2json library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`MenuScanError`]: **Fatal**: the scan cannot produce a menu at all
//!   (no file uploaded, corrupt PDF, upload or model call failed, first page
//!   unreadable). Every fatal error becomes an HTTP 500 carrying its message.
//!
//! * [`PageError`]: **Non-fatal**: one page's model reply could not be
//!   turned into a menu document. The page simply contributes nothing to the
//!   aggregated menu; the error is kept in [`crate::output::PageReport`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the menu2json library.
#[derive(Debug, Error)]
pub enum MenuScanError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No file with an accepted type (PDF or image) was uploaded.
    #[error("No menu file uploaded: expected a PDF or image in the 'menu' field")]
    NoMenuFile,

    /// The file exists but could not be read.
    #[error("Failed to read menu file '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The upload could not be written to the upload directory.
    #[error("Failed to stage upload in '{path}': {source}")]
    StagingFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF could not be opened by pdfium.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or place the library in the working directory."
    )]
    PdfiumBindingFailed(String),

    // ── Image errors ──────────────────────────────────────────────────────
    /// Decoding, grayscale/gamma or PNG encoding failed.
    #[error("Preprocessing failed for page {page}: {detail}")]
    PreprocessFailed { page: usize, detail: String },

    // ── Storage errors ────────────────────────────────────────────────────
    /// The object store rejected or never received the page image.
    #[error("Upload of '{key}' failed: {detail}")]
    UploadFailed { key: String, detail: String },

    /// `ImageDelivery::ObjectStore` is configured but no store was supplied.
    #[error("No object store configured for image delivery")]
    StoreNotConfigured,

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The model call for a page failed (network, auth, rate limit).
    #[error("LLM API error on page {page}: {message}")]
    LlmApiError { page: usize, message: String },

    /// The model call for a page exceeded `api_timeout_secs`.
    #[error("LLM call timed out after {secs}s on page {page}")]
    ApiTimeout { page: usize, secs: u64 },

    // ── Aggregation errors ────────────────────────────────────────────────
    /// The first page's reply did not parse, so there is no menu name.
    #[error("Menu name unavailable: page 1 produced no menu data")]
    FirstPageUnparsed,

    /// The first page parsed but listed no menus.
    #[error("Menu name unavailable: page 1 contains no menus")]
    MissingMenuName,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write a cleaned response artifact.
    #[error("Failed to write response artifact '{path}': {source}")]
    ArtifactWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page's model reply.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageError {
    /// The cleaned reply is not JSON.
    #[error("Page {page}: reply is not valid JSON: {detail}")]
    InvalidJson { page: usize, detail: String },

    /// The reply is JSON but does not describe a menu document.
    #[error("Page {page}: reply does not match the menu schema: {detail}")]
    SchemaMismatch { page: usize, detail: String },
}

impl PageError {
    pub fn page(&self) -> usize {
        match self {
            PageError::InvalidJson { page, .. } | PageError::SchemaMismatch { page, .. } => *page,
        }
    }
}
