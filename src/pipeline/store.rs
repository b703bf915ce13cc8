//! Image delivery: make a preprocessed page reachable by the model.
//!
//! Two routes exist. With [`ImageDelivery::ObjectStore`] the PNG is uploaded
//! with public-read access and the model receives its URL; with
//! [`ImageDelivery::Inline`] the PNG is embedded in the request as a base64
//! data URI and nothing leaves the process except the model call itself.
//!
//! [`ImageDelivery::ObjectStore`]: crate::config::ImageDelivery::ObjectStore
//! [`ImageDelivery::Inline`]: crate::config::ImageDelivery::Inline

use crate::error::MenuScanError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use spaces_upload::SpacesClient;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Anything that can publish bytes under a key and hand back a public URL.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `body` as a publicly readable object and return its URL.
    async fn put_public(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, MenuScanError>;
}

#[async_trait]
impl ObjectStore for SpacesClient {
    async fn put_public(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, MenuScanError> {
        let size = body.len();
        match self.put_object(key, body, content_type).await {
            Ok(url) => {
                info!("Uploaded {} ({} bytes) → {}", key, size, url);
                Ok(url)
            }
            Err(e) => Err(MenuScanError::UploadFailed {
                key: key.to_string(),
                detail: e.to_string(),
            }),
        }
    }
}

// ── Object keys ──────────────────────────────────────────────────────────

static LAST_KEY_MILLIS: AtomicU64 = AtomicU64::new(0);

/// Millisecond-timestamp object keys that never repeat within a process.
pub struct ObjectKeys;

impl ObjectKeys {
    /// Next key of the form `{prefix}/{unix_millis}.png`.
    ///
    /// Pages uploaded in the same millisecond would share a timestamp, so the
    /// value is bumped past the last one handed out.
    pub fn next_key(prefix: &str) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let millis = next_millis(&LAST_KEY_MILLIS, now);
        let prefix = prefix.trim_end_matches('/');
        if prefix.is_empty() {
            format!("{millis}.png")
        } else {
            format!("{prefix}/{millis}.png")
        }
    }
}

fn next_millis(last: &AtomicU64, now: u64) -> u64 {
    let mut prev = last.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(prev + 1);
        match last.compare_exchange_weak(prev, candidate, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return candidate,
            Err(actual) => prev = actual,
        }
    }
}

// ── Inline delivery ──────────────────────────────────────────────────────

/// Embed PNG bytes as a `data:image/png;base64,…` URI.
pub fn inline_data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

/// How a page image is handed to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Publicly resolvable URL of an uploaded PNG.
    Url(String),
    /// A `data:` URI carrying the PNG itself.
    Inline(String),
}

impl ImageRef {
    pub fn as_str(&self) -> &str {
        match self {
            ImageRef::Url(s) | ImageRef::Inline(s) => s,
        }
    }

    /// The URL, for uploaded images only.
    pub fn url(&self) -> Option<&str> {
        match self {
            ImageRef::Url(s) => Some(s),
            ImageRef::Inline(_) => None,
        }
    }
}
