//! Scan result types.

use crate::error::PageError;
use crate::menu::AggregatedMenu;
use serde::{Deserialize, Serialize};

/// Everything a scan produced.
///
/// `menu` is what the HTTP surface returns; `pages` and `stats` are kept for
/// library and CLI callers that want to see which pages were dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOutput {
    pub menu: AggregatedMenu,
    /// One report per page, in page order.
    pub pages: Vec<PageReport>,
    pub stats: ScanStats,
}

/// What happened to a single page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReport {
    /// 1-indexed page number.
    pub page: usize,
    /// Public URL the model was given, or None when the image went inline.
    pub image_url: Option<String>,
    /// Byte length of the raw model reply.
    pub reply_len: usize,
    /// Wall-clock time of the model call.
    pub duration_ms: u64,
    /// Set when the reply could not be turned into a menu document.
    pub error: Option<PageError>,
}

impl PageReport {
    pub fn is_parsed(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate counters for a scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    pub total_pages: usize,
    pub parsed_pages: usize,
    pub unparsed_pages: usize,
    /// Categories in the aggregated menu.
    pub categories: usize,
    pub render_duration_ms: u64,
    pub deliver_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}
