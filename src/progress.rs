//! Progress-callback trait for per-page scan events.
//!
//! Inject an [`Arc<dyn ScanProgressCallback>`] via
//! [`crate::scan::MenuScanner::with_progress`] to receive events as the
//! pipeline processes each page.
//!
//! # Example
//!
//! ```rust
//! use menu2json::ScanProgressCallback;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountingCallback {
//!     read: AtomicUsize,
//! }
//!
//! impl ScanProgressCallback for CountingCallback {
//!     fn on_page_read(&self, page: usize, total_pages: usize, reply_len: usize) {
//!         let done = self.read.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("Page {page}/{total_pages} read ({reply_len} bytes, {done} done)");
//!     }
//! }
//! ```

use std::sync::Arc;

/// Called by the scan pipeline as it processes each page.
///
/// Pages are processed concurrently, so the per-page methods may be called
/// from different tasks at once and in any page order. All methods default
/// to no-ops.
pub trait ScanProgressCallback: Send + Sync {
    /// Called once the page count is known, before any page is preprocessed.
    fn on_scan_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after a page image has been preprocessed and delivered
    /// (uploaded, or encoded inline).
    fn on_page_delivered(&self, page: usize, total_pages: usize) {
        let _ = (page, total_pages);
    }

    /// Called when the model replied for a page.
    ///
    /// `reply_len` is the byte length of the raw reply.
    fn on_page_read(&self, page: usize, total_pages: usize, reply_len: usize) {
        let _ = (page, total_pages, reply_len);
    }

    /// Called when a page's reply could not be turned into a menu document.
    fn on_page_unparsed(&self, page: usize, total_pages: usize, error: &str) {
        let _ = (page, total_pages, error);
    }

    /// Called once after every page has been normalized.
    fn on_scan_complete(&self, total_pages: usize, parsed_pages: usize) {
        let _ = (total_pages, parsed_pages);
    }
}

/// The default when no callback is configured.
pub struct NoopProgressCallback;

impl ScanProgressCallback for NoopProgressCallback {}

/// Convenience alias for the type held by [`crate::scan::MenuScanner`].
pub type ProgressCallback = Arc<dyn ScanProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Tracking {
        delivered: AtomicUsize,
        unparsed: AtomicUsize,
        parsed_total: AtomicUsize,
    }

    impl ScanProgressCallback for Tracking {
        fn on_page_delivered(&self, _page: usize, _total_pages: usize) {
            self.delivered.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_unparsed(&self, _page: usize, _total_pages: usize, _error: &str) {
            self.unparsed.fetch_add(1, Ordering::SeqCst);
        }

        fn on_scan_complete(&self, _total_pages: usize, parsed_pages: usize) {
            self.parsed_total.store(parsed_pages, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_accepts_every_event() {
        let cb = NoopProgressCallback;
        cb.on_scan_start(3);
        cb.on_page_delivered(1, 3);
        cb.on_page_read(1, 3, 42);
        cb.on_page_unparsed(2, 3, "bad json");
        cb.on_scan_complete(3, 2);
    }

    #[test]
    fn overridden_methods_receive_events() {
        let cb = Arc::new(Tracking::default());
        let dyn_cb: ProgressCallback = cb.clone();
        dyn_cb.on_page_delivered(1, 2);
        dyn_cb.on_page_delivered(2, 2);
        dyn_cb.on_page_read(1, 2, 10);
        dyn_cb.on_page_unparsed(2, 2, "x");
        dyn_cb.on_scan_complete(2, 1);

        assert_eq!(cb.delivered.load(Ordering::SeqCst), 2);
        assert_eq!(cb.unparsed.load(Ordering::SeqCst), 1);
        assert_eq!(cb.parsed_total.load(Ordering::SeqCst), 1);
    }
}
