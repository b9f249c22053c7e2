//! Progress-callback trait for per-page scan events.
//!
//! Inject an [`Arc<dyn ScanProgressCallback>`] via
//! [`crate::config::ScanConfigBuilder::progress_callback`] to receive events
//! as the pipeline filters each page. The CLI uses this to drive its progress
//! bar; library users can forward events anywhere they like.
//!
//! # Example
//!
//! ```rust
//! use pdf_edgescan::{ScanConfig, ScanProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     filtered: AtomicUsize,
//! }
//!
//! impl ScanProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize) {
//!         let done = self.filtered.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("Page {}/{} filtered ({} done)", page_num, total_pages, done);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { filtered: AtomicUsize::new(0) });
//!
//! let config = ScanConfig::builder()
//!     .progress_callback(counter as Arc<dyn ScanProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the scan pipeline as it processes each page.
///
/// Implementations must be `Send + Sync`: with `concurrency > 1` pages are
/// filtered on several blocking-pool threads at once, so `on_page_start` and
/// `on_page_complete` may arrive concurrently and out of page order. All
/// methods default to no-ops.
pub trait ScanProgressCallback: Send + Sync {
    /// Called once after decoding, before any page is filtered.
    fn on_scan_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page is filtered (1-indexed).
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page has been filtered (1-indexed).
    fn on_page_complete(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called once after the output PDF has been assembled.
    ///
    /// # Arguments
    /// * `total_pages`: pages in the output document
    /// * `output_bytes`: size of the encoded PDF
    fn on_scan_complete(&self, total_pages: usize, output_bytes: usize) {
        let _ = (total_pages, output_bytes);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ScanProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ScanConfig`].
pub type ProgressCallback = Arc<dyn ScanProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        started_total: AtomicUsize,
        starts: AtomicUsize,
        completes: AtomicUsize,
        output_bytes: AtomicUsize,
    }

    impl ScanProgressCallback for TrackingCallback {
        fn on_scan_start(&self, total_pages: usize) {
            self.started_total.store(total_pages, Ordering::SeqCst);
        }

        fn on_page_start(&self, _page_num: usize, _total_pages: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_complete(&self, _page_num: usize, _total_pages: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_scan_complete(&self, _total_pages: usize, output_bytes: usize) {
            self.output_bytes.store(output_bytes, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_scan_start(5);
        cb.on_page_start(1, 5);
        cb.on_page_complete(1, 5);
        cb.on_scan_complete(5, 1024);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_scan_start(2);
        tracker.on_page_start(1, 2);
        tracker.on_page_complete(1, 2);
        tracker.on_page_start(2, 2);
        tracker.on_page_complete(2, 2);
        tracker.on_scan_complete(2, 4096);

        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.output_bytes.load(Ordering::SeqCst), 4096);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_scan_start(10);
        cb.on_page_complete(1, 10);
    }
}
