//! Progress-callback trait for per-page read events.
//!
//! Inject an [`Arc<dyn ReadProgressCallback>`] via
//! [`crate::config::ReadOptionsBuilder::progress_callback`] to receive events
//! as each page is extracted, laid out and rendered. Callers can forward
//! them to a channel, a log or a terminal progress bar without the library
//! knowing how the host application communicates.
//!
//! # Example
//!
//! ```rust
//! use pdf_layout_md::{ReadOptions, ReadProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl ReadProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, markdown_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} done ({} bytes)", page_num, total_pages, markdown_len);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let options = ReadOptions::builder()
//!     .progress_callback(counter as Arc<dyn ReadProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by [`crate::read`] as it processes each selected page.
///
/// Pages are processed one at a time, in page order. All methods have
/// default no-op implementations so callers only override what they care
/// about.
pub trait ReadProgressCallback: Send + Sync {
    /// Called once after the document is opened and before any page is laid out.
    ///
    /// # Arguments
    /// * `total_pages`: number of selected pages
    fn on_read_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before a page's blocks are built.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page has been rendered to markdown.
    ///
    /// # Arguments
    /// * `page_num`    : 1-indexed page number
    /// * `total_pages` : number of selected pages
    /// * `markdown_len`: byte length of the page's markdown
    fn on_page_complete(&self, page_num: usize, total_pages: usize, markdown_len: usize) {
        let _ = (page_num, total_pages, markdown_len);
    }

    /// Called when a page fails. The read is aborted right after.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after every selected page was rendered.
    fn on_read_complete(&self, total_pages: usize, markdown_len: usize) {
        let _ = (total_pages, markdown_len);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ReadProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReadOptions`].
pub type ProgressCallback = Arc<dyn ReadProgressCallback>;
