//! Pipeline stages around the layout core.
//!
//! Each submodule implements one step. The layout core in [`crate::layout`]
//! never calls pdfium or a model SDK itself; these stages feed it
//! primitives and serve its crop and caption requests.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ tables ──▶ [layout] ──▶ encode ──▶ caption ──▶ postprocess
//! (URL/path) (pdfium)  (stream)               (crop/b64)  (VLM)       (cleanup)
//! ```
//!
//! 1. [`input`]  : canonicalise the user-supplied path, URL or bytes to a local PDF
//! 2. [`extract`]: pull words, image boxes and snapshots per page; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`tables`] : find table regions from text alignment
//! 4. [`encode`] : crop a snapshot region to PNG and base64-wrap it
//! 5. [`caption`]: drive the vision model with retry/backoff; the only
//!    stage with network I/O besides downloads
//! 6. [`postprocess`]: deterministic cleanup of caption text

pub mod caption;
pub mod encode;
pub mod extract;
pub mod input;
pub mod postprocess;
pub mod tables;
