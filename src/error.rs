//! Error types for the pdf-layout-md library.
//!
//! * [`ReadError`]: **Fatal**: the document cannot be read at all (bad
//!   input file, unsupported format, wrong password, pdfium unavailable), or
//!   a page failed in a way nothing can substitute for.
//!
//! * [`BlockError`]: a single block of a single page could not be produced
//!   (crop or caption failure). It carries the page number and the image's
//!   index on that page and is surfaced to callers wrapped in [`ReadError::Block`].
//!
//! * [`CropError`] / [`CaptionError`]: failures reported by the two external
//!   collaborators of the layout core: the page-region cropper and the
//!   caption model.
//!
//! * [`SplitError`]: invalid splitter configuration or chunk output.

use crate::layout::BBox;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-layout-md library.
#[derive(Debug, Error)]
pub enum ReadError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// The file extension is not one this reader handles. Callers choose
    /// their own fallback reader.
    #[error("Unsupported format '{extension}' for '{path}': only PDF documents are read")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Selected page numbers exceed the actual page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// pdfium failed while pulling words, images or a snapshot from a page.
    #[error("Extraction failed for page {page}: {detail}")]
    ExtractionFailed { page: usize, detail: String },

    /// A block of a page could not be produced.
    #[error(transparent)]
    Block(#[from] BlockError),

    // ── Caption model errors ──────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally located or downloaded automatically on first run.\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A block-level failure, located by page number and image index.
///
/// Only image blocks can fail. `image` counts the page's images in the order
/// the page reported them, starting at 0.
#[derive(Debug, Error)]
pub enum BlockError {
    #[error("Page {page}, image {image}: could not crop image region: {source}")]
    CropFailed {
        page: usize,
        image: usize,
        #[source]
        source: CropError,
    },

    #[error("Page {page}, image {image}: caption model failed: {source}")]
    CaptionFailed {
        page: usize,
        image: usize,
        #[source]
        source: CaptionError,
    },
}

impl BlockError {
    pub fn page(&self) -> usize {
        match self {
            BlockError::CropFailed { page, .. } | BlockError::CaptionFailed { page, .. } => *page,
        }
    }

    pub fn image(&self) -> usize {
        match self {
            BlockError::CropFailed { image, .. } | BlockError::CaptionFailed { image, .. } => {
                *image
            }
        }
    }
}

/// Failure to turn a page region into PNG bytes.
#[derive(Debug, Error)]
pub enum CropError {
    /// No page snapshot was rendered for this page.
    #[error("no rendered snapshot is available for this page")]
    Unavailable,

    /// The region has no area once clamped to the page.
    #[error("region {region:?} is empty after clamping to the page")]
    EmptyRegion { region: BBox },

    /// The pixels could not be encoded as PNG.
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Failure reported by a caption model.
#[derive(Debug, Clone, Error)]
pub enum CaptionError {
    /// The request failed after all retries.
    #[error("request failed after {retries} retries: {detail}")]
    RequestFailed { retries: u32, detail: String },

    /// The model could not be called at all.
    #[error("{0}")]
    Unavailable(String),
}

/// Errors raised while splitting text into chunks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplitError {
    /// Splitter parameters are invalid (size zero, overlap too large…).
    #[error("Invalid splitter configuration: {0}")]
    InvalidConfig(String),

    /// Chunks could not be produced from the input.
    #[error("Invalid chunk output: {0}")]
    InvalidChunk(String),
}
