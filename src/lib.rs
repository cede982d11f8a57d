//! # pdf-layout-md
//!
//! Reconstruct the reading order of PDF pages as Markdown.
//!
//! ## Why this crate?
//!
//! Plain text extraction loses the structure of a page: tables come out as
//! runs of words, figures disappear, and paragraphs are split at every line
//! break. This crate extracts positioned words, table regions and image
//! regions through pdfium, classifies them into blocks, and emits those
//! blocks top to bottom: prose as paragraphs, tables as pipe tables, and
//! images embedded, captioned by a vision model, or marked as omitted.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     resolve local file, URL or byte buffer
//!  ├─ 2. Extract   words, text runs, image boxes via pdfium (spawn_blocking)
//!  ├─ 3. Tables    stream-mode table finder over text runs
//!  ├─ 4. Layout    lines → paragraphs, table validation, image handling
//!  ├─ 5. Sequence  sort blocks by (page, top), render markdown
//!  └─ 6. Output    ReaderOutput (+ optional chunking via splitters)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_layout_md::{read, ReadOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ReadOptions::default();
//!     let output = read("document.pdf", &options).await?;
//!     println!("{}", output.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Captioning images
//!
//! ```rust,no_run
//! use pdf_layout_md::{read, ReadOptions, VisionCaptioner};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let captioner = VisionCaptioner::from_env(None)?;
//! let options = ReadOptions::builder()
//!     .show_images(false)
//!     .caption_model(Arc::new(captioner))
//!     .build()?;
//! let output = read("document.pdf", &options).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature   | Default | Description |
//! |-----------|---------|-------------|
//! | `cli`     | on      | Enables the `pdflayout` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod layout;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod reader;
pub mod splitter;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{LayoutConfig, PageSelection, PageSeparator, ReadOptions, ReadOptionsBuilder};
pub use error::{BlockError, CaptionError, CropError, ReadError, SplitError};
pub use layout::{
    blocks_to_markdown, group_by_lines, is_real_table, render_page_to_markdown,
    table_to_markdown, BBox, Block, BlockContent, BlockKind, CaptionModel, ImageContent, Line,
    PageContent, PositionedWord, RawImage, RawTable, RegionCropper, IMAGE_OMITTED,
};
pub use output::{DocumentMetadata, PageResult, ReadStats, ReaderOutput};
pub use pipeline::caption::VisionCaptioner;
pub use pipeline::tables::{TableFinderConfig, TextRun};
pub use progress::{NoopProgressCallback, ProgressCallback, ReadProgressCallback};
pub use reader::{inspect, read, read_from_bytes, read_sync, read_to_file};
pub use splitter::{
    CharacterSplitter, ChunkOverlap, HeaderSplitter, Splitter, SplitterOutput, WordSplitter,
};
