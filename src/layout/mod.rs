//! Block layout reconstruction for a single PDF page.
//!
//! Takes a page's raw positioned words, raw table regions and raw image
//! regions and turns them into classified [`Block`]s in reading order, then
//! serialises those blocks to markdown.
//!
//! ```text
//! words ──▶ lines ──▶ paragraphs ─┐
//! tables ─▶ is_real_table ────────┼──▶ sort by (page, top) ──▶ markdown
//! images ─▶ embed/caption/omit ───┘
//! ```
//!
//! Nothing here knows about pdfium or a model SDK; those sit behind
//! [`RegionCropper`] and [`CaptionModel`].

pub mod block;
pub mod image;
pub mod lines;
pub mod page;
pub mod sequence;
pub mod table;

pub use block::{
    BBox, Block, BlockContent, BlockKind, ImageContent, Line, PageContent, PositionedWord,
    RawImage, RawTable,
};
pub use image::{
    image_to_markdown, CaptionModel, ImageHandler, ImageMode, RegionCropper, IMAGE_OMITTED,
};
pub use lines::{group_by_lines, group_into_paragraphs};
pub use page::{build_page_blocks, render_page_to_markdown};
pub use sequence::{block_to_markdown, blocks_to_markdown, blocks_to_markdown_with, join_pages};
pub use table::{is_real_table, table_to_markdown};
