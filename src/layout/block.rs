//! Page primitives and the classified [`Block`] they become.
//!
//! Coordinates are in PDF points with the origin at the **top-left** of the
//! page: `top` grows downwards. The pdfium extractor flips pdfium's bottom-up
//! coordinates before anything in this module sees them.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One recognised word with its vertical span and horizontal start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedWord {
    pub text: String,
    pub top: f32,
    pub bottom: f32,
    pub x0: f32,
}

impl PositionedWord {
    pub fn new(text: impl Into<String>, top: f32, bottom: f32, x0: f32) -> Self {
        Self {
            text: text.into(),
            top,
            bottom,
            x0,
        }
    }
}

/// A run of words sharing a baseline, or (after paragraph grouping) a run of
/// such lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub content: String,
    pub top: f32,
    pub bottom: f32,
}

impl Line {
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// Axis-aligned rectangle: `(x0, top)` is the upper-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f32,
    pub top: f32,
    pub x1: f32,
    pub bottom: f32,
}

impl BBox {
    pub fn new(x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        Self { x0, top, x1, bottom }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Whether the word's top-left anchor falls inside this box.
    pub fn contains_word(&self, word: &PositionedWord) -> bool {
        word.top >= self.top && word.top <= self.bottom && word.x0 >= self.x0 && word.x0 <= self.x1
    }
}

/// Table region as reported by a table finder, before classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub bbox: BBox,
    /// Row-major cells. Rows may be ragged and cells may be empty.
    pub cells: Vec<Vec<String>>,
}

/// Bounding box of an image drawn on the page. Pixels are fetched lazily
/// through a [`crate::layout::RegionCropper`].
pub type RawImage = BBox;

/// What an image block ends up holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ImageContent {
    /// Base64-encoded PNG of the cropped region.
    Embedded { base64: String },
    /// Text produced by a caption model.
    Caption { text: String },
    /// The image was present but neither embedded nor captioned.
    Omitted,
}

/// Discriminator for [`BlockContent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Text,
    Table,
    Image,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum BlockContent {
    Text(String),
    Table(Vec<Vec<String>>),
    Image(ImageContent),
}

/// A classified, positioned unit of page content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// 1-indexed page number.
    pub page: usize,
    pub top: f32,
    pub bottom: f32,
    #[serde(flatten)]
    pub content: BlockContent,
}

impl Block {
    pub fn text(page: usize, top: f32, bottom: f32, text: impl Into<String>) -> Self {
        Self {
            page,
            top,
            bottom,
            content: BlockContent::Text(text.into()),
        }
    }

    pub fn table(page: usize, top: f32, bottom: f32, cells: Vec<Vec<String>>) -> Self {
        Self {
            page,
            top,
            bottom,
            content: BlockContent::Table(cells),
        }
    }

    pub fn image(page: usize, top: f32, bottom: f32, image: ImageContent) -> Self {
        Self {
            page,
            top,
            bottom,
            content: BlockContent::Image(image),
        }
    }

    pub fn kind(&self) -> BlockKind {
        match self.content {
            BlockContent::Text(_) => BlockKind::Text,
            BlockContent::Table(_) => BlockKind::Table,
            BlockContent::Image(_) => BlockKind::Image,
        }
    }

    /// Reading-order comparison: page first, then vertical position.
    pub fn reading_order(&self, other: &Self) -> Ordering {
        self.page
            .cmp(&other.page)
            .then(self.top.total_cmp(&other.top))
            .then(self.bottom.total_cmp(&other.bottom))
            .then(self.kind().cmp(&other.kind()))
    }
}

/// Everything the layout core needs to know about one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    /// 1-indexed page number.
    pub page: usize,
    pub words: Vec<PositionedWord>,
    pub tables: Vec<RawTable>,
    pub images: Vec<RawImage>,
}

impl PageContent {
    pub fn new(page: usize) -> Self {
        Self {
            page,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.tables.is_empty() && self.images.is_empty()
    }
}
