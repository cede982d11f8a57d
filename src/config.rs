//! Configuration types for reading PDFs into markdown.
//!
//! Everything a read needs is controlled through [`ReadOptions`], built via
//! its [`ReadOptionsBuilder`]. Layout heuristics live in [`LayoutConfig`] and
//! the stream-mode table finder's knobs in [`TableFinderConfig`], both
//! nested inside `ReadOptions` so one value describes a whole run.

use crate::error::ReadError;
use crate::layout::CaptionModel;
use crate::pipeline::tables::TableFinderConfig;
use crate::progress::ProgressCallback;
use crate::prompts::DEFAULT_CAPTION_PROMPT;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Options for a PDF read.
///
/// Built via [`ReadOptions::builder()`] or using [`ReadOptions::default()`].
///
/// # Example
/// ```rust
/// use pdf_layout_md::{PageSelection, ReadOptions};
///
/// let options = ReadOptions::builder()
///     .show_images(false)
///     .pages(PageSelection::Range(1, 3))
///     .build()
///     .unwrap();
/// assert!(!options.show_images);
/// ```
#[derive(Clone)]
pub struct ReadOptions {
    /// Embed images as base64 data URIs. Default: true.
    ///
    /// Takes precedence over `caption_model`: when true, images are embedded
    /// even if a model is configured.
    pub show_images: bool,

    /// Model used to caption images when `show_images` is false.
    pub caption_model: Option<Arc<dyn CaptionModel>>,

    /// Custom caption prompt. If None, uses [`DEFAULT_CAPTION_PROMPT`].
    pub prompt: Option<String>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Page selection. Default: All pages.
    pub pages: PageSelection,

    /// Separator inserted between pages. Default: [`PageSeparator::Marker`].
    pub page_separator: PageSeparator,

    /// Longest edge, in pixels, of the page snapshot images are cropped from.
    /// Default: 2000.
    pub max_rendered_pixels: u32,

    /// Prepend YAML front-matter with document metadata. Default: false.
    pub include_metadata: bool,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Line and paragraph grouping, table acceptance.
    pub layout: LayoutConfig,

    /// Stream-mode table finder tuning.
    pub tables: TableFinderConfig,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            show_images: true,
            caption_model: None,
            prompt: None,
            password: None,
            pages: PageSelection::default(),
            page_separator: PageSeparator::default(),
            max_rendered_pixels: 2000,
            include_metadata: false,
            download_timeout_secs: 120,
            layout: LayoutConfig::default(),
            tables: TableFinderConfig::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ReadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOptions")
            .field("show_images", &self.show_images)
            .field(
                "caption_model",
                &self.caption_model.as_ref().map(|m| m.name().to_string()),
            )
            .field("prompt", &self.prompt)
            .field("pages", &self.pages)
            .field("page_separator", &self.page_separator)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("include_metadata", &self.include_metadata)
            .field("layout", &self.layout)
            .field("tables", &self.tables)
            .finish()
    }
}

impl ReadOptions {
    /// Create a new builder for `ReadOptions`.
    pub fn builder() -> ReadOptionsBuilder {
        ReadOptionsBuilder {
            options: Self::default(),
        }
    }

    /// The prompt sent with each image to the caption model.
    pub fn caption_prompt(&self) -> &str {
        self.prompt.as_deref().unwrap_or(DEFAULT_CAPTION_PROMPT)
    }
}

/// Builder for [`ReadOptions`].
pub struct ReadOptionsBuilder {
    options: ReadOptions,
}

impl fmt::Debug for ReadOptionsBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOptionsBuilder")
            .field("options", &self.options)
            .finish()
    }
}

impl ReadOptionsBuilder {
    pub fn show_images(mut self, v: bool) -> Self {
        self.options.show_images = v;
        self
    }

    pub fn caption_model(mut self, model: Arc<dyn CaptionModel>) -> Self {
        self.options.caption_model = Some(model);
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.options.prompt = Some(prompt.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.options.password = Some(pwd.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.options.pages = selection;
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.options.page_separator = sep;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.options.max_rendered_pixels = px.max(100);
        self
    }

    pub fn include_metadata(mut self, v: bool) -> Self {
        self.options.include_metadata = v;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.options.download_timeout_secs = secs;
        self
    }

    pub fn layout(mut self, layout: LayoutConfig) -> Self {
        self.options.layout = layout;
        self
    }

    pub fn tables(mut self, tables: TableFinderConfig) -> Self {
        self.options.tables = tables;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.options.progress_callback = Some(cb);
        self
    }

    /// Build the options, validating constraints.
    pub fn build(self) -> Result<ReadOptions, ReadError> {
        let o = &self.options;
        let ratio = o.layout.single_cell_row_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(ReadError::InvalidConfig(format!(
                "single_cell_row_ratio must be within 0.0–1.0, got {ratio}"
            )));
        }
        if let Some(tol) = o.layout.line_tolerance {
            if tol.is_nan() || tol < 0.0 {
                return Err(ReadError::InvalidConfig(format!(
                    "line_tolerance must be ≥ 0, got {tol}"
                )));
            }
        }
        if !o.layout.paragraph_gap_ratio.is_finite() {
            return Err(ReadError::InvalidConfig(
                "paragraph_gap_ratio must be finite".into(),
            ));
        }
        if o.tables.min_rows < 2 || o.tables.min_columns < 2 {
            return Err(ReadError::InvalidConfig(
                "table finder needs min_rows ≥ 2 and min_columns ≥ 2".into(),
            ));
        }
        Ok(self.options)
    }
}

/// Layout heuristics used by the block reconstructor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Maximum distance, in points, between a word's top and its line's top.
    /// `None` uses half of the line's current height.
    pub line_tolerance: Option<f32>,

    /// Two lines share a paragraph when their gap is at most this multiple
    /// of the upper line's height. `0.0` keeps every line separate.
    /// Default: 0.75.
    pub paragraph_gap_ratio: f32,

    /// A table is rejected when more than this share of its rows hold at
    /// most one populated cell. Default: 0.5.
    pub single_cell_row_ratio: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            line_tolerance: None,
            paragraph_gap_ratio: 0.75,
            single_cell_row_ratio: 0.5,
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Specifies which pages of the PDF to read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSelection {
    /// Read all pages (default).
    #[default]
    All,
    /// Read a single page (1-indexed).
    Single(usize),
    /// Read a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Read specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

/// How to separate pages in the assembled markdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSeparator {
    /// `--- Page N ---` (default).
    #[default]
    Marker,
    /// No marker; pages are separated by a blank line only.
    None,
    /// Horizontal rule: `---`.
    HorizontalRule,
    /// HTML comment with page number: `<!-- page N -->`.
    Comment,
    /// Custom string inserted between pages.
    Custom(String),
}

impl PageSeparator {
    /// The marker line placed before page `page_num` (1-indexed), if any.
    pub fn marker(&self, page_num: usize) -> Option<String> {
        match self {
            PageSeparator::Marker => Some(format!("--- Page {page_num} ---")),
            PageSeparator::None => None,
            PageSeparator::HorizontalRule => Some("---".to_string()),
            PageSeparator::Comment => Some(format!("<!-- page {page_num} -->")),
            PageSeparator::Custom(s) => Some(s.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reader_contract() {
        let o = ReadOptions::default();
        assert!(o.show_images);
        assert!(o.caption_model.is_none());
        assert_eq!(o.caption_prompt(), DEFAULT_CAPTION_PROMPT);
        assert_eq!(o.layout.single_cell_row_ratio, 0.5);
        assert_eq!(o.page_separator, PageSeparator::Marker);
    }

    #[test]
    fn custom_prompt_overrides_default() {
        let o = ReadOptions::builder()
            .prompt("Transcribe the chart")
            .build()
            .expect("valid");
        assert_eq!(o.caption_prompt(), "Transcribe the chart");
    }

    #[test]
    fn builder_rejects_bad_ratio() {
        let err = ReadOptions::builder()
            .layout(LayoutConfig {
                single_cell_row_ratio: 1.5,
                ..LayoutConfig::default()
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, ReadError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_negative_or_nan_tolerance() {
        for tol in [-1.0, f32::NAN] {
            let err = ReadOptions::builder()
                .layout(LayoutConfig {
                    line_tolerance: Some(tol),
                    ..LayoutConfig::default()
                })
                .build()
                .unwrap_err();
            assert!(matches!(err, ReadError::InvalidConfig(_)), "tolerance {tol}");
        }
    }

    #[test]
    fn max_rendered_pixels_has_floor() {
        let o = ReadOptions::builder()
            .max_rendered_pixels(10)
            .build()
            .expect("valid");
        assert_eq!(o.max_rendered_pixels, 100);
    }

    #[test]
    fn page_selection_to_indices() {
        assert_eq!(PageSelection::All.to_indices(5), vec![0, 1, 2, 3, 4]);
        assert_eq!(PageSelection::Single(3).to_indices(5), vec![2]);
        assert_eq!(PageSelection::Single(6).to_indices(5), Vec::<usize>::new());
        assert_eq!(PageSelection::Range(2, 4).to_indices(5), vec![1, 2, 3]);
        assert_eq!(
            PageSelection::Set(vec![3, 1, 3]).to_indices(5),
            vec![0, 2] // deduplicated and sorted
        );
    }

    #[test]
    fn separator_markers() {
        assert_eq!(
            PageSeparator::Marker.marker(4).as_deref(),
            Some("--- Page 4 ---")
        );
        assert_eq!(PageSeparator::None.marker(4), None);
        assert_eq!(
            PageSeparator::Comment.marker(2).as_deref(),
            Some("<!-- page 2 -->")
        );
        assert_eq!(
            PageSeparator::Custom("***".into()).marker(9).as_deref(),
            Some("***")
        );
    }
}
