//! Output types: the reader record, per-page results and document metadata.

use crate::error::ReadError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// `conversion_method` of every document this crate reads.
pub const CONVERSION_METHOD: &str = "markdown";
/// `reader_method` of every document this crate reads.
pub const READER_METHOD: &str = "pdfium";

/// The record produced by a read, consumed by the splitters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReaderOutput {
    /// The assembled markdown.
    pub text: String,
    /// File name of the input, e.g. `report.pdf`.
    pub document_name: Option<String>,
    /// The input as given: a local path or a URL.
    pub document_path: String,
    /// Random v4 UUID assigned per read.
    pub document_id: String,
    pub conversion_method: Option<String>,
    pub reader_method: Option<String>,
    /// Name of the caption model, when one was used.
    pub ocr_method: Option<String>,
    /// Number of pages in the document (not just the selected ones).
    pub page_count: usize,
    #[serde(default)]
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub pages: Vec<PageResult>,
    #[serde(default)]
    pub stats: ReadStats,
}

impl ReaderOutput {
    /// A record around plain text, e.g. for splitting text read elsewhere.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            document_name: None,
            document_path: String::new(),
            document_id: new_document_id(),
            conversion_method: None,
            reader_method: None,
            ocr_method: None,
            page_count: 0,
            metadata: DocumentMetadata::default(),
            pages: Vec::new(),
            stats: ReadStats::default(),
        }
    }

    /// Serialise to pretty JSON.
    pub fn to_json(&self) -> Result<String, ReadError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ReadError::Internal(format!("JSON serialisation failed: {e}")))
    }
}

/// A fresh random document identifier.
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Last path component of a path or URL.
pub fn document_name(input: &str) -> Option<String> {
    let trimmed = input.split(['?', '#']).next().unwrap_or(input);
    Path::new(trimmed)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
}

/// Result of reading one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number.
    pub page_num: usize,
    pub markdown: String,
    pub text_blocks: usize,
    pub table_blocks: usize,
    pub image_blocks: usize,
    pub duration_ms: u64,
}

/// Read statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadStats {
    /// Pages in the document.
    pub total_pages: usize,
    /// Pages selected and read.
    pub processed_pages: usize,
    /// Selected pages with no content at all.
    pub empty_pages: usize,
    pub tables: usize,
    pub images: usize,
    /// Images replaced by a model caption.
    pub captioned_images: usize,
    pub extraction_duration_ms: u64,
    pub layout_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Document metadata from the PDF info dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

impl DocumentMetadata {
    /// YAML front matter with the non-empty fields.
    pub fn to_front_matter(&self) -> String {
        let mut fm = String::from("---\n");
        let fields = [
            ("title", &self.title),
            ("author", &self.author),
            ("subject", &self.subject),
            ("creator", &self.creator),
            ("producer", &self.producer),
            ("created", &self.creation_date),
            ("modified", &self.modification_date),
        ];
        for (key, value) in fields {
            if let Some(v) = value {
                fm.push_str(&format!("{}: \"{}\"\n", key, v.replace('"', "\\\"")));
            }
        }
        fm.push_str(&format!("pages: {}\n", self.page_count));
        fm.push_str("---\n\n");
        fm
    }
}
