//! Chunking of a read document for retrieval pipelines.
//!
//! A [`Splitter`] turns a [`ReaderOutput`] into a [`SplitterOutput`]: the
//! chunks, one random id per chunk, the document fields carried over from
//! the reader, and the parameters the split was made with.

mod character;
mod header;
mod word;

pub use character::CharacterSplitter;
pub use header::HeaderSplitter;
pub use word::WordSplitter;

use crate::error::SplitError;
use crate::output::ReaderOutput;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Splits a read document into chunks.
pub trait Splitter {
    /// Identifier recorded as `split_method`, e.g. `character_splitter`.
    fn name(&self) -> &'static str;

    fn split(&self, reader_output: &ReaderOutput) -> Result<SplitterOutput, SplitError>;
}

/// Overlap between consecutive chunks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChunkOverlap {
    /// Absolute number of units (characters or words).
    Count(usize),
    /// Fraction of the chunk size, in `[0.0, 1.0)`.
    Fraction(f32),
}

impl Default for ChunkOverlap {
    fn default() -> Self {
        ChunkOverlap::Count(0)
    }
}

impl fmt::Display for ChunkOverlap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkOverlap::Count(n) => write!(f, "{n}"),
            ChunkOverlap::Fraction(x) => write!(f, "{x}"),
        }
    }
}

impl std::str::FromStr for ChunkOverlap {
    type Err = SplitError;

    /// `"3"` is a count, `"0.25"` a fraction.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(n) = s.parse::<usize>() {
            return Ok(ChunkOverlap::Count(n));
        }
        s.parse::<f32>()
            .map(ChunkOverlap::Fraction)
            .map_err(|_| SplitError::InvalidConfig(format!("invalid chunk overlap '{s}'")))
    }
}

impl ChunkOverlap {
    /// Check the overlap against a chunk size.
    pub fn validate(&self, chunk_size: usize) -> Result<(), SplitError> {
        if chunk_size < 1 {
            return Err(SplitError::InvalidConfig(
                "chunk_size must be >= 1".into(),
            ));
        }
        match *self {
            ChunkOverlap::Count(n) if n >= chunk_size => Err(SplitError::InvalidConfig(format!(
                "chunk_overlap ({n}) must be smaller than chunk_size ({chunk_size})"
            ))),
            ChunkOverlap::Fraction(x) if !(0.0..1.0).contains(&x) => Err(
                SplitError::InvalidConfig(format!("chunk_overlap fraction must be in [0.0, 1.0), got {x}")),
            ),
            _ => Ok(()),
        }
    }

    /// The overlap in units for a given chunk size.
    pub fn resolve(&self, chunk_size: usize) -> usize {
        match *self {
            ChunkOverlap::Count(n) => n,
            ChunkOverlap::Fraction(x) => (chunk_size as f32 * x) as usize,
        }
    }

    /// Distance between the starts of consecutive chunks, at least 1.
    pub fn step(&self, chunk_size: usize) -> usize {
        chunk_size.saturating_sub(self.resolve(chunk_size)).max(1)
    }
}

/// The record produced by a splitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitterOutput {
    pub chunks: Vec<String>,
    /// One random v4 UUID per chunk.
    pub chunk_id: Vec<String>,
    pub document_name: Option<String>,
    pub document_path: String,
    pub document_id: Option<String>,
    pub conversion_method: Option<String>,
    pub reader_method: Option<String>,
    pub ocr_method: Option<String>,
    pub split_method: String,
    pub split_params: serde_json::Value,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl SplitterOutput {
    /// Build the output for `chunks`, copying document fields from the reader.
    pub(crate) fn from_chunks(
        chunks: Vec<String>,
        reader_output: &ReaderOutput,
        split_method: &str,
        split_params: serde_json::Value,
    ) -> Result<Self, SplitError> {
        if chunks.is_empty() && !reader_output.text.trim().is_empty() {
            return Err(SplitError::InvalidChunk(
                "no chunks were produced for non-empty text".into(),
            ));
        }
        let chunk_id = chunks
            .iter()
            .map(|_| uuid::Uuid::new_v4().to_string())
            .collect();
        Ok(Self {
            chunks,
            chunk_id,
            document_name: reader_output.document_name.clone(),
            document_path: reader_output.document_path.clone(),
            document_id: Some(reader_output.document_id.clone()),
            conversion_method: reader_output.conversion_method.clone(),
            reader_method: reader_output.reader_method.clone(),
            ocr_method: reader_output.ocr_method.clone(),
            split_method: split_method.to_string(),
            split_params,
            metadata: serde_json::Map::new(),
        })
    }
}
