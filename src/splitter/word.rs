//! Fixed-size word windows.

use super::{ChunkOverlap, Splitter, SplitterOutput};
use crate::error::SplitError;
use crate::output::ReaderOutput;
use serde_json::json;
use tracing::warn;

/// Splits text on whitespace into windows of `chunk_size` words, rejoined
/// with single spaces.
#[derive(Debug, Clone, PartialEq)]
pub struct WordSplitter {
    chunk_size: usize,
    overlap: ChunkOverlap,
}

impl Default for WordSplitter {
    fn default() -> Self {
        Self {
            chunk_size: 5,
            overlap: ChunkOverlap::Count(0),
        }
    }
}

impl WordSplitter {
    pub fn new(chunk_size: usize, overlap: ChunkOverlap) -> Result<Self, SplitError> {
        overlap.validate(chunk_size)?;
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// The raw windows. Text without words yields no chunks.
    pub fn chunks(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let step = self.overlap.step(self.chunk_size);
        (0..words.len())
            .step_by(step)
            .map(|start| {
                let end = (start + self.chunk_size).min(words.len());
                words[start..end].join(" ")
            })
            .collect()
    }

    fn params(&self) -> serde_json::Value {
        json!({
            "chunk_size": self.chunk_size,
            "chunk_overlap": self.overlap,
        })
    }
}

impl Splitter for WordSplitter {
    fn name(&self) -> &'static str {
        "word_splitter"
    }

    fn split(&self, reader_output: &ReaderOutput) -> Result<SplitterOutput, SplitError> {
        let text = &reader_output.text;
        if text.trim().is_empty() {
            warn!("Reader text is empty or whitespace-only; producing no chunks");
        }
        SplitterOutput::from_chunks(self.chunks(text), reader_output, self.name(), self.params())
    }
}
