//! Fixed-size character windows.

use super::{ChunkOverlap, Splitter, SplitterOutput};
use crate::error::SplitError;
use crate::output::ReaderOutput;
use serde_json::json;
use tracing::warn;

/// Splits text into windows of `chunk_size` characters.
///
/// Consecutive windows start `max(1, chunk_size - overlap)` characters apart,
/// so each shares `overlap` characters with the previous one. Characters are
/// Unicode scalar values, never bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterSplitter {
    chunk_size: usize,
    overlap: ChunkOverlap,
}

impl Default for CharacterSplitter {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: ChunkOverlap::Count(0),
        }
    }
}

impl CharacterSplitter {
    pub fn new(chunk_size: usize, overlap: ChunkOverlap) -> Result<Self, SplitError> {
        overlap.validate(chunk_size)?;
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> ChunkOverlap {
        self.overlap
    }

    /// The raw windows, without ids or document fields.
    pub fn chunks(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return vec![String::new()];
        }
        let step = self.overlap.step(self.chunk_size);
        (0..chars.len())
            .step_by(step)
            .map(|start| {
                let end = (start + self.chunk_size).min(chars.len());
                chars[start..end].iter().collect()
            })
            .collect()
    }
}

impl Splitter for CharacterSplitter {
    fn name(&self) -> &'static str {
        "character_splitter"
    }

    fn split(&self, reader_output: &ReaderOutput) -> Result<SplitterOutput, SplitError> {
        let text = &reader_output.text;
        if text.trim().is_empty() {
            warn!("Reader text is empty or whitespace-only; producing a single chunk");
        }

        let chunks = self.chunks(text);
        if !text.is_empty() && chunks.iter().all(|c| c.is_empty()) {
            return Err(SplitError::InvalidChunk(
                "all produced chunks are empty for non-empty text".into(),
            ));
        }

        SplitterOutput::from_chunks(
            chunks,
            reader_output,
            self.name(),
            json!({
                "chunk_size": self.chunk_size,
                "chunk_overlap": self.overlap,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(text: &str) -> ReaderOutput {
        let mut out = ReaderOutput::from_text(text);
        out.document_name = Some("doc.txt".into());
        out.document_path = "/path/doc.txt".into();
        out
    }

    #[test]
    fn alphabet_with_overlap() {
        let s = CharacterSplitter::new(5, ChunkOverlap::Count(2)).unwrap();
        let chunks = s.chunks("abcdefghijklmnopqrstuvwxyz");
        assert_eq!(&chunks[..3], &["abcde", "defgh", "ghijk"]);
        assert_eq!(chunks.last().map(String::as_str), Some("yz"));
    }

    #[test]
    fn fractional_overlap() {
        let s = CharacterSplitter::new(10, ChunkOverlap::Fraction(0.2)).unwrap();
        let chunks = s.chunks("Hello world! This is a test text for splitting.");
        assert_eq!(&chunks[..3], &["Hello worl", "rld! This ", "s is a tes"]);
    }

    #[test]
    fn no_overlap_partitions_text() {
        let s = CharacterSplitter::new(4, ChunkOverlap::default()).unwrap();
        let chunks = s.chunks("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
        assert_eq!(chunks.concat(), "abcdefghij");
    }

    #[test]
    fn empty_text_yields_one_empty_chunk() {
        let s = CharacterSplitter::new(5, ChunkOverlap::default()).unwrap();
        let out = s.split(&reader("")).unwrap();
        assert_eq!(out.chunks, vec![String::new()]);
        assert_eq!(out.chunk_id.len(), 1);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let s = CharacterSplitter::new(2, ChunkOverlap::default()).unwrap();
        assert_eq!(s.chunks("éàüö"), vec!["éà", "üö"]);
    }

    #[test]
    fn overlap_not_smaller_than_size_is_rejected() {
        assert!(matches!(
            CharacterSplitter::new(3, ChunkOverlap::Count(3)),
            Err(SplitError::InvalidConfig(_))
        ));
        assert!(CharacterSplitter::new(0, ChunkOverlap::default()).is_err());
    }

    #[test]
    fn output_carries_document_fields() {
        let s = CharacterSplitter::new(5, ChunkOverlap::Count(1)).unwrap();
        let input = reader("abcdefghij");
        let out = s.split(&input).unwrap();
        assert_eq!(out.split_method, "character_splitter");
        assert_eq!(out.split_params["chunk_size"], 5);
        assert_eq!(out.split_params["chunk_overlap"], 1);
        assert_eq!(out.document_name.as_deref(), Some("doc.txt"));
        assert_eq!(out.document_path, "/path/doc.txt");
        assert_eq!(out.document_id.as_deref(), Some(input.document_id.as_str()));
        assert_eq!(out.chunk_id.len(), out.chunks.len());
        let mut ids = out.chunk_id.clone();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), out.chunks.len());
    }
}
