//! Sections delimited by Markdown ATX headers.

use super::{Splitter, SplitterOutput};
use crate::error::SplitError;
use crate::output::ReaderOutput;
use serde_json::json;
use tracing::{debug, warn};

/// Splits Markdown at the configured header levels.
///
/// Each chunk starts with the header line that opens it and runs up to the
/// next configured header, whatever its level. Text before the first header
/// is a chunk of its own. Headers of other levels stay inside the chunk, and
/// nothing inside a fenced code block is taken for a header.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderSplitter {
    /// `(marker, name)` pairs such as `("##", "Header 2")`.
    headers: Vec<(String, String)>,
    /// Bit `n` is set when level `n` splits.
    levels: u8,
}

impl Default for HeaderSplitter {
    fn default() -> Self {
        let headers = (1..=3)
            .map(|n| ("#".repeat(n), format!("Header {n}")))
            .collect();
        Self {
            headers,
            levels: 0b1110,
        }
    }
}

impl HeaderSplitter {
    /// `headers` lists the levels to split on as `(marker, name)`, where the
    /// marker is one to six `#`.
    pub fn new<M, N>(headers: impl IntoIterator<Item = (M, N)>) -> Result<Self, SplitError>
    where
        M: Into<String>,
        N: Into<String>,
    {
        let headers: Vec<(String, String)> = headers
            .into_iter()
            .map(|(m, n)| (m.into(), n.into()))
            .collect();
        if headers.is_empty() {
            return Err(SplitError::InvalidConfig(
                "at least one header level is required".into(),
            ));
        }

        let mut levels = 0u8;
        for (marker, _) in &headers {
            let depth = marker.len();
            if !(1..=6).contains(&depth) || !marker.chars().all(|c| c == '#') {
                return Err(SplitError::InvalidConfig(format!(
                    "header marker must be one to six '#', got '{marker}'"
                )));
            }
            levels |= 1 << depth;
        }
        Ok(Self { headers, levels })
    }

    /// Split on the given levels (1 for `#` through 6 for `######`).
    pub fn with_levels(levels: impl IntoIterator<Item = usize>) -> Result<Self, SplitError> {
        let mut headers = Vec::new();
        for n in levels {
            if !(1..=6).contains(&n) {
                return Err(SplitError::InvalidConfig(format!(
                    "header level must be between 1 and 6, got {n}"
                )));
            }
            headers.push(("#".repeat(n), format!("Header {n}")));
        }
        Self::new(headers)
    }

    /// The raw sections, trimmed. Blank sections are dropped.
    pub fn chunks(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut fence: Option<&str> = None;

        for line in text.lines() {
            let trimmed = line.trim_start();
            match fence {
                Some(open) => {
                    if trimmed.starts_with(open) {
                        fence = None;
                    }
                }
                None if trimmed.starts_with("```") => fence = Some("```"),
                None if trimmed.starts_with("~~~") => fence = Some("~~~"),
                None => {
                    if self.splits_at(line) {
                        push_section(&mut chunks, &current);
                        current.clear();
                    }
                }
            }
            current.push(line);
        }
        push_section(&mut chunks, &current);

        debug!("Header split produced {} sections", chunks.len());
        chunks
    }

    fn splits_at(&self, line: &str) -> bool {
        atx_level(line).is_some_and(|level| self.levels & (1 << level) != 0)
    }

    fn params(&self) -> serde_json::Value {
        json!({ "headers_to_split_on": self.headers })
    }
}

/// Level of an ATX header line: up to three spaces of indent, one to six
/// `#`, then whitespace or the end of the line.
fn atx_level(line: &str) -> Option<usize> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let depth = rest.len() - rest.trim_start_matches('#').len();
    if !(1..=6).contains(&depth) {
        return None;
    }
    match rest[depth..].chars().next() {
        None => Some(depth),
        Some(c) if c.is_whitespace() => Some(depth),
        Some(_) => None,
    }
}

fn push_section(chunks: &mut Vec<String>, lines: &[&str]) {
    let section = lines.join("\n");
    let section = section.trim();
    if !section.is_empty() {
        chunks.push(section.to_string());
    }
}

impl Splitter for HeaderSplitter {
    fn name(&self) -> &'static str {
        "header_splitter"
    }

    fn split(&self, reader_output: &ReaderOutput) -> Result<SplitterOutput, SplitError> {
        let text = &reader_output.text;
        if text.trim().is_empty() {
            warn!("Reader text is empty or whitespace-only; producing no chunks");
        }
        SplitterOutput::from_chunks(self.chunks(text), reader_output, self.name(), self.params())
    }
}
