//! Prompts sent to the caption model.
//!
//! Callers can override the default via [`crate::config::ReadOptions::prompt`];
//! the constants here are used only when no override is provided.

/// Default prompt sent with every cropped image.
///
/// The caption is inserted inline as a single italic line, so the model is
/// asked for one short paragraph with no markdown of its own.
pub const DEFAULT_CAPTION_PROMPT: &str = r#"You are given an image cropped from a PDF page.

Write a concise caption for it:
- If it is a chart or diagram, state what it shows and any key values or labels.
- If it contains text, transcribe the text faithfully.
- If it is a photo or illustration, describe its subject in one or two sentences.

Output ONLY the caption as plain text on a single paragraph.
Do NOT use markdown, headings, bullet points or code fences.
Do NOT start with phrases like "This image shows"."#;

/// System message framing every caption request.
pub const CAPTION_SYSTEM_PROMPT: &str =
    "You caption images extracted from documents for a text-only search index.";
