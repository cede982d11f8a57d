//! Post-processing: deterministic cleanup of caption-model output.
//!
//! A caption is inserted inline as `*<caption>*`, so whatever the model
//! returns must collapse into one plain line. Even well-prompted models
//! occasionally wrap their answer in ` ```text ` fences, emit CRLF line
//! endings, sprinkle zero-width characters, invent `![alt](image.png)` links
//! or wrap the whole answer in emphasis markers of their own.
//!
//! ## Rule Order
//!
//! Fences are stripped before line endings are normalised so the fence
//! regex sees the raw answer; image links are rewritten before whitespace is
//! collapsed so their alt text survives as ordinary words.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all caption rules to raw model output.
///
/// Rules (applied in order):
/// 1. Strip outer code fences
/// 2. Normalise line endings (CRLF → LF)
/// 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, etc.)
/// 4. Replace image links with their alt text
/// 5. Collapse all whitespace runs into single spaces
/// 6. Drop a leading `Caption:` label and wrapping emphasis markers
pub fn clean_caption(input: &str) -> String {
    let s = strip_code_fences(input);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    let s = unwrap_image_links(&s);
    let s = collapse_whitespace(&s);
    strip_label_and_emphasis(&s)
}

/// Ensure a document ends with exactly one newline.
pub fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}\n", trimmed)
    }
}

// ── Rule 1: Strip outer code fences ──────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*\r?\n(.*)\r?\n```\s*$").expect("valid regex"));

fn strip_code_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 4: Replace image links with alt text ────────────────────────────────

static RE_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]*)\)").expect("valid regex"));

fn unwrap_image_links(input: &str) -> String {
    RE_IMAGE
        .replace_all(input, |caps: &regex::Captures<'_>| caps[1].trim().to_string())
        .to_string()
}

// ── Rule 5: Collapse whitespace ─────────────────────────────────────────────

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Rule 6: Drop label and wrapping emphasis ─────────────────────────────────

static RE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:image\s+)?caption\s*:\s*").expect("valid regex"));

fn strip_label_and_emphasis(input: &str) -> String {
    let mut s = RE_LABEL.replace(input, "").to_string();
    for marker in ["**", "__", "*", "_"] {
        if s.len() > 2 * marker.len() && s.starts_with(marker) && s.ends_with(marker) {
            s = s[marker.len()..s.len() - marker.len()].trim().to_string();
            break;
        }
    }
    s
}

// ── Tests ────────────────────────────────────────────────────────────────────
