//! Line grouping: words → lines → paragraphs.

use super::block::{Line, PositionedWord};
use crate::config::LayoutConfig;

/// Floor for the automatic line tolerance, so zero-height glyph boxes
/// (common for spaces and some Type3 fonts) still cluster.
const MIN_LINE_TOLERANCE: f32 = 1.0;

/// Cluster words into text lines, top to bottom.
///
/// Words are visited in `(top, x0)` order. A word joins the open line when its
/// `top` is within the tolerance of the line's `top`; otherwise the line is
/// closed and a new one starts. Each line's words are joined left to right
/// with single spaces.
///
/// Returned lines never overlap vertically: a line whose span starts above
/// the previous line's bottom is clipped to begin there.
pub fn group_by_lines(words: &[PositionedWord], config: &LayoutConfig) -> Vec<Line> {
    let mut sorted: Vec<&PositionedWord> = words
        .iter()
        .filter(|w| !w.text.trim().is_empty())
        .collect();
    sorted.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x0.total_cmp(&b.x0)));

    let mut lines: Vec<Line> = Vec::new();
    let mut current: Vec<&PositionedWord> = Vec::new();
    let mut top = 0.0_f32;
    let mut bottom = 0.0_f32;

    for word in sorted {
        if !current.is_empty() {
            let tolerance = config
                .line_tolerance
                .unwrap_or_else(|| ((bottom - top) / 2.0).max(MIN_LINE_TOLERANCE));
            if word.top - top <= tolerance {
                bottom = bottom.max(word.bottom);
                current.push(word);
                continue;
            }
            let line = close_line(&mut current, top, bottom, lines.last());
            lines.push(line);
        }
        top = word.top;
        bottom = word.bottom.max(word.top);
        current.push(word);
    }

    if !current.is_empty() {
        let line = close_line(&mut current, top, bottom, lines.last());
        lines.push(line);
    }

    lines
}

fn close_line(
    words: &mut Vec<&PositionedWord>,
    top: f32,
    bottom: f32,
    previous: Option<&Line>,
) -> Line {
    words.sort_by(|a, b| a.x0.total_cmp(&b.x0));
    let content = words
        .iter()
        .map(|w| w.text.trim())
        .collect::<Vec<_>>()
        .join(" ");
    words.clear();

    let top = previous.map_or(top, |p| top.max(p.bottom));
    Line {
        content,
        top,
        bottom: bottom.max(top),
    }
}

/// Merge consecutive lines into paragraph-level text blocks.
///
/// Two lines belong to the same paragraph when the gap between them is at
/// most `paragraph_gap_ratio` times the upper line's height and no position in
/// `breaks` (the tops of table and image blocks) falls between them. A ratio
/// of zero or less disables merging.
pub fn group_into_paragraphs(lines: Vec<Line>, breaks: &[f32], config: &LayoutConfig) -> Vec<Line> {
    let ratio = config.paragraph_gap_ratio;
    let mut paragraphs: Vec<Line> = Vec::with_capacity(lines.len());
    let mut last_line: Option<Line> = None;

    for line in lines {
        let merge = match (&last_line, paragraphs.last()) {
            (Some(prev), Some(_)) if ratio > 0.0 => {
                let gap = line.top - prev.bottom;
                let interrupted = breaks.iter().any(|&b| b > prev.top && b <= line.top);
                !interrupted && gap <= ratio * prev.height().max(MIN_LINE_TOLERANCE)
            }
            _ => false,
        };

        if merge {
            if let Some(paragraph) = paragraphs.last_mut() {
                join_paragraph_text(&mut paragraph.content, &line.content);
                paragraph.bottom = paragraph.bottom.max(line.bottom);
            }
        } else {
            paragraphs.push(line.clone());
        }
        last_line = Some(line);
    }

    paragraphs
}

/// Append `next` to a paragraph. A line ending in a hyphen runs straight
/// into a lowercase continuation with the hyphen kept (`well-` + `known` →
/// `well-known`); the text alone cannot tell a compound from a soft break.
fn join_paragraph_text(paragraph: &mut String, next: &str) {
    let continues_word = paragraph.ends_with('-')
        && !paragraph.ends_with("--")
        && next.chars().next().is_some_and(|c| c.is_lowercase());
    if !continues_word {
        paragraph.push(' ');
    }
    paragraph.push_str(next);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, top: f32, bottom: f32, x0: f32) -> PositionedWord {
        PositionedWord::new(text, top, bottom, x0)
    }

    fn line(content: &str, top: f32, bottom: f32) -> Line {
        Line {
            content: content.into(),
            top,
            bottom,
        }
    }

    #[test]
    fn groups_two_lines() {
        let words = vec![
            word("Hello", 10.0, 18.0, 50.0),
            word("world", 10.1, 18.1, 80.0),
            word("This", 35.0, 45.0, 50.0),
            word("is", 35.2, 45.2, 80.0),
        ];
        let lines = group_by_lines(&words, &LayoutConfig::default());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].content, "Hello world");
        assert_eq!(lines[1].content, "This is");
    }

    #[test]
    fn empty_input_gives_no_lines() {
        assert!(group_by_lines(&[], &LayoutConfig::default()).is_empty());
    }

    #[test]
    fn words_are_ordered_by_x0_within_a_line() {
        let words = vec![
            word("right", 10.0, 18.0, 200.0),
            word("left", 10.2, 18.0, 20.0),
            word("middle", 10.1, 18.0, 100.0),
        ];
        let lines = group_by_lines(&words, &LayoutConfig::default());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].content, "left middle right");
    }

    #[test]
    fn unsorted_input_is_sorted_by_top() {
        let words = vec![
            word("second", 40.0, 48.0, 10.0),
            word("first", 10.0, 18.0, 10.0),
        ];
        let lines = group_by_lines(&words, &LayoutConfig::default());
        assert_eq!(lines[0].content, "first");
        assert_eq!(lines[1].content, "second");
    }

    #[test]
    fn lines_never_overlap() {
        // The tall second word starts inside the first line's span but
        // outside its tolerance.
        let words = vec![
            word("a", 10.0, 20.0, 10.0),
            word("b", 16.0, 40.0, 30.0),
            word("c", 30.0, 36.0, 10.0),
            word("d", 90.0, 96.0, 10.0),
        ];
        let lines = group_by_lines(&words, &LayoutConfig::default());
        for pair in lines.windows(2) {
            assert!(pair[0].top <= pair[1].top);
            assert!(pair[0].bottom <= pair[1].top, "{:?}", pair);
        }
        for l in &lines {
            assert!(l.top <= l.bottom);
        }
    }

    #[test]
    fn explicit_tolerance_overrides_line_height() {
        let words = vec![word("a", 10.0, 18.0, 10.0), word("b", 13.0, 21.0, 30.0)];
        let tight = LayoutConfig {
            line_tolerance: Some(1.0),
            ..LayoutConfig::default()
        };
        assert_eq!(group_by_lines(&words, &tight).len(), 2);
        assert_eq!(group_by_lines(&words, &LayoutConfig::default()).len(), 1);
    }

    #[test]
    fn blank_words_are_ignored() {
        let words = vec![word("  ", 10.0, 18.0, 10.0), word("x", 30.0, 38.0, 10.0)];
        let lines = group_by_lines(&words, &LayoutConfig::default());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].content, "x");
    }

    #[test]
    fn close_lines_merge_into_paragraph() {
        let lines = vec![
            line("The quick brown", 10.0, 20.0),
            line("fox jumps.", 22.0, 32.0),
            line("New paragraph", 60.0, 70.0),
        ];
        let paragraphs = group_into_paragraphs(lines, &[], &LayoutConfig::default());
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].content, "The quick brown fox jumps.");
        assert_eq!(paragraphs[0].top, 10.0);
        assert_eq!(paragraphs[0].bottom, 32.0);
        assert_eq!(paragraphs[1].content, "New paragraph");
    }

    #[test]
    fn break_between_lines_splits_paragraph() {
        let lines = vec![line("above", 10.0, 20.0), line("below", 22.0, 32.0)];
        let paragraphs = group_into_paragraphs(lines, &[21.0], &LayoutConfig::default());
        assert_eq!(paragraphs.len(), 2);
    }

    #[test]
    fn zero_ratio_keeps_lines_separate() {
        let lines = vec![line("one", 10.0, 20.0), line("two", 21.0, 31.0)];
        let config = LayoutConfig {
            paragraph_gap_ratio: 0.0,
            ..LayoutConfig::default()
        };
        assert_eq!(group_into_paragraphs(lines, &[], &config).len(), 2);
    }

    #[test]
    fn hyphen_at_line_end_is_kept() {
        let lines = vec![line("a well-", 10.0, 20.0), line("known result", 21.0, 31.0)];
        let paragraphs = group_into_paragraphs(lines, &[], &LayoutConfig::default());
        assert_eq!(paragraphs[0].content, "a well-known result");
    }

    #[test]
    fn dash_before_capital_keeps_the_space() {
        let lines = vec![line("see -", 10.0, 20.0), line("Section 2", 21.0, 31.0)];
        let paragraphs = group_into_paragraphs(lines, &[], &LayoutConfig::default());
        assert_eq!(paragraphs[0].content, "see - Section 2");
    }
}
