//! Block sequencing: merge classified blocks into reading order and render.

use super::block::{Block, BlockContent};
use super::image::image_to_markdown;
use super::table::table_to_markdown;
use crate::config::PageSeparator;

/// Render blocks as markdown in reading order, with the default
/// `--- Page N ---` marker between pages.
pub fn blocks_to_markdown(blocks: &[Block], show_images: bool) -> String {
    blocks_to_markdown_with(blocks, show_images, &PageSeparator::default())
}

/// Render blocks as markdown in reading order.
///
/// Blocks are sorted by `(page, top)`; text, tables and images interleave as
/// they sat on the page and are never grouped by kind. Remaining ties break
/// on `bottom`, kind and rendered text, so any permutation of the same blocks
/// renders identically. Fragments are separated by a blank line and
/// `separator` is inserted whenever the page changes.
pub fn blocks_to_markdown_with(
    blocks: &[Block],
    show_images: bool,
    separator: &PageSeparator,
) -> String {
    let mut rendered: Vec<(&Block, String)> = blocks
        .iter()
        .map(|b| (b, block_to_markdown(b, show_images)))
        .filter(|(_, fragment)| !fragment.is_empty())
        .collect();
    rendered.sort_by(|(a, fa), (b, fb)| a.reading_order(b).then_with(|| fa.cmp(fb)));

    let mut pages: Vec<(usize, String)> = Vec::new();
    for (block, fragment) in rendered {
        match pages.last_mut() {
            Some((page, text)) if *page == block.page => {
                text.push_str("\n\n");
                text.push_str(&fragment);
            }
            _ => pages.push((block.page, fragment)),
        }
    }

    join_pages(&pages, separator)
}

/// Markdown fragment for a single block.
pub fn block_to_markdown(block: &Block, show_images: bool) -> String {
    match &block.content {
        BlockContent::Text(text) => text.trim().to_string(),
        BlockContent::Table(cells) => table_to_markdown(cells),
        BlockContent::Image(image) => image_to_markdown(image, show_images),
    }
}

/// Join per-page markdown, inserting the separator before every page but the
/// first. Pages with no content are skipped entirely.
pub fn join_pages(pages: &[(usize, String)], separator: &PageSeparator) -> String {
    let mut out = String::new();
    for (page, markdown) in pages.iter().filter(|(_, md)| !md.trim().is_empty()) {
        if !out.is_empty() {
            out.push_str("\n\n");
            if let Some(marker) = separator.marker(*page) {
                out.push_str(&marker);
                out.push_str("\n\n");
            }
        }
        out.push_str(markdown);
    }
    out
}
