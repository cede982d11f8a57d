//! Per-page assembly: primitives → classified blocks → markdown.

use super::block::{BBox, Block, PageContent, PositionedWord};
use super::image::{ImageHandler, RegionCropper};
use super::lines::{group_by_lines, group_into_paragraphs};
use super::sequence::blocks_to_markdown_with;
use super::table::is_real_table;
use crate::config::ReadOptions;
use crate::error::BlockError;
use tracing::debug;

/// Classify one page's primitives into blocks, sorted in reading order.
///
/// Tables that pass [`is_real_table`] become table blocks and swallow the
/// words inside their bounding box; rejected tables fall back to prose.
/// Images are resolved through [`ImageHandler`], in the order the page
/// reported them. The remaining words are grouped into lines and then
/// paragraphs, never merging across a table or image.
pub async fn build_page_blocks(
    content: &PageContent,
    cropper: &dyn RegionCropper,
    options: &ReadOptions,
) -> Result<Vec<Block>, BlockError> {
    let page = content.page;
    let layout = &options.layout;
    let mut blocks: Vec<Block> = Vec::new();

    // ── Tables ───────────────────────────────────────────────────────────
    let mut table_regions: Vec<BBox> = Vec::new();
    for table in &content.tables {
        if is_real_table(&table.cells, layout.single_cell_row_ratio) {
            table_regions.push(table.bbox);
            blocks.push(Block::table(
                page,
                table.bbox.top,
                table.bbox.bottom,
                table.cells.clone(),
            ));
        } else {
            debug!(
                "Page {}: rejected {}-row table at top={:.1}",
                page,
                table.cells.len(),
                table.bbox.top
            );
        }
    }

    // ── Images ───────────────────────────────────────────────────────────
    let handler = ImageHandler::new(
        options.show_images,
        options.caption_model.as_deref(),
        options.caption_prompt(),
    );
    for (index, image) in content.images.iter().enumerate() {
        let resolved = handler.handle(page, index, image, cropper).await?;
        blocks.push(Block::image(page, image.top, image.bottom, resolved));
    }

    // ── Prose ────────────────────────────────────────────────────────────
    let prose: Vec<PositionedWord> = content
        .words
        .iter()
        .filter(|w| !table_regions.iter().any(|r| r.contains_word(w)))
        .cloned()
        .collect();
    let breaks: Vec<f32> = blocks.iter().map(|b| b.top).collect();
    let lines = group_by_lines(&prose, layout);
    for paragraph in group_into_paragraphs(lines, &breaks, layout) {
        blocks.push(Block::text(
            page,
            paragraph.top,
            paragraph.bottom,
            paragraph.content,
        ));
    }

    blocks.sort_by(|a, b| a.reading_order(b));
    debug!(
        "Page {}: {} blocks ({} tables, {} images)",
        page,
        blocks.len(),
        table_regions.len(),
        content.images.len()
    );
    Ok(blocks)
}

/// Render one page's primitives to markdown.
pub async fn render_page_to_markdown(
    content: &PageContent,
    cropper: &dyn RegionCropper,
    options: &ReadOptions,
) -> Result<String, BlockError> {
    let blocks = build_page_blocks(content, cropper, options).await?;
    Ok(blocks_to_markdown_with(
        &blocks,
        options.show_images,
        &options.page_separator,
    ))
}
