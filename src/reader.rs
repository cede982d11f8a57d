//! Document-level read entry points.
//!
//! [`read`] resolves the input, extracts page primitives through pdfium,
//! builds and renders each selected page's blocks in page order, and joins
//! the pages with the configured separator. A block failure (crop or
//! caption) aborts the read with the page and image it happened on.

use crate::config::ReadOptions;
use crate::error::ReadError;
use crate::layout::{
    build_page_blocks, blocks_to_markdown_with, join_pages, BlockContent, BlockKind,
    ImageContent, ImageMode,
};
use crate::output::{
    document_name, new_document_id, DocumentMetadata, PageResult, ReadStats, ReaderOutput,
    CONVERSION_METHOD, READER_METHOD,
};
use crate::pipeline::extract::{self, ExtractRequest};
use crate::pipeline::{input, postprocess};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Read a PDF file or URL into markdown.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str`: Local file path or HTTP/HTTPS URL to a PDF
/// * `options`: Read options
///
/// # Errors
/// - Input errors: missing file, non-PDF extension, bad magic bytes, download failure
/// - PDF errors: corrupt document, missing or wrong password, empty page selection
/// - [`ReadError::Block`] when an image cannot be cropped or captioned
pub async fn read(
    input_str: impl AsRef<str>,
    options: &ReadOptions,
) -> Result<ReaderOutput, ReadError> {
    let input_str = input_str.as_ref();
    info!("Starting read: {}", input_str);

    let resolved = input::resolve_input(input_str, options.download_timeout_secs).await?;
    read_resolved(
        input_str.to_string(),
        document_name(input_str),
        resolved.path(),
        options,
    )
    .await
}

/// Read PDF bytes held in memory.
///
/// The bytes are written to a managed temp file that is removed on return.
pub async fn read_from_bytes(
    bytes: &[u8],
    options: &ReadOptions,
) -> Result<ReaderOutput, ReadError> {
    let resolved = input::resolve_bytes(bytes, "document.pdf")?;
    read_resolved(String::new(), None, resolved.path(), options).await
}

/// Read a PDF and write the markdown to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn read_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    options: &ReadOptions,
) -> Result<ReadStats, ReadError> {
    let output = read(input_str, options).await?;
    let path = output_path.as_ref();
    write_atomic(path, &postprocess::ensure_final_newline(&output.text)).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`read`].
///
/// Creates a temporary tokio runtime internally.
pub fn read_sync(
    input_str: impl AsRef<str>,
    options: &ReadOptions,
) -> Result<ReaderOutput, ReadError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ReadError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(read(input_str, options))
}

/// Extract PDF metadata without reading page content.
///
/// Honours `options.password` and `options.download_timeout_secs`.
pub async fn inspect(
    input_str: impl AsRef<str>,
    options: &ReadOptions,
) -> Result<DocumentMetadata, ReadError> {
    let resolved =
        input::resolve_input(input_str.as_ref(), options.download_timeout_secs).await?;
    extract::extract_metadata(resolved.path(), options.password.as_deref()).await
}

/// Write `contents` to `path` via a sibling temp file and a rename.
pub(crate) async fn write_atomic(path: &Path, contents: &str) -> Result<(), ReadError> {
    let fail = |source: std::io::Error| ReadError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(fail)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, contents).await.map_err(fail)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(fail)?;
    Ok(())
}

async fn read_resolved(
    document_path: String,
    document_name: Option<String>,
    pdf_path: &Path,
    options: &ReadOptions,
) -> Result<ReaderOutput, ReadError> {
    let total_start = Instant::now();
    let mode = ImageMode::select(options.show_images, options.caption_model.is_some());

    // ── Step 1: Extract primitives ───────────────────────────────────────
    let request = ExtractRequest {
        password: options.password.clone(),
        pages: options.pages.clone(),
        render_images: mode.needs_pixels(),
        max_rendered_pixels: options.max_rendered_pixels,
        tables: options.tables,
    };
    let extract_start = Instant::now();
    let document = extract::extract_document(pdf_path, &request).await?;
    let extraction_duration_ms = extract_start.elapsed().as_millis() as u64;
    let selected = document.pages.len();
    info!(
        "Extracted {} of {} pages in {}ms",
        selected, document.metadata.page_count, extraction_duration_ms
    );

    if let Some(ref cb) = options.progress_callback {
        cb.on_read_start(selected);
    }

    // ── Step 2: Lay out and render each page ─────────────────────────────
    let layout_start = Instant::now();
    let mut pages: Vec<PageResult> = Vec::with_capacity(selected);
    let mut stats = ReadStats {
        total_pages: document.metadata.page_count,
        extraction_duration_ms,
        ..Default::default()
    };

    for page in &document.pages {
        let page_num = page.content.page;
        let page_start = Instant::now();
        if let Some(ref cb) = options.progress_callback {
            cb.on_page_start(page_num, selected);
        }

        let blocks = match build_page_blocks(&page.content, page.cropper(), options).await {
            Ok(blocks) => blocks,
            Err(e) => {
                if let Some(ref cb) = options.progress_callback {
                    cb.on_page_error(page_num, selected, &e.to_string());
                }
                return Err(e.into());
            }
        };

        let markdown =
            blocks_to_markdown_with(&blocks, options.show_images, &options.page_separator);
        let count = |kind: BlockKind| blocks.iter().filter(|b| b.kind() == kind).count();
        let result = PageResult {
            page_num,
            text_blocks: count(BlockKind::Text),
            table_blocks: count(BlockKind::Table),
            image_blocks: count(BlockKind::Image),
            duration_ms: page_start.elapsed().as_millis() as u64,
            markdown,
        };

        stats.processed_pages += 1;
        stats.tables += result.table_blocks;
        stats.images += result.image_blocks;
        stats.captioned_images += blocks
            .iter()
            .filter(|b| matches!(b.content, BlockContent::Image(ImageContent::Caption { .. })))
            .count();
        if result.markdown.is_empty() {
            stats.empty_pages += 1;
        }

        debug!(
            "Page {}: {} text, {} tables, {} images → {} bytes",
            page_num,
            result.text_blocks,
            result.table_blocks,
            result.image_blocks,
            result.markdown.len()
        );
        if let Some(ref cb) = options.progress_callback {
            cb.on_page_complete(page_num, selected, result.markdown.len());
        }
        pages.push(result);
    }
    stats.layout_duration_ms = layout_start.elapsed().as_millis() as u64;

    // ── Step 3: Assemble ─────────────────────────────────────────────────
    let joined: Vec<(usize, String)> = pages
        .iter()
        .map(|p| (p.page_num, p.markdown.clone()))
        .collect();
    let body = join_pages(&joined, &options.page_separator);
    let text = if options.include_metadata {
        format!("{}{}", document.metadata.to_front_matter(), body)
    } else {
        body
    };
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Read complete: {} pages, {} tables, {} images, {}ms total",
        stats.processed_pages, stats.tables, stats.images, stats.total_duration_ms
    );
    if let Some(ref cb) = options.progress_callback {
        cb.on_read_complete(selected, text.len());
    }

    let ocr_method = match mode {
        ImageMode::Caption => options.caption_model.as_ref().map(|m| m.name().to_string()),
        _ => None,
    };

    Ok(ReaderOutput {
        text,
        document_name,
        document_path,
        document_id: new_document_id(),
        conversion_method: Some(CONVERSION_METHOD.to_string()),
        reader_method: Some(READER_METHOD.to_string()),
        ocr_method,
        page_count: document.metadata.page_count,
        metadata: document.metadata,
        pages,
        stats,
    })
}
