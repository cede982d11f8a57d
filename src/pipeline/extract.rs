//! Page primitive extraction via pdfium.
//!
//! For every selected page this pulls:
//!
//! * text runs (one per pdfium text segment) and the words inside them;
//! * stream-mode tables found among those runs;
//! * bounding boxes of image objects;
//! * a rasterised snapshot, only when the page has images and the image mode
//!   needs pixels.
//!
//! pdfium reports rectangles with a bottom-left origin; everything leaving
//! this module is flipped to a top-left origin so `top` grows downwards.
//!
//! ## spawn_blocking
//!
//! `pdfium-render` wraps a C++ library with thread-local state that is not
//! safe to drive from async code. All pdfium calls run inside
//! `tokio::task::spawn_blocking`, one task per document.
//!
//! ## Snapshot size
//!
//! `max_rendered_pixels` caps the longest edge of the snapshot regardless of
//! physical page size, which bounds memory while keeping cropped figures
//! legible for a vision model.

use crate::config::PageSelection;
use crate::error::{CropError, ReadError};
use crate::layout::{BBox, PageContent, PositionedWord, RegionCropper};
use crate::output::DocumentMetadata;
use crate::pipeline::encode;
use crate::pipeline::tables::{find_tables, TableFinderConfig, TextRun};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// What to pull out of a document.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub password: Option<String>,
    pub pages: PageSelection,
    /// Render snapshots for pages that contain images.
    pub render_images: bool,
    pub max_rendered_pixels: u32,
    pub tables: TableFinderConfig,
}

/// A rasterised page that image regions are cropped from.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    image: DynamicImage,
    /// Pixels per PDF point.
    scale: f32,
}

impl PageSnapshot {
    pub fn new(image: DynamicImage, scale: f32) -> Self {
        Self { image, scale }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }
}

impl RegionCropper for PageSnapshot {
    fn crop_png(&self, region: &BBox) -> Result<Vec<u8>, CropError> {
        encode::crop_png(&self.image, region, self.scale)
    }
}

/// Cropper for pages without a snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unrendered;

impl RegionCropper for Unrendered {
    fn crop_png(&self, _region: &BBox) -> Result<Vec<u8>, CropError> {
        Err(CropError::Unavailable)
    }
}

/// Primitives of one page plus its optional snapshot.
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    pub content: PageContent,
    pub snapshot: Option<PageSnapshot>,
}

impl ExtractedPage {
    /// The cropper images of this page are resolved through.
    pub fn cropper(&self) -> &dyn RegionCropper {
        match &self.snapshot {
            Some(snapshot) => snapshot,
            None => &Unrendered,
        }
    }
}

/// A whole extraction: document metadata and the selected pages in order.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub metadata: DocumentMetadata,
    pub pages: Vec<ExtractedPage>,
}

/// Extract the selected pages of a PDF.
pub async fn extract_document(
    pdf_path: &Path,
    request: &ExtractRequest,
) -> Result<ExtractedDocument, ReadError> {
    let path = pdf_path.to_path_buf();
    let request = request.clone();

    tokio::task::spawn_blocking(move || extract_document_blocking(&path, &request))
        .await
        .map_err(|e| ReadError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Extract document metadata without touching page content.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, ReadError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || {
        let pdfium = bind()?;
        let document = open(&pdfium, &path, pwd.as_deref())?;
        Ok(read_metadata(&document))
    })
    .await
    .map_err(|e| ReadError::Internal(format!("Metadata task panicked: {}", e)))?
}

fn bind() -> Result<Pdfium, ReadError> {
    pdfium_auto::bind_pdfium_silent().map_err(|e| ReadError::PdfiumBindingFailed(e.to_string()))
}

fn open<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, ReadError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                ReadError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                ReadError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            ReadError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

fn extract_document_blocking(
    pdf_path: &Path,
    request: &ExtractRequest,
) -> Result<ExtractedDocument, ReadError> {
    let pdfium = bind()?;
    let document = open(&pdfium, pdf_path, request.password.as_deref())?;
    let metadata = read_metadata(&document);
    let total_pages = metadata.page_count;
    info!("PDF loaded: {} pages", total_pages);

    let indices = request.pages.to_indices(total_pages);
    if indices.is_empty() {
        return Err(ReadError::PageOutOfRange {
            page: 0,
            total: total_pages,
        });
    }

    let render_config = PdfRenderConfig::new()
        .set_target_width(request.max_rendered_pixels as i32)
        .set_maximum_height(request.max_rendered_pixels as i32);

    let pages = document.pages();
    let mut extracted = Vec::with_capacity(indices.len());
    for idx in indices {
        let page_num = idx + 1;
        let fail = |detail: String| ReadError::ExtractionFailed {
            page: page_num,
            detail,
        };

        let page = pages.get(idx as u16).map_err(|e| fail(format!("{:?}", e)))?;
        let page_width = page.width().value;
        let page_height = page.height().value;

        let runs = text_runs(&page, page_height).map_err(|e| fail(format!("{:?}", e)))?;
        let images = image_regions(&page, page_width, page_height);

        let mut content = PageContent::new(page_num);
        content.words = runs.iter().flat_map(words_from_run).collect();
        content.tables = find_tables(&runs, &request.tables);
        content.images = images;

        let snapshot = if request.render_images && !content.images.is_empty() {
            let bitmap = page
                .render_with_config(&render_config)
                .map_err(|e| fail(format!("{:?}", e)))?;
            let image = bitmap.as_image();
            let scale = image.width() as f32 / page.width().value.max(1.0);
            debug!(
                "Page {}: snapshot {}x{} px ({:.2} px/pt)",
                page_num,
                image.width(),
                image.height(),
                scale
            );
            Some(PageSnapshot::new(image, scale))
        } else {
            None
        };

        debug!(
            "Page {}: {} words, {} table candidates, {} images",
            page_num,
            content.words.len(),
            content.tables.len(),
            content.images.len()
        );
        extracted.push(ExtractedPage { content, snapshot });
    }

    Ok(ExtractedDocument {
        metadata,
        pages: extracted,
    })
}

/// One run per text segment, in top-left coordinates.
fn text_runs(page: &PdfPage, page_height: f32) -> Result<Vec<TextRun>, PdfiumError> {
    let text = page.text()?;
    let runs = text
        .segments()
        .iter()
        .filter_map(|segment| {
            let content = segment.text();
            if content.trim().is_empty() {
                return None;
            }
            let rect = segment.bounds();
            Some(TextRun::new(
                content,
                flip(
                    rect.left().value,
                    rect.top().value,
                    rect.right().value,
                    rect.bottom().value,
                    page_height,
                ),
            ))
        })
        .collect();
    Ok(runs)
}

/// Bounding boxes of image objects, clipped to the page, that keep a
/// non-zero area.
fn image_regions(page: &PdfPage, page_width: f32, page_height: f32) -> Vec<BBox> {
    page.objects()
        .iter()
        .filter(|object| object.object_type() == PdfPageObjectType::Image)
        .filter_map(|object| object.bounds().ok())
        .map(|b| {
            flip(
                b.left().value,
                b.top().value,
                b.right().value,
                b.bottom().value,
                page_height,
            )
        })
        .filter_map(|b| clip_to_page(b, page_width, page_height))
        .collect()
}

/// Clip a region to `[0, width] x [0, height]`. `None` when nothing of it
/// lies on the page.
fn clip_to_page(region: BBox, page_width: f32, page_height: f32) -> Option<BBox> {
    let clipped = BBox::new(
        region.x0.clamp(0.0, page_width),
        region.top.clamp(0.0, page_height),
        region.x1.clamp(0.0, page_width),
        region.bottom.clamp(0.0, page_height),
    );
    if clipped.width() > 0.0 && clipped.height() > 0.0 {
        Some(clipped)
    } else {
        if region != clipped {
            debug!("Image region {:?} lies off the page, skipped", region);
        }
        None
    }
}

/// Convert a bottom-left-origin rectangle to a top-left-origin [`BBox`].
fn flip(left: f32, top: f32, right: f32, bottom: f32, page_height: f32) -> BBox {
    BBox::new(
        left.min(right),
        page_height - top.max(bottom),
        left.max(right),
        page_height - top.min(bottom),
    )
}

/// Split a run into whitespace-separated words.
///
/// pdfium gives one box per segment; each word's `x0` is interpolated from
/// its character offset, assuming evenly spaced characters.
pub fn words_from_run(run: &TextRun) -> Vec<PositionedWord> {
    let total = run.text.chars().count();
    if total == 0 {
        return Vec::new();
    }
    let char_width = run.bbox.width() / total as f32;

    let mut words = Vec::new();
    let mut current = String::new();
    let mut start = 0usize;
    for (i, c) in run.text.chars().enumerate() {
        if c.is_whitespace() {
            if !current.is_empty() {
                words.push(PositionedWord::new(
                    std::mem::take(&mut current),
                    run.bbox.top,
                    run.bbox.bottom,
                    run.bbox.x0 + start as f32 * char_width,
                ));
            }
        } else {
            if current.is_empty() {
                start = i;
            }
            current.push(c);
        }
    }
    if !current.is_empty() {
        words.push(PositionedWord::new(
            current,
            run.bbox.top,
            run.bbox.bottom,
            run.bbox.x0 + start as f32 * char_width,
        ));
    }
    words
}

fn read_metadata(document: &PdfDocument) -> DocumentMetadata {
    let metadata = document.metadata();
    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().trim().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    }
}
