//! Integration tests for page layout reconstruction.
//!
//! These drive the public layout API with hand-built page primitives, a
//! stub cropper and a stub caption model, so they need neither libpdfium
//! nor network access.

use async_trait::async_trait;
use edgequake_llm::ImageData;
use image::DynamicImage;
use pdf_layout_md::pipeline::extract::PageSnapshot;
use pdf_layout_md::{
    blocks_to_markdown, group_by_lines, is_real_table, render_page_to_markdown,
    table_to_markdown, BBox, Block, BlockError, CaptionError, CaptionModel, CharacterSplitter,
    ChunkOverlap, CropError, ImageContent, LayoutConfig, PageContent, PageSeparator,
    PositionedWord, RawTable, ReadOptions, ReaderOutput, RegionCropper, Splitter, WordSplitter,
    IMAGE_OMITTED,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Test doubles ─────────────────────────────────────────────────────────────

struct StubCropper;

impl RegionCropper for StubCropper {
    fn crop_png(&self, _region: &BBox) -> Result<Vec<u8>, CropError> {
        // PNG signature followed by a few bytes; content is opaque to layout.
        Ok(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3])
    }
}

struct NoPixels;

impl RegionCropper for NoPixels {
    fn crop_png(&self, _region: &BBox) -> Result<Vec<u8>, CropError> {
        Err(CropError::Unavailable)
    }
}

struct DummyModel {
    calls: AtomicUsize,
}

impl DummyModel {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl CaptionModel for DummyModel {
    fn name(&self) -> &str {
        "dummy"
    }

    async fn extract_text(
        &self,
        _image: &ImageData,
        _prompt: &str,
    ) -> Result<String, CaptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("Dummy caption".to_string())
    }
}

struct BrokenModel;

#[async_trait]
impl CaptionModel for BrokenModel {
    fn name(&self) -> &str {
        "broken"
    }

    async fn extract_text(
        &self,
        _image: &ImageData,
        _prompt: &str,
    ) -> Result<String, CaptionError> {
        Err(CaptionError::Unavailable("service down".into()))
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn word(text: &str, top: f32, bottom: f32, x0: f32) -> PositionedWord {
    PositionedWord::new(text, top, bottom, x0)
}

fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect()
}

/// A page with a heading, a two-column table, an image and a closing line.
fn mixed_page(page: usize) -> PageContent {
    let mut content = PageContent::new(page);
    content.words = vec![
        word("Quarterly", 20.0, 30.0, 50.0),
        word("report", 20.0, 30.0, 120.0),
        // Words inside the table region; they must not leak into prose.
        word("Header1", 100.0, 110.0, 60.0),
        word("Header2", 100.0, 110.0, 200.0),
        word("Row1Cell1", 120.0, 130.0, 60.0),
        word("Row1Cell2", 120.0, 130.0, 200.0),
        word("Row2Cell1", 140.0, 150.0, 60.0),
        word("See", 400.0, 410.0, 50.0),
        word("figure", 400.0, 410.0, 80.0),
    ];
    content.tables = vec![RawTable {
        bbox: BBox::new(50.0, 95.0, 300.0, 155.0),
        cells: grid(&[
            &["Header1", "Header2"],
            &["Row1Cell1", "Row1Cell2"],
            &["Row2Cell1", ""],
        ]),
    }];
    content.images = vec![BBox::new(50.0, 200.0, 250.0, 380.0)];
    content
}

fn options_without_images() -> ReadOptions {
    ReadOptions::builder()
        .show_images(false)
        .build()
        .expect("valid options")
}

// ── Line grouping ────────────────────────────────────────────────────────────

#[test]
fn words_group_into_two_lines() {
    let words = vec![
        word("Hello", 10.0, 18.0, 50.0),
        word("world", 10.1, 18.1, 80.0),
        word("This", 35.0, 45.0, 50.0),
        word("is", 35.2, 45.2, 80.0),
    ];
    let lines = group_by_lines(&words, &LayoutConfig::default());
    let contents: Vec<&str> = lines.iter().map(|l| l.content.as_str()).collect();
    assert_eq!(contents, vec!["Hello world", "This is"]);
}

#[tokio::test]
async fn prose_page_renders_paragraphs() {
    let mut content = PageContent::new(1);
    content.words = vec![
        word("Hello", 10.0, 18.0, 50.0),
        word("world", 10.1, 18.1, 80.0),
        word("This", 35.0, 45.0, 50.0),
        word("is", 35.2, 45.2, 80.0),
    ];
    let md = render_page_to_markdown(&content, &StubCropper, &ReadOptions::default())
        .await
        .expect("prose renders");
    assert_eq!(md, "Hello world\n\nThis is");
}

#[tokio::test]
async fn empty_page_renders_nothing() {
    let md = render_page_to_markdown(&PageContent::new(3), &NoPixels, &ReadOptions::default())
        .await
        .expect("empty page renders");
    assert!(md.is_empty());
}

// ── Tables ───────────────────────────────────────────────────────────────────

#[test]
fn table_scenario_renders_pipe_rows() {
    let cells = grid(&[
        &["Header1", "Header2"],
        &["Row1Cell1", "Row1Cell2"],
        &["Row2Cell1", ""],
    ]);
    assert!(is_real_table(&cells, 0.5));
    let md = table_to_markdown(&cells);
    assert!(md.contains("| Header1 | Header2 |"));
    assert!(md.contains("| Row2Cell1 |  |"));
}

#[test]
fn single_column_grid_is_not_a_table() {
    assert!(!is_real_table(&grid(&[&["a"], &["b"], &["c"]]), 0.5));
}

#[tokio::test]
async fn rejected_table_falls_back_to_prose() {
    let mut content = PageContent::new(1);
    content.words = vec![
        word("just", 10.0, 20.0, 50.0),
        word("a", 10.0, 20.0, 90.0),
        word("column", 10.0, 20.0, 110.0),
    ];
    content.tables = vec![RawTable {
        bbox: BBox::new(40.0, 5.0, 300.0, 25.0),
        cells: grid(&[&["just a column"], &[""], &["x"]]),
    }];
    let md = render_page_to_markdown(&content, &NoPixels, &options_without_images())
        .await
        .expect("renders");
    assert_eq!(md, "just a column");
    assert!(!md.contains('|'));
}

// ── Images ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn mixed_page_keeps_vertical_order() {
    let md = render_page_to_markdown(&mixed_page(1), &NoPixels, &options_without_images())
        .await
        .expect("renders");

    let heading = md.find("Quarterly report").expect("heading");
    let table = md.find("| Header1 | Header2 |").expect("table");
    let image = md.find(IMAGE_OMITTED).expect("image placeholder");
    let closing = md.find("See figure").expect("closing line");
    assert!(heading < table && table < image && image < closing, "{md}");

    // Table words are rendered once, inside the table.
    assert_eq!(md.matches("Row1Cell1").count(), 1);
}

#[tokio::test]
async fn omitted_images_never_touch_the_cropper() {
    // NoPixels would fail any crop; omit mode must not ask for one.
    let md = render_page_to_markdown(&mixed_page(1), &NoPixels, &options_without_images())
        .await
        .expect("omit never fails");
    assert!(md.contains("[Image omitted]"));
}

#[tokio::test]
async fn show_images_embeds_data_uri() {
    let md = render_page_to_markdown(&mixed_page(1), &StubCropper, &ReadOptions::default())
        .await
        .expect("renders");
    assert!(md.contains("![](data:image/png;base64,"));
    assert!(!md.contains(IMAGE_OMITTED));
}

#[tokio::test]
async fn caption_model_replaces_images() {
    let model = DummyModel::new();
    let options = ReadOptions::builder()
        .show_images(false)
        .caption_model(model.clone())
        .build()
        .expect("valid options");

    let md = render_page_to_markdown(&mixed_page(1), &StubCropper, &options)
        .await
        .expect("renders");
    assert!(md.contains("Dummy caption"));
    assert!(!md.contains("data:image/png;base64"));
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn show_images_wins_over_caption_model() {
    let model = DummyModel::new();
    let options = ReadOptions::builder()
        .caption_model(model.clone())
        .build()
        .expect("valid options");

    let md = render_page_to_markdown(&mixed_page(1), &StubCropper, &options)
        .await
        .expect("renders");
    assert!(md.contains("data:image/png;base64"));
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn caption_failure_reports_page_and_image() {
    let mut content = mixed_page(4);
    content.images.push(BBox::new(300.0, 200.0, 500.0, 380.0));
    let options = ReadOptions::builder()
        .show_images(false)
        .caption_model(Arc::new(BrokenModel))
        .build()
        .expect("valid options");

    let err = render_page_to_markdown(&content, &StubCropper, &options)
        .await
        .expect_err("caption failure is fatal");
    assert!(matches!(err, BlockError::CaptionFailed { .. }));
    assert_eq!(err.page(), 4);
    assert_eq!(err.image(), 0);
    assert!(err.to_string().contains("service down"));
}

#[tokio::test]
async fn crop_failure_reports_image() {
    let err = render_page_to_markdown(&mixed_page(2), &NoPixels, &ReadOptions::default())
        .await
        .expect_err("embedding needs pixels");
    assert!(matches!(
        err,
        BlockError::CropFailed {
            page: 2,
            image: 0,
            source: CropError::Unavailable
        }
    ));
}

#[tokio::test]
async fn off_page_image_is_omitted_not_fatal() {
    // US letter rendered at 2 px/pt; the image sits right of the page edge.
    let mut content = PageContent::new(1);
    content.words = vec![word("Hello", 100.0, 112.0, 72.0)];
    content.images = vec![BBox::new(700.0, 100.0, 800.0, 200.0)];
    let snapshot = PageSnapshot::new(DynamicImage::new_rgb8(1224, 1584), 2.0);

    let md = render_page_to_markdown(&content, &snapshot, &ReadOptions::default())
        .await
        .expect("an off-page image must not abort the page");
    assert!(md.contains("Hello"));
    assert!(md.contains(IMAGE_OMITTED));
    assert!(!md.contains("data:image/png;base64"));
}

// ── Sequencing ───────────────────────────────────────────────────────────────

#[test]
fn pages_are_separated_by_markers() {
    let blocks = vec![
        Block::text(2, 10.0, 20.0, "second page"),
        Block::image(1, 50.0, 90.0, ImageContent::Omitted),
        Block::text(1, 10.0, 20.0, "first page"),
        Block::text(3, 10.0, 20.0, "third page"),
    ];
    let md = blocks_to_markdown(&blocks, false);
    assert_eq!(
        md,
        "first page\n\n[Image omitted]\n\n--- Page 2 ---\n\nsecond page\n\n--- Page 3 ---\n\nthird page"
    );
    assert!(!md.contains("--- Page 1 ---"));
}

#[test]
fn order_does_not_depend_on_input_permutation() {
    let mut blocks = vec![
        Block::table(1, 40.0, 60.0, grid(&[&["a", "b"], &["c", "d"]])),
        Block::text(1, 10.0, 20.0, "intro"),
        Block::text(1, 70.0, 80.0, "outro"),
    ];
    let forward = blocks_to_markdown(&blocks, true);
    blocks.reverse();
    assert_eq!(forward, blocks_to_markdown(&blocks, true));
    assert!(forward.starts_with("intro"));
    assert!(forward.ends_with("outro"));
}

#[tokio::test]
async fn custom_separator_is_used_between_pages() {
    let options = ReadOptions::builder()
        .show_images(false)
        .page_separator(PageSeparator::Comment)
        .build()
        .expect("valid options");
    let first = render_page_to_markdown(&mixed_page(1), &NoPixels, &options)
        .await
        .expect("renders");
    assert!(!first.contains("<!-- page 1 -->"));

    let blocks = vec![
        Block::text(1, 0.0, 1.0, "one"),
        Block::text(2, 0.0, 1.0, "two"),
    ];
    let md =
        pdf_layout_md::layout::blocks_to_markdown_with(&blocks, false, &options.page_separator);
    assert_eq!(md, "one\n\n<!-- page 2 -->\n\ntwo");
}

// ── Splitting ────────────────────────────────────────────────────────────────

#[test]
fn splitters_chunk_reader_output() {
    let mut output = ReaderOutput::from_text("alpha beta gamma delta epsilon zeta eta");
    output.document_name = Some("greek.pdf".into());

    let words = WordSplitter::new(3, ChunkOverlap::Count(1))
        .expect("valid")
        .split(&output)
        .expect("splits");
    assert_eq!(
        words.chunks,
        vec![
            "alpha beta gamma",
            "gamma delta epsilon",
            "epsilon zeta eta",
            "eta"
        ]
    );
    assert_eq!(words.document_name.as_deref(), Some("greek.pdf"));

    let chars = CharacterSplitter::new(16, ChunkOverlap::Fraction(0.25))
        .expect("valid")
        .split(&output)
        .expect("splits");
    assert_eq!(chars.chunks[0], "alpha beta gamma");
    assert_eq!(chars.chunk_id.len(), chars.chunks.len());
    assert_eq!(chars.split_method, "character_splitter");
}
