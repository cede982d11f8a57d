//! Image handling: embed, caption, or omit.
//!
//! The handler never touches pdfium or a model SDK directly. It talks to two
//! narrow collaborators:
//!
//! * [`RegionCropper`]: turns a page region into PNG bytes;
//! * [`CaptionModel`]: turns an image and a prompt into text.

use super::block::{ImageContent, RawImage};
use crate::error::{BlockError, CaptionError, CropError};
use crate::layout::BBox;
use crate::pipeline::{encode, postprocess};
use async_trait::async_trait;
use edgequake_llm::ImageData;
use tracing::{debug, warn};

/// Fixed marker for an image that was present but not rendered.
pub const IMAGE_OMITTED: &str = "[Image omitted]";

/// Produces PNG bytes for a region of the current page.
pub trait RegionCropper: Send + Sync {
    fn crop_png(&self, region: &BBox) -> Result<Vec<u8>, CropError>;
}

/// A model able to describe or transcribe an image.
#[async_trait]
pub trait CaptionModel: Send + Sync {
    /// Identifier recorded as the OCR method of the reader output.
    fn name(&self) -> &str;

    async fn extract_text(&self, image: &ImageData, prompt: &str) -> Result<String, CaptionError>;
}

/// How images on a page are turned into blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMode {
    /// Embed the cropped region as a base64 data URI.
    Embed,
    /// Replace the image with a model-generated caption.
    Caption,
    /// Emit [`IMAGE_OMITTED`].
    Omit,
}

impl ImageMode {
    /// `show_images` wins over captioning; without either, images are omitted.
    pub fn select(show_images: bool, has_model: bool) -> Self {
        if show_images {
            ImageMode::Embed
        } else if has_model {
            ImageMode::Caption
        } else {
            ImageMode::Omit
        }
    }

    /// Whether this mode needs pixels, i.e. a rendered page snapshot.
    pub fn needs_pixels(self) -> bool {
        !matches!(self, ImageMode::Omit)
    }
}

/// Resolves each image of a page into its [`ImageContent`].
pub struct ImageHandler<'a> {
    mode: ImageMode,
    model: Option<&'a dyn CaptionModel>,
    prompt: &'a str,
}

impl<'a> ImageHandler<'a> {
    pub fn new(show_images: bool, model: Option<&'a dyn CaptionModel>, prompt: &'a str) -> Self {
        Self {
            mode: ImageMode::select(show_images, model.is_some()),
            model,
            prompt,
        }
    }

    pub fn mode(&self) -> ImageMode {
        self.mode
    }

    /// Resolve one image. `page` and `index` (the image's position among the
    /// page's images) locate it in errors.
    ///
    /// A region with no pixels on the rendered page degrades to
    /// [`ImageContent::Omitted`]; any other crop failure is an error.
    pub async fn handle(
        &self,
        page: usize,
        index: usize,
        region: &RawImage,
        cropper: &dyn RegionCropper,
    ) -> Result<ImageContent, BlockError> {
        if self.mode == ImageMode::Omit {
            return Ok(ImageContent::Omitted);
        }

        let png = match cropper.crop_png(region) {
            Ok(png) => png,
            Err(CropError::EmptyRegion { region }) => {
                warn!(
                    "Page {}, image {}: region {:?} has no pixels on the page, omitted",
                    page, index, region
                );
                return Ok(ImageContent::Omitted);
            }
            Err(source) => {
                return Err(BlockError::CropFailed {
                    page,
                    image: index,
                    source,
                });
            }
        };

        match (self.mode, self.model) {
            (ImageMode::Caption, Some(model)) => {
                let data = encode::to_image_data(&png);
                let raw = model
                    .extract_text(&data, self.prompt)
                    .await
                    .map_err(|source| BlockError::CaptionFailed {
                        page,
                        image: index,
                        source,
                    })?;
                let text = postprocess::clean_caption(&raw);
                if text.is_empty() {
                    warn!("Page {}, image {}: caption model returned no text", page, index);
                    return Ok(ImageContent::Omitted);
                }
                debug!("Page {}, image {}: {} caption chars", page, index, text.len());
                Ok(ImageContent::Caption { text })
            }
            // Caption mode is only selected when a model is present.
            _ => Ok(ImageContent::Embedded {
                base64: encode::to_base64(&png),
            }),
        }
    }
}

/// Markdown fragment for an image block.
///
/// With `show_images = false` an embedded image degrades to the omission
/// marker.
pub fn image_to_markdown(content: &ImageContent, show_images: bool) -> String {
    match content {
        ImageContent::Embedded { base64 } if show_images => {
            format!("![](data:image/png;base64,{base64})")
        }
        ImageContent::Embedded { .. } | ImageContent::Omitted => IMAGE_OMITTED.to_string(),
        ImageContent::Caption { text } => format!("*{text}*"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedCropper(Vec<u8>);

    impl RegionCropper for FixedCropper {
        fn crop_png(&self, _region: &BBox) -> Result<Vec<u8>, CropError> {
            Ok(self.0.clone())
        }
    }

    struct FailingCropper;

    impl RegionCropper for FailingCropper {
        fn crop_png(&self, _region: &BBox) -> Result<Vec<u8>, CropError> {
            Err(CropError::Unavailable)
        }
    }

    struct EmptyCropper;

    impl RegionCropper for EmptyCropper {
        fn crop_png(&self, region: &BBox) -> Result<Vec<u8>, CropError> {
            Err(CropError::EmptyRegion { region: *region })
        }
    }

    struct CountingModel {
        reply: Result<String, CaptionError>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CaptionModel for CountingModel {
        fn name(&self) -> &str {
            "counting"
        }

        async fn extract_text(
            &self,
            image: &ImageData,
            prompt: &str,
        ) -> Result<String, CaptionError> {
            assert_eq!(image.mime_type, "image/png");
            assert_eq!(prompt, "describe");
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    fn bbox() -> RawImage {
        BBox::new(10.0, 20.0, 30.0, 40.0)
    }

    #[test]
    fn mode_selection() {
        assert_eq!(ImageMode::select(true, true), ImageMode::Embed);
        assert_eq!(ImageMode::select(true, false), ImageMode::Embed);
        assert_eq!(ImageMode::select(false, true), ImageMode::Caption);
        assert_eq!(ImageMode::select(false, false), ImageMode::Omit);
        assert!(!ImageMode::Omit.needs_pixels());
        assert!(ImageMode::Caption.needs_pixels());
    }

    #[test]
    fn omit_mode_never_crops() {
        let handler = ImageHandler::new(false, None, "describe");
        let content = tokio_test::block_on(handler.handle(1, 0, &bbox(), &FailingCropper))
            .expect("omission never fails");
        assert_eq!(content, ImageContent::Omitted);
        assert_eq!(image_to_markdown(&content, false), IMAGE_OMITTED);
    }

    #[test]
    fn embed_mode_base64_encodes_crop() {
        let handler = ImageHandler::new(true, None, "describe");
        let cropper = FixedCropper(b"fakeimg".to_vec());
        let content =
            tokio_test::block_on(handler.handle(1, 0, &bbox(), &cropper)).expect("embed");
        assert_eq!(
            content,
            ImageContent::Embedded {
                base64: encode::to_base64(b"fakeimg")
            }
        );
        assert!(image_to_markdown(&content, true).starts_with("![](data:image/png;base64,"));
        assert_eq!(image_to_markdown(&content, false), IMAGE_OMITTED);
    }

    #[test]
    fn caption_mode_calls_model_once() {
        let model = CountingModel {
            reply: Ok("Dummy caption".into()),
            calls: AtomicUsize::new(0),
        };
        let handler = ImageHandler::new(false, Some(&model), "describe");
        let cropper = FixedCropper(b"fakeimg".to_vec());
        let content =
            tokio_test::block_on(handler.handle(2, 1, &bbox(), &cropper)).expect("caption");
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(image_to_markdown(&content, false), "*Dummy caption*");
    }

    #[test]
    fn caption_failure_is_located() {
        let model = CountingModel {
            reply: Err(CaptionError::Unavailable("offline".into())),
            calls: AtomicUsize::new(0),
        };
        let handler = ImageHandler::new(false, Some(&model), "describe");
        let cropper = FixedCropper(vec![1, 2, 3]);
        let err = tokio_test::block_on(handler.handle(3, 5, &bbox(), &cropper)).unwrap_err();
        assert!(matches!(err, BlockError::CaptionFailed { page: 3, image: 5, .. }));
    }

    #[test]
    fn crop_failure_is_located() {
        let handler = ImageHandler::new(true, None, "describe");
        let err = tokio_test::block_on(handler.handle(7, 0, &bbox(), &FailingCropper)).unwrap_err();
        assert!(matches!(err, BlockError::CropFailed { page: 7, image: 0, .. }));
    }

    #[test]
    fn region_without_pixels_is_omitted() {
        let model = CountingModel {
            reply: Ok("never asked".into()),
            calls: AtomicUsize::new(0),
        };
        for handler in [
            ImageHandler::new(true, None, "describe"),
            ImageHandler::new(false, Some(&model), "describe"),
        ] {
            let content = tokio_test::block_on(handler.handle(1, 0, &bbox(), &EmptyCropper))
                .expect("an empty region is not fatal");
            assert_eq!(content, ImageContent::Omitted);
        }
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn blank_caption_degrades_to_omitted() {
        let model = CountingModel {
            reply: Ok("  \n ".into()),
            calls: AtomicUsize::new(0),
        };
        let handler = ImageHandler::new(false, Some(&model), "describe");
        let content = tokio_test::block_on(handler.handle(1, 0, &bbox(), &FixedCropper(vec![0])))
            .expect("caption");
        assert_eq!(content, ImageContent::Omitted);
    }
}
