//! Region encoding: page snapshot → cropped PNG → base64.
//!
//! PNG keeps text inside figures crisp, which matters more to a caption
//! model than file size does. The same base64 payload backs both embedded
//! `data:` URIs and the image part of a caption request.

use crate::error::CropError;
use crate::layout::BBox;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Crop a region (in PDF points, top-left origin) out of a rasterised page
/// and encode it as PNG.
///
/// `scale` is pixels per point of the snapshot. The region is clamped to the
/// image; a region with no pixels left is an error.
pub fn crop_png(snapshot: &DynamicImage, region: &BBox, scale: f32) -> Result<Vec<u8>, CropError> {
    let (width, height) = (snapshot.width(), snapshot.height());
    let to_px = |v: f32, max: u32| -> u32 { ((v * scale).round().max(0.0) as u32).min(max) };

    let x0 = to_px(region.x0.min(region.x1), width);
    let x1 = to_px(region.x0.max(region.x1), width);
    let y0 = to_px(region.top.min(region.bottom), height);
    let y1 = to_px(region.top.max(region.bottom), height);

    if x1 <= x0 || y1 <= y0 {
        return Err(CropError::EmptyRegion { region: *region });
    }

    let cropped = snapshot.crop_imm(x0, y0, x1 - x0, y1 - y0);
    encode_png(&cropped)
}

/// Encode an image as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, CropError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!("Encoded {}x{} region → {} PNG bytes", img.width(), img.height(), buf.len());
    Ok(buf)
}

/// Base64-encode PNG bytes.
pub fn to_base64(png: &[u8]) -> String {
    STANDARD.encode(png)
}

/// Wrap PNG bytes as a vision-model image attachment.
///
/// `detail: "high"` keeps small print inside figures legible to GPT-4-class
/// models.
pub fn to_image_data(png: &[u8]) -> ImageData {
    ImageData::new(to_base64(png), "image/png").with_detail("high")
}
