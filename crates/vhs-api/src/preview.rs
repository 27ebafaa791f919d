//! Default preview image for new uploads.

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, ImageResult, Rgb, RgbImage};
use tracing::info;

/// Neutral gray used when no preview image is configured.
const PLACEHOLDER_COLOR: Rgb<u8> = Rgb([48, 48, 48]);

/// Encode a solid placeholder frame as JPEG.
pub fn render_placeholder(width: u32, height: u32) -> ImageResult<Vec<u8>> {
    let canvas = RgbImage::from_pixel(width, height, PLACEHOLDER_COLOR);
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, 80).encode(
        canvas.as_raw(),
        width,
        height,
        ColorType::Rgb8,
    )?;
    Ok(out)
}

/// Load the configured preview, or render the placeholder.
pub async fn load_default_preview(
    path: Option<&Path>,
    width: u32,
    height: u32,
) -> anyhow::Result<Vec<u8>> {
    match path {
        Some(path) => {
            let data = tokio::fs::read(path).await?;
            image::load_from_memory(&data)?;
            info!(path = %path.display(), "Loaded default preview");
            Ok(data)
        }
        None => Ok(render_placeholder(width, height)?),
    }
}
