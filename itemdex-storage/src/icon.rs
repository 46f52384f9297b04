//! Icon asset contract: exactly `ICON_DIMENSION` x `ICON_DIMENSION` pixels.

use image::{DynamicImage, ImageFormat};
use itemdex_core::{AssetError, ICON_DIMENSION};
use std::io::Cursor;

/// Decode `bytes`, enforce the pixel dimensions and re-encode as PNG.
pub fn prepare_icon(bytes: &[u8]) -> Result<Vec<u8>, AssetError> {
    let image = image::load_from_memory(bytes).map_err(|e| AssetError::Decode {
        reason: e.to_string(),
    })?;
    check_dimensions(&image)?;
    encode_png(&image)
}

fn check_dimensions(image: &DynamicImage) -> Result<(), AssetError> {
    let (width, height) = (image.width(), image.height());
    if width != ICON_DIMENSION || height != ICON_DIMENSION {
        return Err(AssetError::IconDimensionMismatch {
            expected: ICON_DIMENSION,
            width,
            height,
        });
    }
    Ok(())
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, AssetError> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| AssetError::Decode {
            reason: e.to_string(),
        })?;
    Ok(out.into_inner())
}
