//! Compositing engine: flattening the processed image over a background

use crate::error::{ClientError, Result};
use crate::palette::BackgroundSpec;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Flatten processed (alpha-transparent) image bytes over a background and
/// return PNG bytes
///
/// A `Transparent` background is a pass-through: the input bytes are
/// returned unmodified, alpha preserved exactly. Solid backgrounds fill the
/// full extent with the resolved color, then source-over blend the processed
/// pixels on top; the output carries no partial transparency.
///
/// # Errors
/// - `ImageLoad` if the processed bytes cannot be decoded
/// - `Export` if the background color is invalid or PNG encoding fails
pub fn composite(processed_bytes: &[u8], background: &BackgroundSpec) -> Result<Vec<u8>> {
    let Some(fill) = background.fill_color()? else {
        return Ok(processed_bytes.to_vec());
    };

    let decoded = image::load_from_memory(processed_bytes)
        .map_err(|e| ClientError::image_load(format!("Cannot decode processed image: {e}")))?;
    let flattened = flatten_over(&decoded.to_rgba8(), fill);
    encode_png(&flattened)
}

/// Source-over blend of `image` onto a solid `fill` color
///
/// Each output channel is `src * a + fill * (1 - a)` with the processed
/// pixel's alpha as the blend factor; output alpha is always 255. Fully
/// transparent pixels take exactly the fill color, fully opaque pixels pass
/// through unchanged.
fn flatten_over(image: &RgbaImage, fill: Rgba<u8>) -> RgbaImage {
    let mut output = RgbaImage::from_pixel(image.width(), image.height(), fill);
    for (out, src) in output.pixels_mut().zip(image.pixels()) {
        let alpha = u32::from(src[3]);
        let inverse = 255 - alpha;
        for channel in 0..3 {
            let blended =
                (u32::from(src[channel]) * alpha + u32::from(fill[channel]) * inverse + 127) / 255;
            out[channel] = blended as u8;
        }
        out[3] = 255;
    }
    output
}

/// Encode a raster surface as PNG bytes
fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| ClientError::export(format!("PNG encoding failed: {e}")))?;
    Ok(buffer)
}
