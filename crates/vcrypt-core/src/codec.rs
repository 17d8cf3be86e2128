use std::io::Cursor;

use image::io::Reader;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tracing::debug;

use crate::bitmap::{BinaryImage, Dimensions, Pixel};
use crate::error::VcError;
use crate::validate;

/// RGBA value written for ink cells.
pub const INK_RGBA: Rgba<u8> = Rgba([0, 0, 0, 255]);
/// RGBA value written for clear cells.
pub const CLEAR_RGBA: Rgba<u8> = Rgba([255, 255, 255, 0]);

/// Decode raw image bytes (format guessed from the content) into RGBA.
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, VcError> {
    let img = image::load_from_memory(bytes).map_err(VcError::DecodeFailure)?;
    Ok(img.to_rgba8())
}

/// Render a binary image: ink as opaque black, clear as transparent white.
pub fn to_rgba(image: &BinaryImage) -> RgbaImage {
    RgbaImage::from_fn(image.width(), image.height(), |x, y| match image.get(x, y) {
        Pixel::Ink => INK_RGBA,
        Pixel::Clear => CLEAR_RGBA,
    })
}

/// Encode a binary image as PNG.
pub fn encode_png(image: &BinaryImage) -> Result<Vec<u8>, VcError> {
    let mut out = Vec::new();
    DynamicImage::ImageRgba8(to_rgba(image))
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(VcError::EncodeFailure)?;
    debug!(size = %image.dimensions(), bytes = out.len(), "encoded png");
    Ok(out)
}

/// Decode and normalize a source image, see [`validate::normalize`].
pub fn load_source(
    bytes: &[u8],
    target: Option<Dimensions>,
    resize: bool,
) -> Result<BinaryImage, VcError> {
    validate::normalize(&decode_rgba(bytes)?, target, resize)
}

/// Decode and validate a key or share, see [`validate::validate_share`].
pub fn load_share(bytes: &[u8]) -> Result<BinaryImage, VcError> {
    validate::validate_share(&decode_rgba(bytes)?)
}

/// Read only the dimensions of an encoded image from its header.
pub fn probe_dimensions(bytes: &[u8]) -> Result<Dimensions, VcError> {
    let (width, height) = Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| VcError::DecodeFailure(err.into()))?
        .into_dimensions()
        .map_err(VcError::DecodeFailure)?;
    Ok(Dimensions::new(width, height))
}
