use tracing::debug;

use crate::bitmap::{BinaryImage, Pixel};
use crate::error::VcError;

/// Stack two same-size images: a cell is ink if either input inks it.
pub fn overlay(a: &BinaryImage, b: &BinaryImage) -> Result<BinaryImage, VcError> {
    if a.dimensions() != b.dimensions() {
        return Err(VcError::DimensionMismatch {
            expected: a.dimensions(),
            found: b.dimensions(),
        });
    }
    Ok(BinaryImage::from_fn(a.width(), a.height(), |x, y| {
        a.get(x, y).union(b.get(x, y))
    }))
}

/// Collapse an overlay back to logical resolution. A pixel is ink only when
/// its whole block is; partially filled blocks come out clear.
pub fn reconstruct(overlay: &BinaryImage) -> Result<BinaryImage, VcError> {
    if !overlay.dimensions().is_even() {
        return Err(VcError::OddDimension(overlay.dimensions()));
    }
    let logical = overlay.dimensions().halved();
    debug!(overlay = %overlay.dimensions(), "reconstructing");
    Ok(BinaryImage::from_fn(logical.width, logical.height, |bx, by| {
        if overlay.block(bx, by).iter().all(|p| p.is_ink()) {
            Pixel::Ink
        } else {
            Pixel::Clear
        }
    }))
}

/// Stack `share` on `key` and clean up the result.
pub fn decrypt(key: &BinaryImage, share: &BinaryImage) -> Result<BinaryImage, VcError> {
    reconstruct(&overlay(key, share)?)
}
