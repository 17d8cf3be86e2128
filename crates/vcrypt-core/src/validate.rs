//! Turning decoded RGBA grids into [`BinaryImage`]s.
//!
//! Sources are thresholded by luminance and may be centred on a larger
//! canvas. Keys and shares are not thresholded: anything that is neither
//! transparent nor pure white counts as ink, and the overall clear density
//! has to look like something the key generator produced.

use image::{Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::bitmap::{BinaryImage, Dimensions, Pixel};
use crate::error::VcError;

/// Luminance above which a coloured source pixel becomes clear.
pub const LUMINANCE_CUTOFF: f64 = 127.5;

/// Bounds of `total / clear` accepted for keys and shares. A key block holds
/// one (ink pixel) or two (clear pixel) clear cells out of four.
pub const KEY_RATIO_RANGE: (f64, f64) = (2.0, 4.0);

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Threshold one source pixel.
pub fn source_pixel(px: Rgba<u8>) -> Pixel {
    if px == WHITE || px[3] == 0 {
        return Pixel::Clear;
    }
    if px == BLACK {
        return Pixel::Ink;
    }
    let luminance = 0.2126 * f64::from(px[0]) + 0.7152 * f64::from(px[1]) + 0.0722 * f64::from(px[2]);
    if luminance > LUMINANCE_CUTOFF {
        Pixel::Clear
    } else {
        Pixel::Ink
    }
}

/// Classify one key or share pixel.
pub fn share_pixel(px: Rgba<u8>) -> Pixel {
    if px == WHITE || px[3] == 0 {
        Pixel::Clear
    } else {
        Pixel::Ink
    }
}

/// Normalize a source image.
///
/// With `resize` and a `target` box the image must fit into the box; a
/// smaller image is centred on a clear canvas of exactly the box size.
/// Otherwise the thresholded image keeps its own size.
pub fn normalize(
    grid: &RgbaImage,
    target: Option<Dimensions>,
    resize: bool,
) -> Result<BinaryImage, VcError> {
    let found = Dimensions::new(grid.width(), grid.height());
    if let (true, Some(limit)) = (resize, target) {
        if !found.fits_within(limit) {
            warn!(%found, %limit, "source does not fit");
            return Err(VcError::OversizeSource { limit, found });
        }
    }

    let thresholded = BinaryImage::from_fn(found.width, found.height, |x, y| {
        source_pixel(*grid.get_pixel(x, y))
    });

    match target {
        Some(limit) if resize && limit != found => {
            debug!(%found, %limit, "centring source");
            center(&thresholded, limit)
        }
        _ => Ok(thresholded),
    }
}

/// Place `image` in the middle of a clear canvas of `canvas` size. The
/// offsets are rounded down. A canvas smaller than the image in either
/// direction is an [`VcError::OversizeSource`].
pub fn center(image: &BinaryImage, canvas: Dimensions) -> Result<BinaryImage, VcError> {
    if !image.dimensions().fits_within(canvas) {
        return Err(VcError::OversizeSource {
            limit: canvas,
            found: image.dimensions(),
        });
    }
    let off_x = (canvas.width - image.width()) / 2;
    let off_y = (canvas.height - image.height()) / 2;
    Ok(BinaryImage::from_fn(canvas.width, canvas.height, |x, y| {
        let inside = x >= off_x
            && y >= off_y
            && x - off_x < image.width()
            && y - off_y < image.height();
        if inside {
            image.get(x - off_x, y - off_y)
        } else {
            Pixel::Clear
        }
    }))
}

/// Validate a key or an encrypted share.
///
/// Both dimensions must be even and the total/clear cell ratio must lie in
/// [`KEY_RATIO_RANGE`]. An empty image has no cells to judge and passes.
pub fn validate_share(grid: &RgbaImage) -> Result<BinaryImage, VcError> {
    let dims = Dimensions::new(grid.width(), grid.height());
    if !dims.is_even() {
        warn!(%dims, "key or share with odd dimensions");
        return Err(VcError::OddDimension(dims));
    }

    let image = BinaryImage::from_fn(dims.width, dims.height, |x, y| {
        share_pixel(*grid.get_pixel(x, y))
    });
    if image.is_empty() {
        return Ok(image);
    }

    let ratio = image.cells().len() as f64 / image.clear_count() as f64;
    let (low, high) = KEY_RATIO_RANGE;
    if !(low..=high).contains(&ratio) {
        warn!(%dims, ratio, "clear density does not look like a key");
        return Err(VcError::InvalidKeyStructure { ratio });
    }
    Ok(image)
}

/// Bounding box of several images, used to bring covers and secret onto
/// one canvas before hiding.
pub fn bounding_box<I>(sizes: I) -> Dimensions
where
    I: IntoIterator<Item = Dimensions>,
{
    sizes.into_iter().fold(Dimensions::default(), Dimensions::max)
}
