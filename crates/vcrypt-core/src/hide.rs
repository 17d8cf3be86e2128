//! Three-image hiding.
//!
//! Two cover images are turned into two double-resolution images. Each one
//! on its own looks like a faded copy of its cover (3/4 ink where the cover
//! is ink, 2/4 where it is clear). Stacked, a block is full exactly where the
//! secret is ink and 3/4 elsewhere, so [`crate::overlay::decrypt`] of the
//! pair yields the secret.

use rand::seq::SliceRandom;
use rand::{CryptoRng, Rng, RngCore};
use tracing::debug;

use crate::bitmap::{BinaryImage, Block, Pixel};
use crate::error::VcError;
use crate::keygen::key_block;
use crate::rows::map_rows;

/// Block cells in the order the first-image cells are visited:
/// top-left, bottom-left, top-right, bottom-right.
const SCAN_ORDER: [usize; 4] = [0, 2, 1, 3];

/// Hide `secret` in the overlay of `first` and `second`.
///
/// Returns the transformed first and second image, both twice the input
/// size. All three inputs must have the same dimensions.
pub fn hide<R>(
    first: &BinaryImage,
    second: &BinaryImage,
    secret: &BinaryImage,
    rng: &mut R,
) -> Result<(BinaryImage, BinaryImage), VcError>
where
    R: RngCore + CryptoRng + ?Sized,
{
    check_sizes(first, second, secret)?;
    debug!(size = %first.dimensions(), "hiding secret");

    let (a, b): (Vec<Block>, Vec<Block>) = first
        .cells()
        .iter()
        .zip(second.cells())
        .zip(secret.cells())
        .map(|((&f, &s), &t)| hide_block(f, s, t, &mut *rng))
        .unzip();

    Ok((
        BinaryImage::from_blocks(first.dimensions(), &a)?,
        BinaryImage::from_blocks(first.dimensions(), &b)?,
    ))
}

/// Row-parallel [`hide`].
pub fn hide_par<R>(
    first: &BinaryImage,
    second: &BinaryImage,
    secret: &BinaryImage,
    rng: &mut R,
) -> Result<(BinaryImage, BinaryImage), VcError>
where
    R: RngCore + CryptoRng + ?Sized,
{
    check_sizes(first, second, secret)?;
    debug!(size = %first.dimensions(), "hiding secret on the rayon pool");

    let pairs: Vec<(Block, Block)> = map_rows(first.height(), rng, |y, row_rng| {
        (0..first.width())
            .map(|x| {
                hide_block(
                    first.get(x, y),
                    second.get(x, y),
                    secret.get(x, y),
                    &mut *row_rng,
                )
            })
            .collect()
    });
    let (a, b): (Vec<Block>, Vec<Block>) = pairs.into_iter().unzip();

    Ok((
        BinaryImage::from_blocks(first.dimensions(), &a)?,
        BinaryImage::from_blocks(first.dimensions(), &b)?,
    ))
}

fn check_sizes(
    first: &BinaryImage,
    second: &BinaryImage,
    secret: &BinaryImage,
) -> Result<(), VcError> {
    let expected = first.dimensions();
    for other in [second, secret] {
        if other.dimensions() != expected {
            return Err(VcError::DimensionMismatch {
                expected,
                found: other.dimensions(),
            });
        }
    }
    expected.doubled().map(|_| ())
}

/// One block pair. The first block is an ordinary key block for `first`;
/// the second is built around the cells that block leaves clear.
pub(crate) fn hide_block<R: Rng + ?Sized>(
    first: Pixel,
    second: Pixel,
    secret: Pixel,
    rng: &mut R,
) -> (Block, Block) {
    let k1 = key_block(first, &mut *rng);
    let mut cells: [Option<Pixel>; 4] = [None; 4];
    let mut required: usize = if second.is_ink() { 3 } else { 2 };

    // Cover the holes of k1. When the secret is clear one hole stays open,
    // which caps the stacked block at 3/4.
    let mut skip_pending = !secret.is_ink();
    for &i in SCAN_ORDER.iter() {
        if k1[i].is_ink() {
            continue;
        }
        if skip_pending {
            skip_pending = false;
            cells[i] = Some(Pixel::Clear);
            continue;
        }
        cells[i] = Some(Pixel::Ink);
        required = required.saturating_sub(1);
    }

    let mut free: Vec<usize> = SCAN_ORDER
        .iter()
        .copied()
        .filter(|&i| cells[i].is_none())
        .collect();
    free.shuffle(rng);
    for &i in free.iter().take(required) {
        cells[i] = Some(Pixel::Ink);
    }

    (k1, cells.map(|c| c.unwrap_or(Pixel::Clear)))
}
