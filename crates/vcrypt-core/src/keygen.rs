use rand::seq::index;
use rand::{CryptoRng, Rng, RngCore};
use tracing::debug;

use crate::bitmap::{block_cell, BinaryImage, Block, Pixel};
use crate::error::VcError;
use crate::rows::map_rows;

/// Generate a random key able to encrypt images of up to `width` × `height`.
/// The key itself is twice as wide and twice as tall, so either side must be
/// at most [`crate::MAX_LOGICAL_SIDE`].
pub fn generate_key<R>(width: u32, height: u32, rng: &mut R) -> Result<BinaryImage, VcError>
where
    R: RngCore + CryptoRng + ?Sized,
{
    generate_key_for(&BinaryImage::blank(width, height), rng)
}

/// Generate a key patterned after `cover`: ink pixels of the cover become
/// 3-of-4 blocks, clear pixels 2-of-4 blocks, so the key alone shows a
/// washed out copy of the cover. A blank cover yields a plain random key.
pub fn generate_key_for<R>(cover: &BinaryImage, rng: &mut R) -> Result<BinaryImage, VcError>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let key_size = cover.dimensions().doubled()?;
    debug!(cover = %cover.dimensions(), key = %key_size, "generating key");
    let blocks: Vec<Block> = cover
        .cells()
        .iter()
        .map(|&p| key_block(p, &mut *rng))
        .collect();
    BinaryImage::from_blocks(cover.dimensions(), &blocks)
}

/// Row-parallel [`generate_key_for`].
pub fn generate_key_for_par<R>(cover: &BinaryImage, rng: &mut R) -> Result<BinaryImage, VcError>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let key_size = cover.dimensions().doubled()?;
    debug!(cover = %cover.dimensions(), key = %key_size, "generating key on the rayon pool");
    let blocks: Vec<Block> = map_rows(cover.height(), rng, |y, row_rng| {
        (0..cover.width())
            .map(|x| key_block(cover.get(x, y), &mut *row_rng))
            .collect()
    });
    BinaryImage::from_blocks(cover.dimensions(), &blocks)
}

/// Key block for one logical pixel.
///
/// Clear: two distinct cells, uniformly chosen, are inked.
/// Ink: one cell is drawn to stay clear; the full column and the full row
/// not containing it are inked.
pub(crate) fn key_block<R: Rng + ?Sized>(pixel: Pixel, rng: &mut R) -> Block {
    let mut block = [Pixel::Clear; 4];
    match pixel {
        Pixel::Clear => {
            for i in index::sample(rng, 4, 2) {
                block[i] = Pixel::Ink;
            }
        }
        Pixel::Ink => {
            let spared = rng.gen_range(0..4usize);
            let row_black = if spared < 2 { 1 } else { 0 };
            let col_black = if spared % 2 == 0 { 1 } else { 0 };
            for (i, cell) in block.iter_mut().enumerate() {
                let (col, row) = block_cell(i);
                if col == col_black || row == row_black {
                    *cell = Pixel::Ink;
                }
            }
        }
    }
    block
}
