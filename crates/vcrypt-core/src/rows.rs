use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;

/// Run `f` for every row `0..height` on the rayon pool and concatenate the
/// results in row order.
///
/// Each row gets its own ChaCha20 stream seeded from `rng`, so rows never
/// share generator state and the output does not depend on scheduling.
pub(crate) fn map_rows<R, T, F>(height: u32, rng: &mut R, f: F) -> Vec<T>
where
    R: RngCore + CryptoRng + ?Sized,
    T: Send,
    F: Fn(u32, &mut ChaCha20Rng) -> Vec<T> + Sync,
{
    let streams: Vec<(u32, ChaCha20Rng)> = (0..height)
        .map(|y| {
            let mut seed = <ChaCha20Rng as SeedableRng>::Seed::default();
            rng.fill_bytes(&mut seed);
            (y, ChaCha20Rng::from_seed(seed))
        })
        .collect();

    streams
        .into_par_iter()
        .flat_map_iter(|(y, mut row_rng)| f(y, &mut row_rng))
        .collect()
}
