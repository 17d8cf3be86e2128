use tracing::debug;

use crate::bitmap::{BinaryImage, Pixel};
use crate::error::VcError;

/// Encrypt `source` against `key`, producing the share that completes it.
///
/// The source must be exactly half the key in both directions. It is
/// replicated nearest-neighbour onto the key grid; under an ink pixel the
/// share inks the cells the key left clear (the stacked block is full),
/// under a clear pixel it copies the key (the stacked block stays at 2/4).
pub fn encrypt(key: &BinaryImage, source: &BinaryImage) -> Result<BinaryImage, VcError> {
    let expected = key.dimensions().halved();
    if source.dimensions() != expected || !key.dimensions().is_even() {
        return Err(VcError::DimensionMismatch {
            expected,
            found: source.dimensions(),
        });
    }
    debug!(key = %key.dimensions(), "encrypting source");

    Ok(BinaryImage::from_fn(key.width(), key.height(), |x, y| {
        let cell = key.get(x, y);
        match source.get(x / 2, y / 2) {
            Pixel::Ink => cell.inverted(),
            Pixel::Clear => cell,
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::block_ink_count;
    use crate::keygen::generate_key;
    use crate::Dimensions;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn share_copies_key_under_clear_pixels() {
        let mut rng = StdRng::seed_from_u64(21);
        let key = generate_key(4, 3, &mut rng).expect("key");
        let share = encrypt(&key, &BinaryImage::blank(4, 3)).expect("encrypt");
        assert_eq!(share, key);
    }

    #[test]
    fn share_complements_key_under_ink_pixels() {
        let mut rng = StdRng::seed_from_u64(22);
        let key = generate_key(3, 3, &mut rng).expect("key");
        let source = BinaryImage::from_fn(3, 3, |_, _| Pixel::Ink);
        let share = encrypt(&key, &source).expect("encrypt");
        for by in 0..3 {
            for bx in 0..3 {
                let k = key.block(bx, by);
                let s = share.block(bx, by);
                assert_eq!(block_ink_count(&s), 2);
                for i in 0..4 {
                    assert_ne!(k[i], s[i]);
                }
            }
        }
    }

    #[test]
    fn wrong_source_size_is_rejected() {
        let mut rng = StdRng::seed_from_u64(23);
        let key = generate_key(4, 4, &mut rng).expect("key");
        let err = encrypt(&key, &BinaryImage::blank(4, 3)).expect_err("mismatch");
        match err {
            VcError::DimensionMismatch { expected, found } => {
                assert_eq!(expected, Dimensions::new(4, 4));
                assert_eq!(found, Dimensions::new(4, 3));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn odd_key_never_matches() {
        let key = BinaryImage::blank(5, 4);
        assert!(matches!(
            encrypt(&key, &BinaryImage::blank(2, 2)),
            Err(VcError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn empty_key_gives_empty_share() {
        let share = encrypt(&BinaryImage::blank(0, 0), &BinaryImage::blank(0, 0)).expect("encrypt");
        assert!(share.is_empty());
    }
}
