use thiserror::Error;

use crate::bitmap::Dimensions;

/// Canonical error type exposed by the codec.
#[derive(Debug, Error)]
pub enum VcError {
    /// Two images that must be combined do not have related sizes.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        expected: Dimensions,
        found: Dimensions,
    },

    /// Doubling these logical dimensions does not fit in `u32`.
    #[error("{0} is too large to expand into 2x2 blocks")]
    TooLarge(Dimensions),

    /// Block-level operations need even width and height.
    #[error("width and height must be even, found {0}")]
    OddDimension(Dimensions),

    /// The total/clear cell ratio of a key or share is outside `[2, 4]`.
    #[error("not a key or share: total/clear ratio {ratio:.3} outside [2, 4]")]
    InvalidKeyStructure { ratio: f64 },

    /// Source image larger than the box it has to be placed in.
    #[error("source of {found} does not fit into {limit}")]
    OversizeSource { limit: Dimensions, found: Dimensions },

    /// Raw cell buffer does not match the announced dimensions.
    #[error("cell buffer holds {found} cells, {expected} expected")]
    CellCount { expected: usize, found: usize },

    /// Raw bytes could not be turned into a pixel grid.
    #[error("unable to decode image: {0}")]
    DecodeFailure(#[source] image::ImageError),

    /// A binary image could not be written out.
    #[error("unable to encode image: {0}")]
    EncodeFailure(#[source] image::ImageError),
}
