//! Core primitives for 2-of-2 visual cryptography.
//!
//! Every secret pixel is expanded into a 2×2 block of cells. A key carries
//! two ink cells per block for a clear pixel and three for an ink pixel; a
//! share is built against its key so that stacking the two printouts fills
//! the block completely exactly where the secret was ink.
//!
//! * [`bitmap`]: the two-state [`BinaryImage`] every operation works on.
//! * [`validate`]: thresholding of decoded RGBA grids and the structural
//!   checks applied to sources, keys and shares.
//! * [`keygen`]: random and cover-patterned key generation.
//! * [`share`]: source + key → share.
//! * [`overlay`]: stacking of two images and collapsing of an overlay back
//!   into the secret.
//! * [`hide`]: embeds a secret into the overlay of two meaningful covers.
//! * [`codec`]: PNG bytes in and out, built on the `image` crate.
//!
//! Randomised operations take the generator by reference. Production code
//! passes [`rand::rngs::OsRng`]; the `*_par` variants fork one ChaCha20
//! stream per row from it and spread rows over the rayon pool.

pub mod bitmap;
pub mod codec;
pub mod hide;
pub mod keygen;
pub mod overlay;
pub mod share;
pub mod validate;

mod error;
mod rows;

pub use error::VcError;
pub use bitmap::{BinaryImage, Block, Dimensions, Pixel, MAX_LOGICAL_SIDE};
