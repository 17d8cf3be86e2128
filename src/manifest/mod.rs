use std::fs;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use vcrypt_core::{codec, Dimensions, VcError};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const MANIFEST_VERSION: u8 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("unsupported manifest version {0}")]
    UnsupportedVersion(u8),
    #[error("digest of {file} does not match the manifest")]
    DigestMismatch { file: String },
    #[error("{file} is {found}, manifest expects {expected}")]
    SizeMismatch {
        file: String,
        expected: Dimensions,
        found: Dimensions,
    },
    #[error("{0:?} is not a plain file name")]
    UnsafeFileName(String),
    #[error("{file}: {source}")]
    Image {
        file: String,
        #[source]
        source: VcError,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Records which key belongs to which share. `width`/`height` are the
/// logical (secret) dimensions; both images are twice that.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PairManifest {
    pub version: u8,
    pub width: u32,
    pub height: u32,
    pub key_file: String,
    pub key_sha256: String,
    pub share_file: String,
    pub share_sha256: String,
}

impl PairManifest {
    pub fn new(
        logical: Dimensions,
        key_file: &str,
        key_png: &[u8],
        share_file: &str,
        share_png: &[u8],
    ) -> Self {
        Self {
            version: MANIFEST_VERSION,
            width: logical.width,
            height: logical.height,
            key_file: key_file.to_string(),
            key_sha256: sha256_hex(key_png),
            share_file: share_file.to_string(),
            share_sha256: sha256_hex(share_png),
        }
    }

    pub fn logical(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    pub fn write(&self, dir: &Path) -> Result<(), ManifestError> {
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(dir.join(MANIFEST_FILE), json)?;
        Ok(())
    }

    pub fn read(dir: &Path) -> Result<Self, ManifestError> {
        let bytes = fs::read(dir.join(MANIFEST_FILE))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Re-hash both images in `dir` and check their size and structure.
    pub fn verify(&self, dir: &Path) -> Result<(), ManifestError> {
        if self.version != MANIFEST_VERSION {
            return Err(ManifestError::UnsupportedVersion(self.version));
        }
        let expected = self
            .logical()
            .doubled()
            .map_err(|source| ManifestError::Image {
                file: MANIFEST_FILE.to_string(),
                source,
            })?;
        for (file, digest) in [
            (&self.key_file, &self.key_sha256),
            (&self.share_file, &self.share_sha256),
        ] {
            if !is_plain_file_name(file) {
                return Err(ManifestError::UnsafeFileName(file.clone()));
            }
            let bytes = fs::read(dir.join(file))?;
            if !sha256_hex(&bytes).eq_ignore_ascii_case(digest) {
                return Err(ManifestError::DigestMismatch { file: file.clone() });
            }
            let image = codec::load_share(&bytes).map_err(|source| ManifestError::Image {
                file: file.clone(),
                source,
            })?;
            if image.dimensions() != expected {
                return Err(ManifestError::SizeMismatch {
                    file: file.clone(),
                    expected,
                    found: image.dimensions(),
                });
            }
        }
        Ok(())
    }
}

/// A single normal path component: no separators, no `..`, not absolute.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
