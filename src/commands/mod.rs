use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rand::rngs::OsRng;
use serde::Serialize;
use tracing::{debug, info};
use vcrypt_core::validate::bounding_box;
use vcrypt_core::{codec, hide, keygen, overlay, share, BinaryImage, Dimensions};

use crate::manifest::PairManifest;

pub const KEY_FILE: &str = "key.png";
pub const SHARE_FILE: &str = "share.png";

/// Settings shared by every subcommand.
#[derive(Clone, Copy, Debug, Default)]
pub struct Options {
    /// Spread rows over the rayon pool.
    pub parallel: bool,
}

#[derive(Debug, Serialize)]
pub struct Written {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// What a subcommand did, printed as one line or as JSON.
#[derive(Debug, Serialize)]
pub struct Report {
    pub action: &'static str,
    pub written: Vec<Written>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

impl Report {
    fn new(action: &'static str) -> Self {
        Self {
            action,
            written: Vec::new(),
            verified: None,
        }
    }

    pub fn summary(&self) -> String {
        if self.verified == Some(true) {
            return format!("{}: OK", self.action);
        }
        let files: Vec<String> = self
            .written
            .iter()
            .map(|w| format!("{} ({}x{})", w.path.display(), w.width, w.height))
            .collect();
        format!("{} → {}", self.action, files.join(", "))
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn write_png(path: &Path, image: &BinaryImage, report: &mut Report) -> Result<Vec<u8>> {
    let png = codec::encode_png(image).with_context(|| format!("encoding {}", path.display()))?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    fs::write(path, &png).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), size = %image.dimensions(), "wrote image");
    report.written.push(Written {
        path: path.to_path_buf(),
        width: image.width(),
        height: image.height(),
    });
    Ok(png)
}

fn load_share(path: &Path) -> Result<BinaryImage> {
    let bytes = read_bytes(path)?;
    codec::load_share(&bytes).with_context(|| format!("{} is not a usable key or share", path.display()))
}

fn patterned_key(cover: &BinaryImage, opts: Options) -> Result<BinaryImage> {
    let key = if opts.parallel {
        keygen::generate_key_for_par(cover, &mut OsRng)?
    } else {
        keygen::generate_key_for(cover, &mut OsRng)?
    };
    Ok(key)
}

/// Random key for `width` × `height` secrets, or a key patterned after a
/// cover image.
pub fn keygen(
    width: Option<u32>,
    height: Option<u32>,
    stego: Option<&Path>,
    out: &Path,
    opts: Options,
) -> Result<Report> {
    let cover = match (stego, width, height) {
        (Some(path), _, _) => {
            let bytes = read_bytes(path)?;
            codec::load_source(&bytes, None, false)
                .with_context(|| format!("loading cover {}", path.display()))?
        }
        (None, Some(w), Some(h)) => BinaryImage::blank(w, h),
        _ => bail!("either --stego or both --width and --height are required"),
    };
    debug!(cover = %cover.dimensions(), "generating key");
    let key = patterned_key(&cover, opts)?;

    let mut report = Report::new("keygen");
    write_png(out, &key, &mut report)?;
    Ok(report)
}

/// Encrypt a source image against an existing key.
pub fn encrypt(key_path: &Path, source_path: &Path, out: &Path, resize: bool) -> Result<Report> {
    let key = load_share(key_path)?;
    let target = key.dimensions().halved();
    let source_bytes = read_bytes(source_path)?;
    let source = codec::load_source(&source_bytes, Some(target), resize)
        .with_context(|| format!("loading source {}", source_path.display()))?;
    let encrypted = share::encrypt(&key, &source)
        .with_context(|| format!("{} does not match key {}", source_path.display(), key_path.display()))?;

    let mut report = Report::new("encrypt");
    write_png(out, &encrypted, &mut report)?;
    Ok(report)
}

/// Generate a key sized to the source and encrypt in one go. Writes the
/// pair and a manifest tying them together into `out_dir`.
pub fn split(source_path: &Path, out_dir: &Path, opts: Options) -> Result<Report> {
    let source_bytes = read_bytes(source_path)?;
    let source = codec::load_source(&source_bytes, None, false)
        .with_context(|| format!("loading source {}", source_path.display()))?;
    let key = patterned_key(&BinaryImage::blank(source.width(), source.height()), opts)?;
    let encrypted = share::encrypt(&key, &source)?;

    let mut report = Report::new("split");
    let key_png = write_png(&out_dir.join(KEY_FILE), &key, &mut report)?;
    let share_png = write_png(&out_dir.join(SHARE_FILE), &encrypted, &mut report)?;

    let manifest = PairManifest::new(source.dimensions(), KEY_FILE, &key_png, SHARE_FILE, &share_png);
    manifest
        .write(out_dir)
        .with_context(|| format!("writing manifest into {}", out_dir.display()))?;
    Ok(report)
}

pub struct HidePaths<'a> {
    pub first: &'a Path,
    pub second: &'a Path,
    pub secret: &'a Path,
    pub out_first: &'a Path,
    pub out_second: &'a Path,
}

/// Bring the three images onto a common canvas and hide the secret in the
/// overlay of the two covers.
pub fn hide(paths: HidePaths<'_>, opts: Options) -> Result<Report> {
    let inputs = [paths.first, paths.second, paths.secret]
        .into_iter()
        .map(read_bytes)
        .collect::<Result<Vec<_>>>()?;

    let sizes = inputs
        .iter()
        .map(|bytes| codec::probe_dimensions(bytes))
        .collect::<Result<Vec<Dimensions>, _>>()?;
    let canvas = bounding_box(sizes);
    debug!(%canvas, "common canvas");

    let images = inputs
        .iter()
        .zip([paths.first, paths.second, paths.secret])
        .map(|(bytes, path)| {
            codec::load_source(bytes, Some(canvas), true)
                .with_context(|| format!("{} is not fit for hiding", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let (a, b) = if opts.parallel {
        hide::hide_par(&images[0], &images[1], &images[2], &mut OsRng)?
    } else {
        hide::hide(&images[0], &images[1], &images[2], &mut OsRng)?
    };

    let mut report = Report::new("hide");
    write_png(paths.out_first, &a, &mut report)?;
    write_png(paths.out_second, &b, &mut report)?;
    Ok(report)
}

/// Stack key and share. Writes the cleaned up secret, or the raw overlay
/// with `overlay_only`.
pub fn decrypt(key_path: &Path, share_path: &Path, out: &Path, overlay_only: bool) -> Result<Report> {
    let key = load_share(key_path)?;
    let encrypted = load_share(share_path)?;
    let stacked = overlay::overlay(&key, &encrypted)
        .with_context(|| format!("{} and {} do not belong together", key_path.display(), share_path.display()))?;
    let result = if overlay_only {
        stacked
    } else {
        overlay::reconstruct(&stacked)?
    };

    let mut report = Report::new(if overlay_only { "overlay" } else { "decrypt" });
    write_png(out, &result, &mut report)?;
    Ok(report)
}

/// Check a directory written by [`split`] against its manifest.
pub fn verify(dir: &Path) -> Result<Report> {
    let manifest = PairManifest::read(dir)
        .with_context(|| format!("reading manifest in {}", dir.display()))?;
    manifest
        .verify(dir)
        .with_context(|| format!("verifying {}", dir.display()))?;
    info!(logical = %manifest.logical(), "pair verified");

    let mut report = Report::new("verify");
    report.verified = Some(true);
    Ok(report)
}
