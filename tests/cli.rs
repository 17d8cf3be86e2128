use std::fs;
use std::path::Path;

use assert_cmd::Command;
use image::{Rgba, RgbaImage};
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn cmd() -> Command {
    Command::cargo_bin("vcrypt").expect("vcrypt binary")
}

/// Black diagonal cross on white.
fn write_cross(path: &Path, size: u32) {
    let img = RgbaImage::from_fn(size, size, |x, y| {
        if x == y || x + y + 1 == size {
            BLACK
        } else {
            WHITE
        }
    });
    img.save(path).expect("write fixture");
}

/// Black bar over the left `cols` columns.
fn write_bars(path: &Path, width: u32, height: u32, cols: u32) {
    let img = RgbaImage::from_fn(width, height, |x, _| if x < cols { BLACK } else { WHITE });
    img.save(path).expect("write fixture");
}

/// Ink cells of an image written by the CLI (opaque black on transparent).
fn ink_mask(path: &Path) -> Vec<bool> {
    let img = image::open(path).expect("open output").to_rgba8();
    img.pixels().map(|p| p[3] != 0).collect()
}

/// Black pixels of a fixture.
fn source_mask(path: &Path) -> Vec<bool> {
    let img = image::open(path).expect("open fixture").to_rgba8();
    img.pixels().map(|p| *p == BLACK).collect()
}

fn run_json(args: &[&str]) -> Value {
    let out = cmd()
        .arg("--json")
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&out).expect("valid json output")
}

fn p(path: &Path) -> &str {
    path.to_str().expect("utf8 path")
}

#[test]
fn split_verify_decrypt() {
    let tmp = TempDir::new().expect("tempdir");
    let source = tmp.path().join("secret.png");
    let pair = tmp.path().join("pair");
    let out = tmp.path().join("recovered.png");
    write_cross(&source, 9);

    let report = run_json(&["split", "--source", p(&source), "--out-dir", p(&pair)]);
    assert_eq!(report["action"], "split");
    assert_eq!(report["written"][0]["width"], 18);
    assert!(pair.join("manifest.json").exists());

    cmd()
        .args(["verify", p(&pair)])
        .assert()
        .success()
        .stdout(contains("verify: OK"));

    cmd()
        .args([
            "decrypt",
            "--key",
            p(&pair.join("key.png")),
            "--share",
            p(&pair.join("share.png")),
            "--out",
            p(&out),
        ])
        .assert()
        .success();

    assert_eq!(ink_mask(&out), source_mask(&source));
}

#[test]
fn keygen_then_encrypt_centres_small_sources() {
    let tmp = TempDir::new().expect("tempdir");
    let key = tmp.path().join("key.png");
    let source = tmp.path().join("small.png");
    let share = tmp.path().join("share.png");
    let out = tmp.path().join("out.png");
    write_bars(&source, 2, 2, 2);

    cmd()
        .args(["keygen", "--width", "4", "--height", "4", "--out", p(&key)])
        .assert()
        .success();
    cmd()
        .args(["encrypt", "--key", p(&key), "--source", p(&source), "--out", p(&share)])
        .assert()
        .success();
    cmd()
        .args(["decrypt", "--key", p(&key), "--share", p(&share), "--out", p(&out)])
        .assert()
        .success();

    // the key covers 4x4 secrets, so the 2x2 block lands at offset (1, 1)
    let mask = ink_mask(&out);
    assert_eq!(mask.len(), 16);
    for y in 0..4 {
        for x in 0..4 {
            let inside = (1..3).contains(&x) && (1..3).contains(&y);
            assert_eq!(mask[y * 4 + x], inside, "cell ({x}, {y})");
        }
    }

    cmd()
        .args([
            "encrypt",
            "--key",
            p(&key),
            "--source",
            p(&source),
            "--out",
            p(&share),
            "--no-resize",
        ])
        .assert()
        .failure()
        .stderr(contains("does not match key"));
}

#[test]
fn oversize_source_is_refused() {
    let tmp = TempDir::new().expect("tempdir");
    let key = tmp.path().join("key.png");
    let source = tmp.path().join("big.png");
    write_bars(&source, 6, 2, 1);

    cmd()
        .args(["keygen", "--width", "4", "--height", "4", "--out", p(&key)])
        .assert()
        .success();
    cmd()
        .args([
            "encrypt",
            "--key",
            p(&key),
            "--source",
            p(&source),
            "--out",
            p(&tmp.path().join("share.png")),
        ])
        .assert()
        .failure()
        .stderr(contains("does not fit"));
}

#[test]
fn hide_and_reveal() {
    let tmp = TempDir::new().expect("tempdir");
    let first = tmp.path().join("first.png");
    let second = tmp.path().join("second.png");
    let secret = tmp.path().join("secret.png");
    let out_first = tmp.path().join("a.png");
    let out_second = tmp.path().join("b.png");
    let revealed = tmp.path().join("revealed.png");
    write_bars(&first, 8, 8, 3);
    write_bars(&second, 8, 6, 5);
    write_cross(&secret, 8);

    let report = run_json(&[
        "--parallel",
        "hide",
        "--first",
        p(&first),
        "--second",
        p(&second),
        "--secret",
        p(&secret),
        "--out-first",
        p(&out_first),
        "--out-second",
        p(&out_second),
    ]);
    assert_eq!(report["written"][0]["width"], 16);
    assert_eq!(report["written"][1]["height"], 16);

    cmd()
        .args([
            "decrypt",
            "--key",
            p(&out_first),
            "--share",
            p(&out_second),
            "--out",
            p(&revealed),
        ])
        .assert()
        .success();
    assert_eq!(ink_mask(&revealed), source_mask(&secret));
}

#[test]
fn stego_key_and_overlay_only() {
    let tmp = TempDir::new().expect("tempdir");
    let cover = tmp.path().join("cover.png");
    let key = tmp.path().join("key.png");
    let stacked = tmp.path().join("stacked.png");
    write_bars(&cover, 5, 3, 2);

    cmd()
        .args(["keygen", "--stego", p(&cover), "--out", p(&key)])
        .assert()
        .success();
    cmd()
        .args([
            "decrypt",
            "--key",
            p(&key),
            "--share",
            p(&key),
            "--out",
            p(&stacked),
            "--overlay-only",
        ])
        .assert()
        .success();

    // overlaying a key with itself changes nothing
    assert_eq!(ink_mask(&stacked), ink_mask(&key));
    let ink = ink_mask(&key).into_iter().filter(|&b| b).count();
    // 2 cover columns * 3 rows at 3/4, the rest at 2/4
    assert_eq!(ink, 6 * 3 + 9 * 2);
}

#[test]
fn tampered_pair_fails_verification() {
    let tmp = TempDir::new().expect("tempdir");
    let source = tmp.path().join("secret.png");
    let pair = tmp.path().join("pair");
    write_cross(&source, 4);

    cmd()
        .args(["split", "--source", p(&source), "--out-dir", p(&pair)])
        .assert()
        .success();
    fs::copy(pair.join("key.png"), pair.join("share.png")).expect("overwrite share");

    cmd()
        .args(["verify", p(&pair)])
        .assert()
        .failure()
        .stderr(contains("does not match the manifest"));
}

#[test]
fn non_key_files_are_rejected() {
    let tmp = TempDir::new().expect("tempdir");
    let black = tmp.path().join("black.png");
    let odd = tmp.path().join("odd.png");
    RgbaImage::from_pixel(4, 4, BLACK).save(&black).expect("write");
    RgbaImage::from_pixel(3, 4, WHITE).save(&odd).expect("write");

    for bad in [&black, &odd] {
        cmd()
            .args([
                "decrypt",
                "--key",
                p(bad),
                "--share",
                p(bad),
                "--out",
                p(&tmp.path().join("x.png")),
            ])
            .assert()
            .failure()
            .stderr(contains("is not a usable key or share"));
    }
}

#[test]
fn keygen_refuses_sides_that_cannot_be_doubled() {
    let tmp = TempDir::new().expect("tempdir");
    let key = tmp.path().join("key.png");
    cmd()
        .args(["keygen", "--width", "2147483648", "--height", "0", "--out", p(&key)])
        .assert()
        .failure()
        .stderr(contains("2147483648"));
    assert!(!key.exists());
}

#[test]
fn verify_stays_inside_the_pair_directory() {
    let tmp = TempDir::new().expect("tempdir");
    let source = tmp.path().join("secret.png");
    let pair = tmp.path().join("pair");
    write_cross(&source, 4);

    cmd()
        .args(["split", "--source", p(&source), "--out-dir", p(&pair)])
        .assert()
        .success();
    fs::copy(pair.join("share.png"), tmp.path().join("share.png")).expect("copy share");

    let manifest_path = pair.join("manifest.json");
    let mut manifest: Value =
        serde_json::from_slice(&fs::read(&manifest_path).expect("read manifest")).expect("json");
    manifest["share_file"] = Value::from("../share.png");
    fs::write(&manifest_path, serde_json::to_vec(&manifest).expect("json")).expect("write manifest");

    cmd()
        .args(["verify", p(&pair)])
        .assert()
        .failure()
        .stderr(contains("not a plain file name"));
}
