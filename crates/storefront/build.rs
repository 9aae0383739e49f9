//! Build script for the storefront crate.
//!
//! Fingerprints the static stylesheet and script so templates can link to
//! immutable, content-addressed copies under `static/*/derived/`.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

/// (source path relative to the crate, derived directory, env var name)
const ASSETS: &[(&str, &str, &str)] = &[
    ("static/css/main.css", "static/css/derived", "CSS_HASH"),
    ("static/js/app.js", "static/js/derived", "JS_HASH"),
];

fn main() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");
    let root = Path::new(&manifest_dir);

    for (source, derived, var) in ASSETS {
        fingerprint(root, source, derived, var);
    }
}

/// Copy `source` to `derived/<stem>.<hash>.<ext>` and export the short hash as `var`.
fn fingerprint(root: &Path, source: &str, derived: &str, var: &str) {
    let path = root.join(source);
    println!("cargo:rerun-if-changed={}", path.display());

    let Ok(content) = fs::read(&path) else {
        println!("cargo:warning=Could not read {source}, serving it unhashed");
        println!("cargo:rustc-env={var}=");
        return;
    };

    let digest = format!("{:x}", Sha256::digest(&content));
    let short_hash = digest.get(..8).unwrap_or(&digest);
    println!("cargo:rustc-env={var}={short_hash}");

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .expect("asset file name is valid UTF-8");
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .expect("asset has an extension");

    let derived_dir = root.join(derived);
    fs::create_dir_all(&derived_dir).expect("Failed to create derived asset directory");
    fs::copy(&path, derived_dir.join(format!("{stem}.{short_hash}.{ext}")))
        .expect("Failed to copy asset to derived directory");
}
