//! Build script for magic-core
//!
//! Generates the embedded helper table. Each helper binary is taken from
//! `MAGIC_EMBEDDED_HELPERS_DIR` when that directory provides it, otherwise
//! the stand-in script under `assets/helpers` is embedded and flagged as such.

use std::env;
use std::fmt::Write as _;
use std::path::PathBuf;

const HELPERS_DIR_ENV: &str = "MAGIC_EMBEDDED_HELPERS_DIR";

/// Sorted by name
const HELPERS: &[&str] = &[
    "docker-credential-acr-env",
    "docker-credential-ecr-login",
    "docker-credential-gcr",
    "docker-credential-magic",
];

fn main() {
    println!("cargo:rerun-if-env-changed={}", HELPERS_DIR_ENV);

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let bundled = manifest_dir.join("assets").join("helpers");
    let provided = env::var_os(HELPERS_DIR_ENV)
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from);

    let mut table = String::from("&[\n");
    for name in HELPERS {
        let real = provided
            .as_ref()
            .map(|dir| dir.join(name))
            .filter(|path| path.is_file());
        let (path, placeholder) = match real {
            Some(path) => (path, false),
            None => (bundled.join(name), true),
        };
        println!("cargo:rerun-if-changed={}", path.display());
        writeln!(
            table,
            "    EmbeddedAsset {{ name: {:?}, contents: include_bytes!({:?}), placeholder: {} }},",
            name,
            path.display().to_string(),
            placeholder
        )
        .unwrap();
    }
    table.push_str("]\n");

    std::fs::write(out_dir.join("embedded_helpers.rs"), table).unwrap();
}
