#![allow(dead_code)]

use std::path::PathBuf;

use santorini_ngin::{MeshRegistry, resources::texture::ImageTextures};

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The meshes shipped with the crate.
pub(crate) fn asset_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join("objects")
}

pub(crate) fn fixture_dir(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Loads every board mesh with CPU-side textures.
pub(crate) fn load_board() -> (MeshRegistry, ImageTextures) {
    init_logger();
    let mut textures = ImageTextures::new();
    let registry = MeshRegistry::load(&asset_dir(), &mut textures).expect("assets load");
    (registry, textures)
}
