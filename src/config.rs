//! Runtime configuration.
//!
//! Everything has a sensible default; a handful of environment variables can
//! override the asset location and the viewport size.

use std::path::PathBuf;

/// Default number of random draws before worker placement gives up.
pub const DEFAULT_PLACEMENT_ATTEMPTS: usize = 25;
/// Largest viewport side, `wgpu`'s default `max_texture_dimension_2d`.
pub const MAX_DIMENSION: u32 = 8192;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding the `.obj`/`.mtl` files and their textures.
    pub asset_dir: PathBuf,
    pub width: u32,
    pub height: u32,
    pub clear_colour: [f64; 4],
    pub placement_attempts: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("./").join("assets").join("objects"),
            width: 1200,
            height: 800,
            // sky blue
            clear_colour: [0.45, 0.7, 0.9, 1.0],
            placement_attempts: DEFAULT_PLACEMENT_ATTEMPTS,
        }
    }
}

impl Config {
    /// Reads `SANTORINI_ASSETS`, `SANTORINI_WIDTH` and `SANTORINI_HEIGHT`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(dir) = lookup("SANTORINI_ASSETS") {
            config.asset_dir = PathBuf::from(dir);
        }
        let parse_dim = |key: &str| -> Option<u32> {
            let raw = lookup(key)?;
            match raw.parse::<u32>() {
                Ok(v) if v > MAX_DIMENSION => {
                    log::warn!("Clamping {key}={raw} to {MAX_DIMENSION}");
                    Some(MAX_DIMENSION)
                }
                Ok(v) if v > 0 => Some(v),
                _ => {
                    log::warn!("Ignoring invalid {key}={raw}");
                    None
                }
            }
        };
        if let Some(width) = parse_dim("SANTORINI_WIDTH") {
            config.width = width;
        }
        if let Some(height) = parse_dim("SANTORINI_HEIGHT") {
            config.height = height;
        }
        config
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}
