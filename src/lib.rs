//! santorini-ngin
//!
//! A small renderer for a Santorini-style board: a 5x5 grid of stacked
//! building levels, worker pieces and colour-buffer picking. Meshes are read
//! from OBJ/MTL files once, compiled into immutable draw commands and replayed
//! into a headless `wgpu` device, or into a CPU rasteriser where no adapter is
//! available.
//!
//! High-level modules
//! - `camera`: orbiting camera and projection helpers
//! - `config`: defaults and environment overrides
//! - `context`: headless GPU device, queue and off-screen targets
//! - `data_structures`: parsed meshes, compiled meshes, the mesh registry, placements
//! - `error`: load and placement errors
//! - `game`: board heights, workers and the player
//! - `pick`: identifier colours and the pick pass
//! - `pipelines`: the mesh render pipeline
//! - `render`: draw targets (GPU, CPU fallback and a recorder for tests)
//! - `resources`: OBJ/MTL readers and texture loading
//! - `scene`: where each mesh is placed in the world
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod game;
pub mod pick;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use config::Config;
pub use data_structures::{
    compiled::{BindState, CompiledMesh},
    instance::Instance,
    registry::MeshRegistry,
};
pub use error::{LoadError, LoadResult, PlacementError};
pub use game::{Board, Player, Worker};
pub use render::{DrawTarget, FrameTarget, PickSurface};
