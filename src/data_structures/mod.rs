//! Engine data structures: parsed meshes, compiled meshes, textures and placements.
//!
//! - `model` holds what the OBJ/MTL readers produce
//! - `compiled` turns a parsed mesh into an immutable command list
//! - `registry` owns the fixed set of board meshes
//! - `instance` describes where a mesh is drawn
//! - `texture` wraps GPU textures

pub mod compiled;
pub mod instance;
pub mod model;
pub mod registry;
pub mod texture;
