//! Parsed mesh and material data.
//!
//! These are the plain arrays the OBJ/MTL readers fill in. Nothing here touches
//! a renderer; [`CompiledMesh`](super::compiled::CompiledMesh) turns an
//! [`ObjMesh`] into something drawable.

use std::{collections::HashMap, path::PathBuf};

/// Handle of a texture that was uploaded by a
/// [`TextureLoader`](crate::resources::texture::TextureLoader).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// A polygon of three or more corners.
///
/// The three index lists run in parallel and are 1-based; `0` in `normals` or
/// `texcoords` means the corner has no such attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct Face {
    pub vertices: Vec<usize>,
    pub normals: Vec<usize>,
    pub texcoords: Vec<usize>,
    pub material: Option<String>,
}

impl Face {
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// A named material from an `.mtl` file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Material {
    pub name: String,
    /// Numeric records such as `Kd`, `Ka`, `Ns`, keyed by record tag.
    pub attributes: HashMap<String, Vec<f32>>,
    /// The `map_Kd` path as resolved on disk.
    pub diffuse_map: Option<PathBuf>,
    pub texture: Option<TextureId>,
}

impl Material {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// The `Kd` colour, if the material declares at least three components.
    pub fn diffuse(&self) -> Option<[f32; 3]> {
        match self.attributes.get("Kd").map(Vec::as_slice) {
            Some([r, g, b, ..]) => Some([*r, *g, *b]),
            _ => None,
        }
    }
}

pub type MaterialLibrary = HashMap<String, Material>;

/// Everything read from one `.obj` file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 2]>,
    pub faces: Vec<Face>,
    pub materials: Option<MaterialLibrary>,
}

impl ObjMesh {
    /// Looks up the material a face was declared with.
    pub fn material_of(&self, face: &Face) -> Option<&Material> {
        let name = face.material.as_ref()?;
        self.materials.as_ref()?.get(name)
    }
}

/// Vertex types that know their GPU buffer layout.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}
