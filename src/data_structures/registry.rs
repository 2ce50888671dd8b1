//! The fixed set of board meshes, loaded once at startup.

use std::{collections::HashMap, path::Path};

use cgmath::Matrix4;

use crate::{
    data_structures::compiled::{BindState, CompiledMesh},
    error::LoadResult,
    render::DrawTarget,
    resources::{load_model_obj, obj::ObjOptions, texture::TextureLoader},
};

/// Every mesh the board needs: (registry key, swap Y/Z on load).
///
/// The terrain tile is read with Y and Z exchanged; the scene turns it back
/// with a -90° rotation about X.
pub const BOARD_MESHES: [(&str, bool); 8] = [
    ("field", true),
    ("level1_v1", false),
    ("level1_v2", false),
    ("level1_v3", false),
    ("level2_v1", false),
    ("level3", false),
    ("dome", false),
    ("worker", false),
];

/// Owns every [`CompiledMesh`] for the lifetime of the program.
#[derive(Debug, Default)]
pub struct MeshRegistry {
    meshes: HashMap<String, CompiledMesh>,
}

impl MeshRegistry {
    /// Loads all [`BOARD_MESHES`] from `<dir>/<name>.obj`. Any missing or
    /// malformed file aborts the whole load.
    pub fn load(dir: &Path, textures: &mut dyn TextureLoader) -> LoadResult<Self> {
        let mut meshes = HashMap::with_capacity(BOARD_MESHES.len());
        for (name, swap_yz) in BOARD_MESHES {
            let path = dir.join(format!("{name}.obj"));
            let mesh = load_model_obj(&path, ObjOptions { swap_yz }, textures)?;
            meshes.insert(name.to_string(), mesh);
        }
        log::info!("Mesh registry ready with {} meshes", meshes.len());
        Ok(Self { meshes })
    }

    pub fn insert(&mut self, name: &str, mesh: CompiledMesh) {
        self.meshes.insert(name.to_string(), mesh);
    }

    pub fn get(&self, name: &str) -> Option<&CompiledMesh> {
        self.meshes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.meshes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Draws `name` if it exists and reports whether anything was drawn.
    ///
    /// Unknown names are not an error: callers build names from game state
    /// and some combinations have no mesh.
    pub fn draw<T: DrawTarget + ?Sized>(
        &self,
        name: &str,
        target: &mut T,
        transform: &Matrix4<f32>,
        bind: &mut BindState,
    ) -> bool {
        match self.get(name) {
            Some(mesh) => {
                mesh.draw(target, transform, bind);
                true
            }
            None => {
                log::debug!("No mesh named {name}, skipping draw");
                false
            }
        }
    }
}

impl FromIterator<(String, CompiledMesh)> for MeshRegistry {
    fn from_iter<I: IntoIterator<Item = (String, CompiledMesh)>>(iter: I) -> Self {
        Self {
            meshes: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::SquareMatrix;

    use super::*;
    use crate::render::Recorder;

    #[test]
    fn unknown_names_draw_nothing() {
        let mut registry = MeshRegistry::default();
        registry.insert("worker", CompiledMesh::cube("worker", 1.0));

        let mut recorder = Recorder::default();
        let mut bind = BindState::default();
        let identity = Matrix4::identity();

        assert!(!registry.draw("level9", &mut recorder, &identity, &mut bind));
        assert!(recorder.draws.is_empty());
        assert_eq!(bind, BindState::default());

        assert!(registry.draw("worker", &mut recorder, &identity, &mut bind));
        assert_eq!(recorder.triangle_count(), 12);
    }
}
