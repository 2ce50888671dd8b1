use std::path::Path;

use crate::{
    data_structures::compiled::CompiledMesh,
    error::{LoadError, LoadResult},
    resources::{
        obj::{ObjOptions, load_obj},
        texture::TextureLoader,
    },
};

/**
 * This module contains all logic for loading meshes, materials and textures from external files.
 */
pub mod mtl;
pub mod obj;
pub mod texture;

pub fn load_string(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))
}

pub fn load_binary(path: &Path) -> LoadResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| LoadError::io(path, e))
}

/// Reads an `.obj` (plus its material library and textures) and compiles it.
pub fn load_model_obj(
    path: &Path,
    options: ObjOptions,
    textures: &mut dyn TextureLoader,
) -> LoadResult<CompiledMesh> {
    let mesh = load_obj(path, options, textures)?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let compiled = CompiledMesh::compile(&name, &mesh);
    if compiled.triangle_count() == 0 {
        log::warn!("{} contains no drawable faces.", path.display());
    }
    Ok(compiled)
}
