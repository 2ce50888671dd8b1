//! `.mtl` material library reader.
//!
//! Recognised records:
//!
//! - `newmtl <name>` starts a material
//! - `map_Kd <path>` loads the diffuse texture immediately (relative to the library)
//! - `<key> <floats...>` stores a numeric attribute such as `Kd 0.8 0.8 0.8`
//!
//! Other texture maps (`map_Bump`, `map_Ks`, ...) are not used by the renderer
//! and are skipped.

use std::path::Path;

use crate::{
    data_structures::model::{Material, MaterialLibrary},
    error::{LoadError, LoadResult},
    resources::{load_string, texture::TextureLoader},
};

pub fn load_mtl(path: &Path, textures: &mut dyn TextureLoader) -> LoadResult<MaterialLibrary> {
    let text = load_string(path)?;
    let base_dir = path.parent().unwrap_or(Path::new(""));
    parse_mtl(&text, path, base_dir, textures)
}

/// Parses material records; `path` only labels errors, `base_dir` anchors texture paths.
pub fn parse_mtl(
    text: &str,
    path: &Path,
    base_dir: &Path,
    textures: &mut dyn TextureLoader,
) -> LoadResult<MaterialLibrary> {
    let mut library = MaterialLibrary::new();
    let mut current: Option<String> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };

        if tag == "newmtl" {
            let name = parts
                .next()
                .ok_or_else(|| LoadError::parse(path, line_no, "newmtl without a name"))?;
            library.insert(name.to_string(), Material::new(name));
            current = Some(name.to_string());
            continue;
        }

        let Some(material) = current.as_ref().and_then(|name| library.get_mut(name)) else {
            return Err(LoadError::parse(
                path,
                line_no,
                format!("'{tag}' before any newmtl declaration"),
            ));
        };

        match tag {
            "map_Kd" => {
                // the path is the last token; options like -s may come before it
                let file = parts
                    .last()
                    .ok_or_else(|| LoadError::parse(path, line_no, "map_Kd without a file"))?;
                let texture_path = base_dir.join(file);
                let texture = textures.load_texture(&texture_path)?;
                material.diffuse_map = Some(texture_path);
                material.texture = Some(texture);
            }
            _ if tag.starts_with("map_") || tag == "bump" || tag == "disp" || tag == "refl" => {
                log::debug!("Ignoring {tag} in {}", path.display());
            }
            _ => {
                let values = parts
                    .map(str::parse::<f32>)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| {
                        LoadError::parse(path, line_no, format!("bad number in '{tag}': {e}"))
                    })?;
                material.attributes.insert(tag.to_string(), values);
            }
        }
    }

    Ok(library)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::data_structures::model::TextureId;

    #[derive(Default)]
    struct FakeTextures {
        loaded: Vec<PathBuf>,
    }

    impl TextureLoader for FakeTextures {
        fn load_texture(&mut self, path: &Path) -> LoadResult<TextureId> {
            self.loaded.push(path.to_path_buf());
            Ok(TextureId(self.loaded.len() as u32 - 1))
        }
    }

    fn parse(text: &str, textures: &mut FakeTextures) -> LoadResult<MaterialLibrary> {
        parse_mtl(text, Path::new("test.mtl"), Path::new("objects"), textures)
    }

    #[test]
    fn reads_numeric_attributes_and_textures() {
        let mut textures = FakeTextures::default();
        let library = parse(
            "# exported\n\
             newmtl stone\n\
             Ns 250.0\n\
             Kd 0.8 0.7 0.6\n\
             illum 2\n\
             \n\
             newmtl roof\n\
             map_Kd roof.png\n\
             map_Bump roof_n.png\n",
            &mut textures,
        )
        .expect("valid library");

        assert_eq!(library.len(), 2);
        let stone = &library["stone"];
        assert_eq!(stone.diffuse(), Some([0.8, 0.7, 0.6]));
        assert_eq!(stone.attributes["illum"], vec![2.0]);
        assert_eq!(stone.texture, None);

        let roof = &library["roof"];
        assert_eq!(roof.texture, Some(TextureId(0)));
        assert_eq!(roof.diffuse_map, Some(PathBuf::from("objects/roof.png")));
        assert_eq!(textures.loaded, vec![PathBuf::from("objects/roof.png")]);
    }

    #[test]
    fn attribute_before_newmtl_is_a_parse_error() {
        let mut textures = FakeTextures::default();
        let err = parse("Kd 1 1 1\nnewmtl late\n", &mut textures).unwrap_err();
        match err {
            LoadError::Parse { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn non_numeric_attribute_is_a_parse_error() {
        let mut textures = FakeTextures::default();
        let err = parse("newmtl a\nKd red\n", &mut textures).unwrap_err();
        assert!(matches!(err, LoadError::Parse { line: 2, .. }));
    }
}
