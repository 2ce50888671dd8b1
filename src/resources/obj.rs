//! Wavefront `.obj` reader.
//!
//! Supports the subset the board assets use: `v`, `vn`, `vt`, `f`, `mtllib`
//! and `usemtl` (also spelled `usemat`). Grouping and smoothing records are
//! accepted and ignored. Face corners are `pos[/tex][/normal]`; missing
//! sub-indices are stored as `0`, negative ones count back from the end.

use std::path::Path;

use crate::{
    data_structures::model::{Face, ObjMesh},
    error::{LoadError, LoadResult},
    resources::{load_string, mtl::load_mtl, texture::TextureLoader},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ObjOptions {
    /// Exchange Y and Z of every position and normal (Z-up tools vs. Y-up engine).
    pub swap_yz: bool,
}

pub fn load_obj(
    path: &Path,
    options: ObjOptions,
    textures: &mut dyn TextureLoader,
) -> LoadResult<ObjMesh> {
    let text = load_string(path)?;
    let base_dir = path.parent().unwrap_or(Path::new(""));
    let mesh = parse_obj(&text, path, base_dir, options, textures)?;
    log::info!(
        "Loaded {}: {} positions, {} normals, {} texcoords, {} faces",
        path.display(),
        mesh.positions.len(),
        mesh.normals.len(),
        mesh.texcoords.len(),
        mesh.faces.len()
    );
    Ok(mesh)
}

/// Parses mesh records; `path` labels errors, `base_dir` anchors `mtllib` paths.
pub fn parse_obj(
    text: &str,
    path: &Path,
    base_dir: &Path,
    options: ObjOptions,
    textures: &mut dyn TextureLoader,
) -> LoadResult<ObjMesh> {
    let mut mesh = ObjMesh::default();
    let mut material: Option<String> = None;
    // line of every face, to point at the culprit when an index is out of range
    let mut face_lines = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        let args = &parts[1..];

        match parts[0] {
            "v" => {
                let [x, y, z] = floats::<3>(args, 3, path, line_no)?;
                mesh.positions
                    .push(if options.swap_yz { [x, z, y] } else { [x, y, z] });
            }
            "vn" => {
                let [x, y, z] = floats::<3>(args, 3, path, line_no)?;
                mesh.normals
                    .push(if options.swap_yz { [x, z, y] } else { [x, y, z] });
            }
            "vt" => {
                mesh.texcoords.push(floats::<2>(args, 1, path, line_no)?);
            }
            "usemtl" | "usemat" => {
                let name = args.first().ok_or_else(|| {
                    LoadError::parse(path, line_no, format!("{} without a name", parts[0]))
                })?;
                material = Some(name.to_string());
            }
            "mtllib" => {
                let file = args
                    .first()
                    .ok_or_else(|| LoadError::parse(path, line_no, "mtllib without a file"))?;
                let library = load_mtl(&base_dir.join(file), textures)?;
                mesh.materials.get_or_insert_with(Default::default).extend(library);
            }
            "f" => {
                if args.len() < 3 {
                    return Err(LoadError::parse(
                        path,
                        line_no,
                        format!("face needs at least 3 corners, got {}", args.len()),
                    ));
                }
                let mut face = Face {
                    vertices: Vec::with_capacity(args.len()),
                    normals: Vec::with_capacity(args.len()),
                    texcoords: Vec::with_capacity(args.len()),
                    material: material.clone(),
                };
                for corner in args {
                    let mut sub = corner.split('/');
                    let counts = (
                        mesh.positions.len(),
                        mesh.texcoords.len(),
                        mesh.normals.len(),
                    );
                    let pos = index(sub.next(), counts.0, path, line_no)?;
                    if pos == 0 {
                        return Err(LoadError::parse(
                            path,
                            line_no,
                            format!("corner '{corner}' has no position"),
                        ));
                    }
                    face.vertices.push(pos);
                    face.texcoords.push(index(sub.next(), counts.1, path, line_no)?);
                    face.normals.push(index(sub.next(), counts.2, path, line_no)?);
                }
                mesh.faces.push(face);
                face_lines.push(line_no);
            }
            // objects, groups, smoothing, lines and anything unknown
            _ => (),
        }
    }

    validate(&mesh, &face_lines, path)?;
    Ok(mesh)
}

/// Reads `N` floats, requiring at least `required`; missing trailing ones are zero.
fn floats<const N: usize>(
    args: &[&str],
    required: usize,
    path: &Path,
    line_no: usize,
) -> LoadResult<[f32; N]> {
    if args.len() < required {
        return Err(LoadError::parse(
            path,
            line_no,
            format!("expected {required} numbers, got {}", args.len()),
        ));
    }
    let mut out = [0.0; N];
    for (slot, raw) in out.iter_mut().zip(args) {
        *slot = raw
            .parse()
            .map_err(|e| LoadError::parse(path, line_no, format!("bad number '{raw}': {e}")))?;
    }
    Ok(out)
}

/// Parses one 1-based sub-index. Empty or missing means absent (`0`).
fn index(raw: Option<&str>, count: usize, path: &Path, line_no: usize) -> LoadResult<usize> {
    let raw = match raw {
        None | Some("") => return Ok(0),
        Some(raw) => raw,
    };
    let value: i64 = raw
        .parse()
        .map_err(|e| LoadError::parse(path, line_no, format!("bad index '{raw}': {e}")))?;
    if value >= 0 {
        return Ok(value as usize);
    }
    let resolved = count as i64 + value + 1;
    if resolved < 1 {
        return Err(LoadError::parse(
            path,
            line_no,
            format!("relative index {value} reaches before the first element"),
        ));
    }
    Ok(resolved as usize)
}

fn validate(mesh: &ObjMesh, face_lines: &[usize], path: &Path) -> LoadResult<()> {
    let in_range = |indices: &[usize], count: usize| indices.iter().all(|&i| i <= count);
    for (face, &line_no) in mesh.faces.iter().zip(face_lines) {
        if !in_range(&face.vertices, mesh.positions.len())
            || !in_range(&face.normals, mesh.normals.len())
            || !in_range(&face.texcoords, mesh.texcoords.len())
        {
            return Err(LoadError::parse(path, line_no, "face index out of range"));
        }
    }
    if let Some(materials) = &mesh.materials {
        for face in &mesh.faces {
            if let Some(name) = &face.material {
                if !materials.contains_key(name) {
                    log::warn!("{} uses unknown material {name}", path.display());
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data_structures::model::TextureId, error::LoadError};

    struct NoTextures;

    impl TextureLoader for NoTextures {
        fn load_texture(&mut self, path: &Path) -> LoadResult<TextureId> {
            panic!("unexpected texture load {}", path.display())
        }
    }

    fn parse(text: &str, options: ObjOptions) -> LoadResult<ObjMesh> {
        parse_obj(text, Path::new("test.obj"), Path::new(""), options, &mut NoTextures)
    }

    const TRIANGLE: &str = "# a comment\n\
        v 0 1 2\n\
        v 1 0 0\n\
        v 0 0 1\n\
        \n\
        vn 0 1 0\n\
        vt 0.5 0.25\n\
        usemtl red\n\
        f 1/1/1 2//1 3\n";

    #[test]
    fn reads_attributes_and_faces() {
        let mesh = parse(TRIANGLE, ObjOptions::default()).expect("valid mesh");
        assert_eq!(mesh.positions, vec![[0.0, 1.0, 2.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        assert_eq!(mesh.normals, vec![[0.0, 1.0, 0.0]]);
        assert_eq!(mesh.texcoords, vec![[0.5, 0.25]]);
        assert_eq!(mesh.faces.len(), 1);

        let face = &mesh.faces[0];
        assert_eq!(face.vertices, vec![1, 2, 3]);
        assert_eq!(face.texcoords, vec![1, 0, 0]);
        assert_eq!(face.normals, vec![1, 1, 0]);
        assert_eq!(face.material.as_deref(), Some("red"));
        assert!(mesh.materials.is_none());
    }

    #[test]
    fn swap_yz_exchanges_positions_and_normals() {
        let mesh = parse(TRIANGLE, ObjOptions { swap_yz: true }).expect("valid mesh");
        assert_eq!(mesh.positions[0], [0.0, 2.0, 1.0]);
        assert_eq!(mesh.normals[0], [0.0, 0.0, 1.0]);
        // texture coordinates are untouched
        assert_eq!(mesh.texcoords[0], [0.5, 0.25]);
    }

    #[test]
    fn negative_indices_are_relative() {
        let mesh = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n", ObjOptions::default())
            .expect("valid mesh");
        assert_eq!(mesh.faces[0].vertices, vec![1, 2, 3]);
    }

    #[test]
    fn parsing_is_deterministic() {
        let a = parse(TRIANGLE, ObjOptions::default()).expect("valid mesh");
        let b = parse(TRIANGLE, ObjOptions::default()).expect("valid mesh");
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_malformed_records() {
        let cases = [
            ("v 1 2\n", 1),
            ("v 0 0 0\nv 1 0 0\nf 1 2\n", 3),
            ("v 0 0 0\nv 1 0 0\nv 1 1 0\nf 1 2 4\n", 4),
            ("v 0 0 0\nv 1 0 0\nv 1 1 0\nf 1//2 2 3\n", 4),
            ("v a b c\n", 1),
            ("usemtl\n", 1),
        ];
        for (text, expected_line) in cases {
            match parse(text, ObjOptions::default()) {
                Err(LoadError::Parse { line, .. }) => assert_eq!(line, expected_line, "{text:?}"),
                other => panic!("expected parse error for {text:?}, got {other:?}"),
            }
        }
    }
}
