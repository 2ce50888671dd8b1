use santorini_ngin::{
    LoadError, MeshRegistry,
    data_structures::registry::BOARD_MESHES,
    resources::{
        load_model_obj,
        obj::{ObjOptions, load_obj},
        texture::ImageTextures,
    },
};

use crate::common::test_utils::{asset_dir, fixture_dir, init_logger, load_board};

mod common;

#[test]
fn should_load_every_board_mesh() {
    let (registry, textures) = load_board();

    assert_eq!(registry.len(), BOARD_MESHES.len());
    for (name, _) in BOARD_MESHES {
        let mesh = registry.get(name).expect("registered");
        assert_eq!(mesh.name(), name);
        assert!(mesh.triangle_count() > 0, "{name} has no triangles");
    }
    // grass for the terrain, stone for the first level; each loaded once
    assert_eq!(textures.len(), 2);
}

#[test]
fn should_parse_identically_every_time() {
    init_logger();
    for (name, swap_yz) in BOARD_MESHES {
        let path = asset_dir().join(format!("{name}.obj"));
        let options = ObjOptions { swap_yz };
        let mut textures = ImageTextures::new();

        let first = load_obj(&path, options, &mut textures).expect("parses");
        let compiled = load_model_obj(&path, options, &mut textures).expect("compiles");
        let second = load_obj(&path, options, &mut textures).expect("parses again");

        assert_eq!(first.positions.len(), second.positions.len());
        assert_eq!(first.normals.len(), second.normals.len());
        assert_eq!(first.texcoords.len(), second.texcoords.len());
        assert_eq!(first.faces.len(), second.faces.len());
        assert_eq!(first.positions, second.positions);
        assert_eq!(
            compiled.triangle_count(),
            first.faces.iter().map(|f| f.len() - 2).sum::<usize>()
        );
    }
}

#[test]
fn should_report_a_missing_mesh_file() {
    init_logger();
    let mut textures = ImageTextures::new();
    let err = MeshRegistry::load(&fixture_dir("partial"), &mut textures).expect_err("incomplete");
    match err {
        LoadError::ResourceNotFound { path, .. } => {
            assert_eq!(path, fixture_dir("partial").join("level1_v1.obj"));
        }
        other => panic!("expected ResourceNotFound, got {other}"),
    }
}

#[test]
fn should_report_a_missing_texture() {
    init_logger();
    let mut textures = ImageTextures::new();
    let path = fixture_dir("broken").join("missing_texture.obj");
    let err = load_obj(&path, ObjOptions::default(), &mut textures).expect_err("texture missing");
    assert!(matches!(err, LoadError::ResourceNotFound { .. }), "{err}");
    assert!(textures.is_empty());
}

#[test]
fn should_reject_attributes_before_a_material() {
    init_logger();
    let mut textures = ImageTextures::new();
    let path = fixture_dir("broken").join("tile.obj");
    match load_obj(&path, ObjOptions::default(), &mut textures) {
        Err(LoadError::Parse { path, line, .. }) => {
            assert_eq!(path, fixture_dir("broken").join("tile.mtl"));
            assert_eq!(line, 2);
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn should_reject_out_of_range_face_indices() {
    init_logger();
    let mut textures = ImageTextures::new();
    let path = fixture_dir("broken").join("out_of_range.obj");
    let err = load_obj(&path, ObjOptions::default(), &mut textures).expect_err("index 7");
    assert!(matches!(err, LoadError::Parse { line: 5, .. }), "{err}");
}
