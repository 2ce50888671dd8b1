//! Compiled meshes: parsed geometry baked into a replayable command list.
//!
//! Compilation walks the faces once, resolves materials and fan-triangulates
//! every polygon. The result never changes afterwards; drawing it only replays
//! the commands against a [`DrawTarget`].
//!
//! Material state behaves like a fixed-function pipeline: a bound texture or a
//! set colour stays in effect for the following faces until something else
//! replaces it, and it leaks out of the mesh into whatever is drawn next. That
//! state lives in a [`BindState`] that the caller threads through every draw.

use std::sync::atomic::{AtomicU64, Ordering};

use cgmath::Matrix4;

use crate::{
    data_structures::model::{ObjMesh, TextureId, Vertex},
    render::DrawTarget,
};

static NEXT_BATCH_ID: AtomicU64 = AtomicU64::new(1);

/// A vertex as it is uploaded to the GPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex for MeshVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Process-unique id of a [`Batch`]; renderers use it to cache uploads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BatchId(u64);

impl BatchId {
    fn next() -> Self {
        BatchId(NEXT_BATCH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A run of triangles drawn under the same material state.
#[derive(Clone, Debug)]
pub struct Batch {
    id: BatchId,
    vertices: Vec<MeshVertex>,
}

impl Batch {
    pub fn id(&self) -> BatchId {
        self.id
    }

    /// Triangle list, three vertices per triangle.
    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }
}

#[derive(Clone, Debug)]
pub enum Command {
    BindTexture(TextureId),
    SetColor([f32; 3]),
    Triangles(Batch),
}

/// The renderer state a draw leaves behind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BindState {
    /// Whether the bound texture is applied. Only true while a mesh is drawing.
    pub texturing: bool,
    pub texture: Option<TextureId>,
    pub color: [f32; 3],
}

impl Default for BindState {
    fn default() -> Self {
        Self {
            texturing: false,
            texture: None,
            color: [1.0, 1.0, 1.0],
        }
    }
}

/// Immutable draw commands built once from an [`ObjMesh`].
#[derive(Clone, Debug)]
pub struct CompiledMesh {
    name: String,
    commands: Vec<Command>,
}

impl CompiledMesh {
    pub fn compile(name: &str, mesh: &ObjMesh) -> Self {
        let mut commands = Vec::new();
        let mut pending: Vec<MeshVertex> = Vec::new();
        // Attributes not given by a corner keep the last value emitted within
        // this mesh. Each mesh starts from the defaults so its vertices do not
        // depend on what was compiled or drawn before it.
        let mut normal = [0.0, 0.0, 1.0];
        let mut tex_coords = [0.0, 0.0];
        let mut last_texture = None;
        let mut last_color = None;

        for face in &mesh.faces {
            let mut state_change = None;
            if let Some(material) = mesh.material_of(face) {
                if let Some(texture) = material.texture {
                    if last_texture != Some(texture) {
                        last_texture = Some(texture);
                        state_change = Some(Command::BindTexture(texture));
                    }
                } else if let Some(color) = material.diffuse() {
                    if last_color != Some(color) {
                        last_color = Some(color);
                        state_change = Some(Command::SetColor(color));
                    }
                }
            }
            if let Some(command) = state_change {
                flush_batch(&mut commands, &mut pending);
                commands.push(command);
            }

            let corners: Option<Vec<MeshVertex>> = (0..face.len())
                .map(|k| {
                    if let Some(n) = lookup(&mesh.normals, face.normals.get(k)) {
                        normal = n;
                    }
                    if let Some(t) = lookup(&mesh.texcoords, face.texcoords.get(k)) {
                        tex_coords = t;
                    }
                    Some(MeshVertex {
                        position: lookup(&mesh.positions, face.vertices.get(k))?,
                        normal,
                        tex_coords,
                    })
                })
                .collect();
            let Some(corners) = corners else {
                log::warn!("Skipping a face of {name} that references a missing position.");
                continue;
            };
            for k in 1..corners.len().saturating_sub(1) {
                pending.extend_from_slice(&[corners[0], corners[k], corners[k + 1]]);
            }
        }
        flush_batch(&mut commands, &mut pending);

        Self {
            name: name.to_string(),
            commands,
        }
    }

    /// An axis-aligned cube centred on the origin, used as a pick proxy.
    pub fn cube(name: &str, half_extent: f32) -> Self {
        let h = half_extent;
        let corners = [
            [h, h, h],
            [h, h, -h],
            [h, -h, -h],
            [h, -h, h],
            [-h, h, h],
            [-h, h, -h],
            [-h, -h, -h],
            [-h, -h, h],
        ];
        let quads: [([usize; 4], [f32; 3]); 6] = [
            ([0, 3, 2, 1], [1.0, 0.0, 0.0]),
            ([4, 5, 6, 7], [-1.0, 0.0, 0.0]),
            ([0, 1, 5, 4], [0.0, 1.0, 0.0]),
            ([3, 7, 6, 2], [0.0, -1.0, 0.0]),
            ([0, 4, 7, 3], [0.0, 0.0, 1.0]),
            ([1, 2, 6, 5], [0.0, 0.0, -1.0]),
        ];
        let mut vertices = Vec::with_capacity(36);
        for (quad, normal) in quads {
            let v = |i: usize| MeshVertex {
                position: corners[quad[i]],
                normal,
                tex_coords: [0.0, 0.0],
            };
            vertices.extend_from_slice(&[v(0), v(1), v(2), v(0), v(2), v(3)]);
        }
        Self {
            name: name.to_string(),
            commands: vec![Command::Triangles(Batch {
                id: BatchId::next(),
                vertices,
            })],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn batches(&self) -> impl Iterator<Item = &Batch> {
        self.commands.iter().filter_map(|command| match command {
            Command::Triangles(batch) => Some(batch),
            _ => None,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.batches().map(Batch::triangle_count).sum()
    }

    /// Replays the mesh with its own materials.
    ///
    /// Texturing is switched on for the duration of the call and off again
    /// afterwards; the last bound texture and colour remain in `bind`.
    pub fn draw<T: DrawTarget + ?Sized>(
        &self,
        target: &mut T,
        transform: &Matrix4<f32>,
        bind: &mut BindState,
    ) {
        bind.texturing = true;
        for command in &self.commands {
            match command {
                Command::BindTexture(texture) => bind.texture = Some(*texture),
                Command::SetColor(color) => bind.color = *color,
                Command::Triangles(batch) => target.draw_triangles(batch, transform, bind),
            }
        }
        bind.texturing = false;
    }

    /// Replays the geometry in a single flat colour, ignoring materials.
    pub fn draw_flat<T: DrawTarget + ?Sized>(
        &self,
        target: &mut T,
        transform: &Matrix4<f32>,
        color: [f32; 3],
        bind: &mut BindState,
    ) {
        bind.texturing = false;
        bind.color = color;
        for batch in self.batches() {
            target.draw_triangles(batch, transform, bind);
        }
    }
}

/// Resolves a 1-based index; `0` and out-of-range indices yield `None`.
fn lookup<T: Copy>(values: &[T], index: Option<&usize>) -> Option<T> {
    let index = *index?;
    index.checked_sub(1).and_then(|i| values.get(i)).copied()
}

fn flush_batch(commands: &mut Vec<Command>, pending: &mut Vec<MeshVertex>) {
    if !pending.is_empty() {
        commands.push(Command::Triangles(Batch {
            id: BatchId::next(),
            vertices: std::mem::take(pending),
        }));
    }
}

#[cfg(test)]
mod tests {
    use cgmath::SquareMatrix;

    use super::*;
    use crate::{
        data_structures::model::{Face, Material, MaterialLibrary},
        render::Recorder,
    };

    fn face(vertices: &[usize], normals: &[usize], material: Option<&str>) -> Face {
        Face {
            vertices: vertices.to_vec(),
            normals: normals.to_vec(),
            texcoords: vec![0; vertices.len()],
            material: material.map(str::to_string),
        }
    }

    fn quad_mesh() -> ObjMesh {
        let mut red = Material::new("red");
        red.attributes.insert("Kd".into(), vec![1.0, 0.0, 0.0]);
        let mut wood = Material::new("wood");
        wood.texture = Some(TextureId(7));
        let mut materials = MaterialLibrary::new();
        materials.insert("red".into(), red);
        materials.insert("wood".into(), wood);
        ObjMesh {
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            normals: vec![[0.0, 0.0, 1.0], [0.0, 1.0, 0.0]],
            texcoords: vec![],
            faces: vec![
                face(&[1, 2, 3, 4], &[1, 1, 1, 1], Some("red")),
                face(&[1, 2, 3], &[2, 0, 0], Some("red")),
                face(&[1, 3, 4], &[0, 0, 0], Some("wood")),
            ],
            materials: Some(materials),
        }
    }

    #[test]
    fn polygons_are_fan_triangulated_and_grouped_by_material() {
        let compiled = CompiledMesh::compile("quad", &quad_mesh());
        let kinds: Vec<&str> = compiled
            .commands()
            .iter()
            .map(|command| match command {
                Command::BindTexture(_) => "texture",
                Command::SetColor(_) => "color",
                Command::Triangles(_) => "triangles",
            })
            .collect();
        // the repeated red material does not split the batch
        assert_eq!(kinds, ["color", "triangles", "texture", "triangles"]);
        assert_eq!(compiled.triangle_count(), 4);
    }

    #[test]
    fn absent_normals_inherit_the_previous_one() {
        let compiled = CompiledMesh::compile("quad", &quad_mesh());
        let first = compiled.batches().next().expect("batch");
        // second face: corner 1 sets the up normal, corners 2 and 3 keep it
        let second_face = &first.vertices()[6..9];
        assert!(second_face.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn every_mesh_starts_from_the_default_normal() {
        let _ = CompiledMesh::compile("quad", &quad_mesh());
        let bare = ObjMesh {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            faces: vec![face(&[1, 2, 3], &[0, 0, 0], None)],
            ..Default::default()
        };
        let compiled = CompiledMesh::compile("bare", &bare);
        let batch = compiled.batches().next().expect("batch");
        assert!(batch
            .vertices()
            .iter()
            .all(|v| v.normal == [0.0, 0.0, 1.0] && v.tex_coords == [0.0, 0.0]));
    }

    #[test]
    fn draw_threads_bind_state() {
        let compiled = CompiledMesh::compile("quad", &quad_mesh());
        let mut recorder = Recorder::default();
        let mut bind = BindState::default();
        compiled.draw(&mut recorder, &Matrix4::identity(), &mut bind);

        assert_eq!(recorder.draws.len(), 2);
        assert!(recorder.draws.iter().all(|d| d.bind.texturing));
        assert_eq!(recorder.draws[0].bind.color, [1.0, 0.0, 0.0]);
        assert_eq!(recorder.draws[1].bind.texture, Some(TextureId(7)));

        assert!(!bind.texturing);
        assert_eq!(bind.texture, Some(TextureId(7)));
        assert_eq!(bind.color, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn draw_flat_ignores_materials() {
        let compiled = CompiledMesh::compile("quad", &quad_mesh());
        let mut recorder = Recorder::default();
        let mut bind = BindState::default();
        compiled.draw_flat(&mut recorder, &Matrix4::identity(), [0.0, 1.0, 0.0], &mut bind);
        assert_eq!(recorder.draws.len(), 2);
        assert!(recorder
            .draws
            .iter()
            .all(|d| !d.bind.texturing && d.bind.color == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn cube_has_twelve_triangles() {
        let cube = CompiledMesh::cube("proxy", 1.0);
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.name(), "proxy");
    }
}
