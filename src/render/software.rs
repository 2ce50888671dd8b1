//! A small CPU rasteriser.
//!
//! Stands in for the `wgpu` renderer when no adapter is available, and runs
//! the picking pass in tests. Depth-tested with no culling. Sampling is
//! nearest-texel and lighting is the half-lambert term of `mesh.wgsl`.

use cgmath::{InnerSpace, Matrix4, Vector3, Vector4};

use crate::{
    data_structures::compiled::{Batch, BindState, MeshVertex},
    render::{DrawTarget, FrameTarget, PickSurface},
    resources::texture::ImageTextures,
};

/// Triangles with a corner this close to the eye plane are dropped.
const NEAR_W: f32 = 1e-4;

/// Direction towards the light, shared with `mesh.wgsl`.
pub const LIGHT_DIRECTION: [f32; 3] = [100.0, 200.0, 0.0];

/// Rasterises into an [`image::RgbaImage`].
///
/// Clip space follows OpenGL conventions: x and y in `[-1, 1]` with y up, and
/// depth in `[-1, 1]`.
pub struct SoftwareTarget<'t> {
    color: image::RgbaImage,
    depth: Vec<f32>,
    view_proj: Matrix4<f32>,
    background: [u8; 4],
    lit: bool,
    textures: Option<&'t ImageTextures>,
}

impl<'t> SoftwareTarget<'t> {
    /// A black target with an identity view-projection.
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            color: image::RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 0, 255])),
            depth: vec![f32::INFINITY; width as usize * height as usize],
            view_proj: cgmath::SquareMatrix::identity(),
            background: [0, 0, 0, 255],
            lit: false,
            textures: None,
        }
    }

    /// Samples textures from `textures` when a textured batch is drawn.
    pub fn with_textures(mut self, textures: &'t ImageTextures) -> Self {
        self.textures = Some(textures);
        self
    }

    pub fn set_view_proj(&mut self, view_proj: Matrix4<f32>) {
        self.view_proj = view_proj;
    }

    pub fn image(&self) -> &image::RgbaImage {
        &self.color
    }

    fn reset(&mut self) {
        for pixel in self.color.pixels_mut() {
            *pixel = image::Rgba(self.background);
        }
        self.depth.fill(f32::INFINITY);
    }

    fn shade(&self, bind: &BindState, normal: Vector3<f32>, uv: [f32; 2]) -> [u8; 4] {
        let mut rgb = bind.color;
        if bind.texturing {
            if let Some(texel) = bind
                .texture
                .and_then(|id| self.textures?.get(id))
                .filter(|img| img.width() > 0 && img.height() > 0)
                .map(|img| sample_nearest(img, uv))
            {
                for (c, t) in rgb.iter_mut().zip(texel) {
                    *c *= f32::from(t) / 255.0;
                }
            }
        }
        if self.lit {
            let light = Vector3::from(LIGHT_DIRECTION).normalize();
            let n = if normal.magnitude2() > 0.0 {
                normal.normalize()
            } else {
                normal
            };
            let factor = (0.5 + 0.5 * n.dot(light).max(0.0)).min(1.0);
            rgb = rgb.map(|c| c * factor);
        }
        let [r, g, b] = rgb.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        [r, g, b, 255]
    }

    fn rasterise(
        &mut self,
        tri: &[MeshVertex],
        mvp: &Matrix4<f32>,
        model: &Matrix4<f32>,
        bind: &BindState,
    ) {
        let (width, height) = self.color.dimensions();
        let clip: Vec<Vector4<f32>> = tri
            .iter()
            .map(|v| mvp * Vector4::new(v.position[0], v.position[1], v.position[2], 1.0))
            .collect();
        if clip.iter().any(|c| c.w <= NEAR_W) {
            return;
        }
        // Screen space with the origin in the bottom-left corner.
        let screen: Vec<[f32; 3]> = clip
            .iter()
            .map(|c| {
                [
                    (c.x / c.w + 1.0) * 0.5 * width as f32,
                    (c.y / c.w + 1.0) * 0.5 * height as f32,
                    c.z / c.w,
                ]
            })
            .collect();
        let area = edge(screen[0], screen[1], screen[2]);
        if area.abs() < f32::EPSILON {
            return;
        }

        let (min_x, max_x) = span(screen.iter().map(|s| s[0]), width);
        let (min_y, max_y) = span(screen.iter().map(|s| s[1]), height);

        let normals: Vec<Vector3<f32>> = tri
            .iter()
            .map(|v| (model * Vector4::new(v.normal[0], v.normal[1], v.normal[2], 0.0)).truncate())
            .collect();

        for py in min_y..max_y {
            for px in min_x..max_x {
                let p = [px as f32 + 0.5, py as f32 + 0.5, 0.0];
                let w0 = edge(screen[1], screen[2], p) / area;
                let w1 = edge(screen[2], screen[0], p) / area;
                let w2 = 1.0 - w0 - w1;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let z = w0 * screen[0][2] + w1 * screen[1][2] + w2 * screen[2][2];
                if z > 1.0 {
                    continue;
                }
                let row = height - 1 - py;
                let index = row as usize * width as usize + px as usize;
                if z >= self.depth[index] {
                    continue;
                }

                // perspective-correct weights
                let (p0, p1, p2) = (w0 / clip[0].w, w1 / clip[1].w, w2 / clip[2].w);
                let sum = p0 + p1 + p2;
                let (p0, p1, p2) = (p0 / sum, p1 / sum, p2 / sum);
                let uv = [
                    p0 * tri[0].tex_coords[0] + p1 * tri[1].tex_coords[0] + p2 * tri[2].tex_coords[0],
                    p0 * tri[0].tex_coords[1] + p1 * tri[1].tex_coords[1] + p2 * tri[2].tex_coords[1],
                ];
                let normal = normals[0] * p0 + normals[1] * p1 + normals[2] * p2;

                let rgba = self.shade(bind, normal, uv);
                self.depth[index] = z;
                self.color.put_pixel(px, row, image::Rgba(rgba));
            }
        }
    }
}

/// Pixel range `[min, max)` covered by `coords`, clipped to `[0, limit)`.
fn span(coords: impl Iterator<Item = f32> + Clone, limit: u32) -> (u32, u32) {
    let min = coords.clone().fold(f32::INFINITY, f32::min);
    let max = coords.fold(f32::NEG_INFINITY, f32::max);
    (
        min.floor().clamp(0.0, limit as f32) as u32,
        max.ceil().clamp(0.0, limit as f32) as u32,
    )
}

/// Twice the signed area of `(a, b, c)`.
fn edge(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> f32 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

/// Repeat-wrapped nearest texel; `v = 0` is the bottom row of the image.
fn sample_nearest(img: &image::RgbaImage, uv: [f32; 2]) -> [u8; 3] {
    let (w, h) = img.dimensions();
    let u = uv[0] - uv[0].floor();
    let v = uv[1] - uv[1].floor();
    let x = ((u * w as f32) as u32).min(w - 1);
    let y = (((1.0 - v) * h as f32) as u32).min(h - 1);
    let [r, g, b, _] = img.get_pixel(x, y).0;
    [r, g, b]
}

impl DrawTarget for SoftwareTarget<'_> {
    fn draw_triangles(&mut self, batch: &Batch, transform: &Matrix4<f32>, bind: &BindState) {
        let mvp = self.view_proj * transform;
        for tri in batch.vertices().chunks_exact(3) {
            self.rasterise(tri, &mvp, transform, bind);
        }
    }
}

impl FrameTarget for SoftwareTarget<'_> {
    fn clear_to_background(&mut self, rgba: [f64; 4]) {
        self.background = rgba.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        self.reset();
        self.lit = true;
    }

    fn read_image(&mut self) -> anyhow::Result<image::RgbaImage> {
        Ok(self.color.clone())
    }
}

impl PickSurface for SoftwareTarget<'_> {
    fn size(&self) -> (u32, u32) {
        self.color.dimensions()
    }

    fn clear(&mut self) {
        self.background = [0, 0, 0, 255];
        self.reset();
        self.lit = false;
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn read_pixel(&mut self, x: u32, y: u32) -> anyhow::Result<[u8; 3]> {
        let (width, height) = self.color.dimensions();
        anyhow::ensure!(
            x < width && y < height,
            "Pixel ({x}, {y}) is outside the {width}x{height} target"
        );
        let [r, g, b, _] = self.color.get_pixel(x, height - 1 - y).0;
        Ok([r, g, b])
    }
}
