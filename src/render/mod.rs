//! Renderer seams.
//!
//! Compiled meshes do not know what they are drawn into. They hand each
//! triangle batch, its world transform and the current [`BindState`] to a
//! [`DrawTarget`]. Targets that can also answer "which colour is under this
//! pixel" implement [`PickSurface`] and take part in picking.
//!
//! # Implementations
//!
//! - [`gpu::GpuFrame`] records draws for the `wgpu` renderer
//! - [`software::SoftwareTarget`] rasterises on the CPU, for hosts without an
//!   adapter and for tests
//! - [`Recorder`] just remembers what was drawn

pub mod gpu;
pub mod software;

use cgmath::Matrix4;

use crate::data_structures::compiled::{Batch, BatchId, BindState};

/// Receives triangle batches from [`CompiledMesh`](crate::data_structures::compiled::CompiledMesh).
pub trait DrawTarget {
    fn draw_triangles(&mut self, batch: &Batch, transform: &Matrix4<f32>, bind: &BindState);
}

/// A colour buffer that can be cleared, drawn into and sampled one pixel at a time.
pub trait PickSurface: DrawTarget {
    /// Width and height in pixels.
    fn size(&self) -> (u32, u32);

    /// Starts an identification pass: clears colour and depth and turns
    /// lighting off so colours land unmodified. Cleared pixels read back as black.
    fn clear(&mut self);

    /// Blocks until every draw issued so far has landed in the colour buffer.
    fn flush(&mut self) -> anyhow::Result<()>;

    /// Reads the RGB value at `(x, y)` with the origin in the bottom-left corner.
    fn read_pixel(&mut self, x: u32, y: u32) -> anyhow::Result<[u8; 3]>;
}

/// A pick surface that is also shown: it can start a lit frame and hand the
/// result back as an image.
pub trait FrameTarget: PickSurface {
    /// Starts a visible frame: clears to `rgba` and enables lighting.
    fn clear_to_background(&mut self, rgba: [f64; 4]);

    /// Flushes and returns the colour buffer, top row first.
    fn read_image(&mut self) -> anyhow::Result<image::RgbaImage>;
}

/// One call to [`DrawTarget::draw_triangles`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedDraw {
    pub batch: BatchId,
    pub triangles: usize,
    pub transform: Matrix4<f32>,
    pub bind: BindState,
}

/// A target that keeps a log of every draw instead of rendering.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    pub draws: Vec<RecordedDraw>,
}

impl Recorder {
    pub fn triangle_count(&self) -> usize {
        self.draws.iter().map(|draw| draw.triangles).sum()
    }
}

impl DrawTarget for Recorder {
    fn draw_triangles(&mut self, batch: &Batch, transform: &Matrix4<f32>, bind: &BindState) {
        self.draws.push(RecordedDraw {
            batch: batch.id(),
            triangles: batch.triangle_count(),
            transform: *transform,
            bind: *bind,
        });
    }
}
