//! Headless `wgpu` renderer.
//!
//! [`GpuRenderer`] owns the device, the mesh pipeline and every uploaded
//! resource. Batches are uploaded to vertex buffers the first time they are
//! drawn and cached by [`BatchId`]. A [`GpuFrame`] collects draws and encodes
//! them into one render pass when flushed.

use std::{
    collections::HashMap,
    iter,
    path::{Path, PathBuf},
};

use cgmath::Matrix4;
use wgpu::util::DeviceExt;

use crate::{
    camera::OPENGL_TO_WGPU_MATRIX,
    context::Context,
    data_structures::{
        compiled::{Batch, BatchId, BindState},
        model::TextureId,
        texture::Texture,
    },
    error::{LoadError, LoadResult},
    pipelines::basic::{MeshUniform, mesh_uniform_layout, mk_mesh_pipeline},
    render::{DrawTarget, FrameTarget, PickSurface},
    resources::texture::{TextureLoader, decode_image, diffuse_layout},
};

pub struct GpuRenderer {
    context: Context,
    pipeline: wgpu::RenderPipeline,
    texture_layout: wgpu::BindGroupLayout,
    uniform_layout: wgpu::BindGroupLayout,
    white: wgpu::BindGroup,
    textures: Vec<(Texture, wgpu::BindGroup)>,
    by_path: HashMap<PathBuf, TextureId>,
    batches: HashMap<BatchId, (wgpu::Buffer, u32)>,
}

impl GpuRenderer {
    /// Opens a device without a window and allocates `width` x `height` targets.
    pub fn new(width: u32, height: u32) -> anyhow::Result<Self> {
        let context = futures::executor::block_on(Context::new_headless(width, height))?;
        Self::from_context(context)
    }

    pub fn from_context(context: Context) -> anyhow::Result<Self> {
        let device = &context.device;
        let texture_layout = diffuse_layout(device);
        let uniform_layout = mesh_uniform_layout(device);
        let pipeline = mk_mesh_pipeline(device, &texture_layout, &uniform_layout);
        let white = Texture::create_solid([255, 255, 255, 255], device, &context.queue)?
            .bind_group(device, &texture_layout);
        Ok(Self {
            context,
            pipeline,
            texture_layout,
            uniform_layout,
            white,
            textures: Vec::new(),
            by_path: HashMap::new(),
            batches: HashMap::new(),
        })
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Starts collecting draws. `view_proj` uses OpenGL clip conventions, the
    /// same matrix the software renderer takes.
    pub fn frame(&mut self, view_proj: Matrix4<f32>) -> GpuFrame<'_> {
        GpuFrame {
            renderer: self,
            view_proj: OPENGL_TO_WGPU_MATRIX * view_proj,
            clear: None,
            lit: true,
            pending: Vec::new(),
        }
    }

    /// Uploads a decoded image and returns its id.
    pub fn insert_texture(&mut self, img: &image::RgbaImage, label: &str) -> anyhow::Result<TextureId> {
        let texture = Texture::from_image(&self.context.device, &self.context.queue, img, Some(label))?;
        let bind_group = texture.bind_group(&self.context.device, &self.texture_layout);
        let id = TextureId(self.textures.len() as u32);
        self.textures.push((texture, bind_group));
        Ok(id)
    }

    fn upload(&mut self, batch: &Batch) {
        if self.batches.contains_key(&batch.id()) {
            return;
        }
        let buffer = self
            .context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Batch Vertex Buffer"),
                contents: bytemuck::cast_slice(batch.vertices()),
                usage: wgpu::BufferUsages::VERTEX,
            });
        log::debug!("Uploaded batch {:?} ({} triangles)", batch.id(), batch.triangle_count());
        self.batches
            .insert(batch.id(), (buffer, batch.vertices().len() as u32));
    }

    fn texture_bind_group(&self, texture: Option<TextureId>) -> &wgpu::BindGroup {
        texture
            .and_then(|id| self.textures.get(id.0 as usize))
            .map(|(_, bind_group)| bind_group)
            .unwrap_or(&self.white)
    }
}

impl TextureLoader for GpuRenderer {
    fn load_texture(&mut self, path: &Path) -> LoadResult<TextureId> {
        if let Some(id) = self.by_path.get(path) {
            return Ok(*id);
        }
        let img = decode_image(path)?;
        let label = path.display().to_string();
        let id = self
            .insert_texture(&img, &label)
            .map_err(|e| LoadError::Upload {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        log::info!("Uploaded texture {label} ({}x{})", img.width(), img.height());
        self.by_path.insert(path.to_path_buf(), id);
        Ok(id)
    }
}

struct PendingDraw {
    batch: BatchId,
    texture: Option<TextureId>,
    uniforms: wgpu::BindGroup,
}

/// Draws collected for one frame or one pick pass.
pub struct GpuFrame<'r> {
    renderer: &'r mut GpuRenderer,
    view_proj: Matrix4<f32>,
    clear: Option<wgpu::Color>,
    lit: bool,
    pending: Vec<PendingDraw>,
}

impl FrameTarget for GpuFrame<'_> {
    fn clear_to_background(&mut self, rgba: [f64; 4]) {
        self.pending.clear();
        self.clear = Some(wgpu::Color {
            r: rgba[0],
            g: rgba[1],
            b: rgba[2],
            a: rgba[3],
        });
        self.lit = true;
    }

    fn read_image(&mut self) -> anyhow::Result<image::RgbaImage> {
        self.flush()?;
        let ctx = &self.renderer.context;
        let (width, height) = (ctx.width, ctx.height);
        let padded_row = (4 * width).div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let data = read_region(ctx, (0, 0), (width, height), padded_row)?;

        let mut img = image::RgbaImage::new(width, height);
        for (y, row) in data.chunks_exact(padded_row as usize).enumerate() {
            for x in 0..width {
                let offset = (4 * x) as usize;
                let mut pixel = [0; 4];
                pixel.copy_from_slice(&row[offset..offset + 4]);
                img.put_pixel(x, y as u32, image::Rgba(pixel));
            }
        }
        Ok(img)
    }
}

impl DrawTarget for GpuFrame<'_> {
    fn draw_triangles(&mut self, batch: &Batch, transform: &Matrix4<f32>, bind: &BindState) {
        self.renderer.upload(batch);
        let texturing = bind.texturing && bind.texture.is_some();
        let [r, g, b] = bind.color;
        let uniform = MeshUniform {
            mvp: (self.view_proj * transform).into(),
            model: (*transform).into(),
            color: [r, g, b, 1.0],
            flags: [u32::from(texturing), u32::from(self.lit), 0, 0],
        };
        let device = &self.renderer.context.device;
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let uniforms = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.renderer.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("mesh_uniform_bind_group"),
        });
        self.pending.push(PendingDraw {
            batch: batch.id(),
            texture: bind.texture.filter(|_| texturing),
            uniforms,
        });
    }
}

impl PickSurface for GpuFrame<'_> {
    fn size(&self) -> (u32, u32) {
        (self.renderer.context.width, self.renderer.context.height)
    }

    fn clear(&mut self) {
        self.pending.clear();
        self.clear = Some(wgpu::Color::BLACK);
        self.lit = false;
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        if self.pending.is_empty() && self.clear.is_none() {
            return Ok(());
        }
        let pending = std::mem::take(&mut self.pending);
        let clear = self.clear.take();
        let renderer = &*self.renderer;
        let ctx = &renderer.context;

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &ctx.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: clear.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: clear.map_or(wgpu::LoadOp::Load, |_| wgpu::LoadOp::Clear(1.0)),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                multiview_mask: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&renderer.pipeline);
            for draw in &pending {
                let Some((buffer, vertex_count)) = renderer.batches.get(&draw.batch) else {
                    log::error!("Batch {:?} was never uploaded", draw.batch);
                    continue;
                };
                render_pass.set_bind_group(0, renderer.texture_bind_group(draw.texture), &[]);
                render_pass.set_bind_group(1, &draw.uniforms, &[]);
                render_pass.set_vertex_buffer(0, buffer.slice(..));
                render_pass.draw(0..*vertex_count, 0..1);
            }
        }
        ctx.queue.submit(iter::once(encoder.finish()));
        ctx.device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })?;
        Ok(())
    }

    fn read_pixel(&mut self, x: u32, y: u32) -> anyhow::Result<[u8; 3]> {
        let (width, height) = self.size();
        anyhow::ensure!(
            x < width && y < height,
            "Pixel ({x}, {y}) is outside the {width}x{height} target"
        );
        self.flush()?;
        // textures are stored top row first
        let data = read_region(
            &self.renderer.context,
            (x, height - 1 - y),
            (1, 1),
            wgpu::COPY_BYTES_PER_ROW_ALIGNMENT,
        )?;
        Ok([data[0], data[1], data[2]])
    }
}

/// Copies a region of the colour target into a mapped buffer and returns its
/// bytes, `bytes_per_row` bytes per row.
fn read_region(
    ctx: &Context,
    origin: (u32, u32),
    (width, height): (u32, u32),
    bytes_per_row: u32,
) -> anyhow::Result<Vec<u8>> {
    let output_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        size: u64::from(bytes_per_row) * u64::from(height),
        usage: wgpu::BufferUsages::COPY_DST
                    // this tells wpgu that we want to read this buffer from the cpu
                    | wgpu::BufferUsages::MAP_READ,
        label: Some("Read-back buffer"),
        mapped_at_creation: false,
    });

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Read-back Encoder"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &ctx.color_texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: origin.0,
                y: origin.1,
                z: 0,
            },
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    ctx.queue.submit(iter::once(encoder.finish()));

    // NOTE: the mapping has to be requested THEN device.poll() before awaiting
    // the result. Otherwise the read-back never resolves.
    let buffer_slice = output_buffer.slice(..);
    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        tx.send(result).ok();
    });
    ctx.device.poll(wgpu::PollType::Wait {
        submission_index: None,
        timeout: None,
    })?;
    futures::executor::block_on(rx.receive())
        .ok_or_else(|| anyhow::anyhow!("Read-back channel closed before the buffer was mapped"))??;

    let data = buffer_slice.get_mapped_range().to_vec();
    output_buffer.unmap();
    Ok(data)
}
