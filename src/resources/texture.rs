use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::{
    data_structures::model::TextureId,
    error::{LoadError, LoadResult},
    resources::load_binary,
};

/// Somewhere textures referenced by `map_Kd` can be loaded to.
///
/// The material reader calls this the moment it sees a texture record, so a
/// mesh is only ever compiled against textures that already exist.
pub trait TextureLoader {
    fn load_texture(&mut self, path: &Path) -> LoadResult<TextureId>;
}

/// Decodes an image file with the `image` crate, guessing the format from its contents.
pub fn decode_image(path: &Path) -> LoadResult<image::RgbaImage> {
    let data = load_binary(path)?;
    let img = image::load_from_memory(&data).map_err(|source| LoadError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.to_rgba8())
}

/// CPU-side texture store used by the software renderer and by tools that
/// never open a GPU device.
#[derive(Debug, Default)]
pub struct ImageTextures {
    images: Vec<image::RgbaImage>,
    by_path: HashMap<PathBuf, TextureId>,
}

impl ImageTextures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: TextureId) -> Option<&image::RgbaImage> {
        self.images.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Registers an already decoded image.
    pub fn insert(&mut self, img: image::RgbaImage) -> TextureId {
        let id = TextureId(self.images.len() as u32);
        self.images.push(img);
        id
    }
}

impl TextureLoader for ImageTextures {
    fn load_texture(&mut self, path: &Path) -> LoadResult<TextureId> {
        if let Some(id) = self.by_path.get(path) {
            return Ok(*id);
        }
        let img = decode_image(path)?;
        log::info!(
            "Loaded texture {} ({}x{})",
            path.display(),
            img.width(),
            img.height()
        );
        let id = self.insert(img);
        self.by_path.insert(path.to_path_buf(), id);
        Ok(id)
    }
}

/// Bind group layout for a single diffuse texture and its sampler.
pub fn diffuse_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("Mesh texture_bind_group_layout"),
    })
}
