//! Material presets and GPU material resources.
//!
//! A [`MaterialSpec`] names a fixed physical-parameter preset; the
//! compositor resolves it (plus an optional [`TextureSource`]) into one
//! shared GPU [`Material`] that is assigned to every drawable node of the
//! active model.

use std::fmt;

use wgpu::util::DeviceExt;

use crate::data_structures::texture::Texture;

/// Flat fallback color used when no texture is bound (`#9B5DE5`).
pub const FALLBACK_COLOR: [u8; 4] = [0x9B, 0x5D, 0xE5, 0xFF];
/// Accent color for the unlit wireframe preset (`#00F5D4`).
pub const WIREFRAME_COLOR: [u8; 4] = [0x00, 0xF5, 0xD4, 0xFF];

/// Named physical-material preset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MaterialSpec {
    #[default]
    Matte,
    Metallic,
    Wireframe,
    Cotton,
    Silk,
    Denim,
}

impl fmt::Display for MaterialSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MaterialSpec::Matte => "matte",
            MaterialSpec::Metallic => "metallic",
            MaterialSpec::Wireframe => "wireframe",
            MaterialSpec::Cotton => "cotton",
            MaterialSpec::Silk => "silk",
            MaterialSpec::Denim => "denim",
        };
        f.write_str(name)
    }
}

/// The resolved parameter tuple behind a [`MaterialSpec`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialParams {
    pub metalness: f32,
    pub roughness: f32,
    pub clearcoat: f32,
    /// Unlit rendering with the wireframe pipeline; texture input is ignored.
    pub wireframe: bool,
}

impl MaterialSpec {
    /// Fixed preset table. These constants are part of the viewer's visual
    /// contract and must not drift between releases.
    pub fn params(&self) -> MaterialParams {
        match self {
            MaterialSpec::Matte => MaterialParams {
                metalness: 0.1,
                roughness: 0.8,
                clearcoat: 0.0,
                wireframe: false,
            },
            MaterialSpec::Metallic => MaterialParams {
                metalness: 0.9,
                roughness: 0.1,
                clearcoat: 0.0,
                wireframe: false,
            },
            MaterialSpec::Wireframe => MaterialParams {
                metalness: 0.0,
                roughness: 1.0,
                clearcoat: 0.0,
                wireframe: true,
            },
            MaterialSpec::Cotton => MaterialParams {
                metalness: 0.0,
                roughness: 0.8,
                clearcoat: 0.0,
                wireframe: false,
            },
            MaterialSpec::Silk => MaterialParams {
                metalness: 0.1,
                roughness: 0.1,
                clearcoat: 0.9,
                wireframe: false,
            },
            MaterialSpec::Denim => MaterialParams {
                metalness: 0.2,
                roughness: 0.7,
                clearcoat: 0.0,
                wireframe: false,
            },
        }
    }

    /// Solid color used when this preset has no texture bound.
    pub fn fallback_color(&self) -> [u8; 4] {
        match self {
            MaterialSpec::Wireframe => WIREFRAME_COLOR,
            _ => FALLBACK_COLOR,
        }
    }
}

/// An encoded image to be used as a material's color map.
#[derive(Clone, PartialEq, Eq)]
pub enum TextureSource {
    /// `data:image/...;base64,...` URI, e.g. a generated style texture.
    DataUri(String),
    /// URL (wasm) or filesystem path (native) of an encoded image.
    Url(String),
}

// Data URIs can be megabytes of base64; keep them out of log lines.
impl fmt::Debug for TextureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureSource::DataUri(uri) => write!(f, "DataUri({} bytes)", uri.len()),
            TextureSource::Url(url) => write!(f, "Url({:?})", url),
        }
    }
}

/// Uniform data backing a material, padded to 16-byte alignment.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    /// Multiplied with the color map; white for both the textured and the
    /// solid-fallback case (the fallback color lives in a 1x1 map).
    pub base_color: [f32; 4],
    pub metalness: f32,
    pub roughness: f32,
    pub clearcoat: f32,
    /// 1.0 for unlit presets (wireframe), 0.0 otherwise.
    pub unlit: f32,
}

impl MaterialUniform {
    pub fn new(params: &MaterialParams) -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            metalness: params.metalness,
            roughness: params.roughness,
            clearcoat: params.clearcoat,
            unlit: if params.wireframe { 1.0 } else { 0.0 },
        }
    }
}

/// Bind-group layout shared by all materials: uniform + color map + sampler.
pub fn material_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("material_bind_group_layout"),
    })
}

/// A material resident on the GPU. One instance is shared (via `Arc`)
/// across every drawable node of the active model.
#[derive(Debug)]
pub struct Material {
    pub spec: MaterialSpec,
    pub params: MaterialParams,
    /// Whether an image texture (as opposed to the solid fallback) is bound.
    pub textured: bool,
    pub color_map: Texture,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        spec: MaterialSpec,
        color_map: Texture,
        textured: bool,
    ) -> Self {
        let params = spec.params();
        let uniform = MaterialUniform::new(&params);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} material buffer", spec)),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let sampler = color_map
            .sampler
            .clone()
            .unwrap_or_else(|| crate::data_structures::texture::create_default_sampler(device));
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&color_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
            label: Some(&format!("{} material bind group", spec)),
        });
        Self {
            spec,
            params,
            textured,
            color_map,
            buffer,
            bind_group,
        }
    }
}
