//! Mesh data, CPU-side and GPU-side.
//!
//! Loaders and the geometry factory produce [`MeshData`] on the CPU; the
//! viewer uploads it into a [`GpuMesh`] once it is attached to the live
//! scene. Keeping the two apart means parsing, normalization, and the
//! geometry factory can run (and be tested) without a GPU device.

use wgpu::util::DeviceExt;

/// Trait for vertex types that can describe their GPU buffer layout.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// The per-vertex data uploaded for every drawable mesh.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
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
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: cgmath::Vector3<f32>,
    pub max: cgmath::Vector3<f32>,
}

impl Aabb {
    pub fn from_point(p: cgmath::Vector3<f32>) -> Self {
        Self { min: p, max: p }
    }

    pub fn grow(&mut self, p: cgmath::Vector3<f32>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn merge(&mut self, other: &Aabb) {
        self.grow(other.min);
        self.grow(other.max);
    }

    pub fn center(&self) -> cgmath::Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    pub fn extents(&self) -> cgmath::Vector3<f32> {
        self.max - self.min
    }

    /// Largest of the three extents.
    pub fn max_extent(&self) -> f32 {
        let e = self.extents();
        e.x.max(e.y).max(e.z)
    }
}

/// CPU-side triangle mesh: positions, normals, texture coordinates, indices.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn with_capacity(name: &str, vertices: usize, indices: usize) -> Self {
        Self {
            name: name.to_string(),
            positions: Vec::with_capacity(vertices),
            normals: Vec::with_capacity(vertices),
            uvs: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    /// Bounding box in the mesh's local space, `None` for an empty mesh.
    pub fn aabb(&self) -> Option<Aabb> {
        let mut points = self.positions.iter().map(|p| cgmath::Vector3::from(*p));
        let first = points.next()?;
        let mut aabb = Aabb::from_point(first);
        for p in points {
            aabb.grow(p);
        }
        Some(aabb)
    }

    /// Pack positions/uvs/normals into the interleaved vertex layout.
    ///
    /// Missing normals and texture coordinates are zero-filled so meshes from
    /// sparse OBJ exports still upload (the shader then lights them flat).
    pub fn vertices(&self) -> Vec<MeshVertex> {
        (0..self.positions.len())
            .map(|i| MeshVertex {
                position: self.positions[i],
                tex_coords: self.uvs.get(i).copied().unwrap_or([0.0, 0.0]),
                normal: self.normals.get(i).copied().unwrap_or([0.0, 0.0, 0.0]),
            })
            .collect()
    }

    pub fn upload(&self, device: &wgpu::Device) -> GpuMesh {
        let vertices = self.vertices();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", self.name)),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", self.name)),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        GpuMesh {
            name: self.name.clone(),
            vertex_buffer,
            index_buffer,
            num_elements: self.indices.len() as u32,
        }
    }
}

/// A mesh resident on the GPU.
#[derive(Debug)]
pub struct GpuMesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

/// Render-pass extension for drawing a [`GpuMesh`] with the viewer's
/// bind-group layout (material, camera, environment).
pub trait DrawMesh<'a> {
    fn draw_mesh(
        &mut self,
        mesh: &'a GpuMesh,
        material_bind_group: &'a wgpu::BindGroup,
        camera_bind_group: &'a wgpu::BindGroup,
        env_bind_group: &'a wgpu::BindGroup,
    );
}

impl<'a, 'pass> DrawMesh<'a> for wgpu::RenderPass<'pass>
where
    'a: 'pass,
{
    fn draw_mesh(
        &mut self,
        mesh: &'a GpuMesh,
        material_bind_group: &'a wgpu::BindGroup,
        camera_bind_group: &'a wgpu::BindGroup,
        env_bind_group: &'a wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, material_bind_group, &[]);
        self.set_bind_group(1, camera_bind_group, &[]);
        self.set_bind_group(2, env_bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, 0..1);
    }
}
