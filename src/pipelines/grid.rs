use wgpu::util::DeviceExt;

use crate::{
    data_structures::{mesh::Vertex, texture::Texture},
    pipelines::mk_render_pipeline,
};

/// Y position of the reference grid, just under a normalized model.
pub const GRID_HEIGHT: f32 = -2.0;
/// Half-width of the grid in world units.
pub const GRID_HALF_EXTENT: f32 = 10.0;
/// Spacing between grid lines.
pub const GRID_STEP: f32 = 1.0;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GridVertex {
    pub position: [f32; 3],
}

impl Vertex for GridVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GridVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }
}

/// The grid's line-list vertex buffer. Built once, drawn only when the
/// environment enables it.
#[derive(Debug)]
pub struct GridMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub vertex_count: u32,
}

impl GridMesh {
    pub fn new(device: &wgpu::Device) -> Self {
        let vertices = grid_lines(GRID_HALF_EXTENT, GRID_STEP, GRID_HEIGHT);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grid Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            vertex_buffer,
            vertex_count: vertices.len() as u32,
        }
    }
}

/// Line-list vertices for a square grid on the XZ plane.
pub fn grid_lines(half_extent: f32, step: f32, height: f32) -> Vec<GridVertex> {
    let lines_per_side = (2.0 * half_extent / step).round() as i32;
    let mut vertices = Vec::with_capacity(((lines_per_side + 1) * 4) as usize);
    for i in 0..=lines_per_side {
        let offset = -half_extent + i as f32 * step;
        // one line along X, one along Z
        vertices.push(GridVertex {
            position: [-half_extent, height, offset],
        });
        vertices.push(GridVertex {
            position: [half_extent, height, offset],
        });
        vertices.push(GridVertex {
            position: [offset, height, -half_extent],
        });
        vertices.push(GridVertex {
            position: [offset, height, half_extent],
        });
    }
    vertices
}

pub fn mk_grid_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    env_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout =
        device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Grid Pipeline Layout"),
            bind_group_layouts: &[camera_bind_group_layout, env_bind_group_layout],
            push_constant_ranges: &[],
        });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Grid Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("grid.wgsl").into()),
    };

    mk_render_pipeline(
        device,
        &render_pipeline_layout,
        config.format,
        Some(wgpu::BlendState {
            alpha: wgpu::BlendComponent::REPLACE,
            color: wgpu::BlendComponent::REPLACE,
        }),
        Some(Texture::DEPTH_FORMAT),
        &[GridVertex::desc()],
        wgpu::PrimitiveTopology::LineList,
        wgpu::PolygonMode::Fill,
        shader,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_lines_are_pairs() {
        let vertices = grid_lines(10.0, 1.0, -2.0);
        assert_eq!(vertices.len() % 2, 0);
        // 21 lines per axis, 2 vertices each
        assert_eq!(vertices.len(), 21 * 4);
    }

    #[test]
    fn grid_lies_on_requested_plane() {
        for v in grid_lines(4.0, 0.5, -2.0) {
            assert_eq!(v.position[1], -2.0);
        }
    }
}
