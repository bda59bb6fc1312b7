use crate::{
    data_structures::{
        instance::InstanceRaw,
        mesh::{MeshVertex, Vertex},
        texture::Texture,
    },
    pipelines::mk_render_pipeline,
};

/// Unlit wireframe rendering. `line_mode` selects real line rasterization;
/// without it the same shader fills triangles in the accent color, which
/// keeps the mode usable on adapters without `POLYGON_MODE_LINE`.
pub fn mk_wireframe_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    material_bind_group_layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    env_bind_group_layout: &wgpu::BindGroupLayout,
    line_mode: bool,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout =
        device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Wireframe Pipeline Layout"),
            bind_group_layouts: &[
                material_bind_group_layout,
                camera_bind_group_layout,
                env_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Wireframe Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("wireframe.wgsl").into()),
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
        &[MeshVertex::desc(), InstanceRaw::desc()],
        wgpu::PrimitiveTopology::TriangleList,
        if line_mode {
            wgpu::PolygonMode::Line
        } else {
            wgpu::PolygonMode::Fill
        },
        shader,
    )
}
