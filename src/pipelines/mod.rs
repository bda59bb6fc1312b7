//! Render pipelines for the viewer's three draw modes: lit geometry, unlit
//! wireframe, and the reference grid. All three share one parameterized
//! pipeline constructor.

pub mod grid;
pub mod lit;
pub mod wireframe;

/// Every pipeline the viewer ever needs, built once at startup.
#[derive(Debug)]
pub struct Pipelines {
    pub lit: wgpu::RenderPipeline,
    pub wireframe: wgpu::RenderPipeline,
    pub grid: wgpu::RenderPipeline,
    /// Whether the wireframe pipeline actually rasterizes lines. When the
    /// adapter lacks `POLYGON_MODE_LINE` the wireframe pipeline fills
    /// triangles with the accent color instead.
    pub line_mode: bool,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        material_bind_group_layout: &wgpu::BindGroupLayout,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        env_bind_group_layout: &wgpu::BindGroupLayout,
        line_mode: bool,
    ) -> Self {
        Self {
            lit: lit::mk_lit_pipeline(
                device,
                config,
                material_bind_group_layout,
                camera_bind_group_layout,
                env_bind_group_layout,
            ),
            wireframe: wireframe::mk_wireframe_pipeline(
                device,
                config,
                material_bind_group_layout,
                camera_bind_group_layout,
                env_bind_group_layout,
                line_mode,
            ),
            grid: grid::mk_grid_pipeline(
                device,
                config,
                camera_bind_group_layout,
                env_bind_group_layout,
            ),
            line_mode,
        }
    }
}

pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    depth_format: Option<wgpu::TextureFormat>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    topology: wgpu::PrimitiveTopology,
    polygon_mode: wgpu::PolygonMode,
    shader: wgpu::ShaderModuleDescriptor,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(shader);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Render Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Wireframe and lines draw both sides
            cull_mode: match polygon_mode {
                wgpu::PolygonMode::Fill if topology == wgpu::PrimitiveTopology::TriangleList => {
                    Some(wgpu::Face::Back)
                }
                _ => None,
            },
            polygon_mode,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}
