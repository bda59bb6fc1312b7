//! GPU end-to-end checks: a headless render of the default scene and the
//! shared-material invariant on a live scene graph. These need a working
//! adapter, so they are gated like the other windowless GPU tests.
#![cfg(feature = "integration-tests")]

use std::sync::Arc;

use cgmath::Vector3;
use wgpu::util::DeviceExt;

use verseview::{
    MaterialSpec, Shape,
    camera::{Camera, CameraUniform, Projection},
    data_structures::{
        instance::Instance,
        material::{FALLBACK_COLOR, Material, material_bind_group_layout},
        node::{NodeData, TARGET_EXTENT},
        texture::Texture,
    },
    environment::{EnvResources, EnvironmentState},
    pipelines::lit::mk_lit_pipeline,
    snapshot::{padded_bytes_per_row, strip_row_padding},
};

const WIDTH: u32 = 256;
const HEIGHT: u32 = 256;

async fn request_gpu() -> (wgpu::Device, wgpu::Queue) {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    });
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions::default())
        .await
        .expect("no graphics adapter available");
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
        })
        .await
        .expect("device request failed")
}

fn camera_resources(device: &wgpu::Device) -> (wgpu::BindGroupLayout, wgpu::BindGroup) {
    let camera = Camera::viewer_default();
    let projection = Projection::new(WIDTH, HEIGHT, cgmath::Deg(60.0), 0.1, 1000.0);
    let mut uniform = CameraUniform::new();
    uniform.update_view_proj(&camera, &projection);

    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("test camera buffer"),
        contents: bytemuck::cast_slice(&[uniform]),
        usage: wgpu::BufferUsages::UNIFORM,
    });
    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("test camera layout"),
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: &layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
        label: Some("test camera bind group"),
    });
    (layout, bind_group)
}

#[test]
fn default_cube_renders_with_the_fallback_color() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let (device, queue) = request_gpu().await;

        let (camera_layout, camera_bind_group) = camera_resources(&device);
        let env = EnvResources::new(&device, EnvironmentState::default());
        let material_layout = material_bind_group_layout(&device);
        let material = Arc::new(Material::new(
            &device,
            &material_layout,
            MaterialSpec::Matte,
            Texture::solid_color(FALLBACK_COLOR, &device, &queue),
            false,
        ));

        let mut scene = NodeData::from_mesh(Shape::Cube.mesh())
            .normalized(TARGET_EXTENT)
            .upload(&device);
        scene.set_material_all(&material);
        scene.update_world_transforms(&Instance::default());
        scene.write_to_buffers(&queue);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            width: WIDTH,
            height: HEIGHT,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Opaque,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        let pipeline = mk_lit_pipeline(
            &device,
            &config,
            &material_layout,
            &camera_layout,
            &env.bind_group_layout,
        );

        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("test target"),
            size: wgpu::Extent3d {
                width: WIDTH,
                height: HEIGHT,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());
        let depth = Texture::create_depth_texture(&device, [WIDTH, HEIGHT], "test depth");

        let mut encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("test pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.07,
                            g: 0.07,
                            b: 0.07,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&pipeline);
            scene.draw(&camera_bind_group, &env.bind_group, &mut pass);
        }

        let bytes_per_row = padded_bytes_per_row(WIDTH);
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: None,
            size: bytes_per_row as u64 * HEIGHT as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(HEIGHT),
                },
            },
            wgpu::Extent3d {
                width: WIDTH,
                height: HEIGHT,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = readback.slice(..);
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        slice.map_async(wgpu::MapMode::Read, move |v| {
            tx.send(v).unwrap();
        });
        device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(std::time::Duration::from_secs(3)),
            })
            .unwrap();
        rx.receive().await.unwrap().unwrap();

        let pixels = {
            let data = slice.get_mapped_range();
            strip_row_padding(&data, WIDTH, HEIGHT, bytes_per_row)
        };
        readback.unmap();

        let pixel = |x: u32, y: u32| {
            let i = ((y * WIDTH + x) * 4) as usize;
            [pixels[i], pixels[i + 1], pixels[i + 2]]
        };
        let center = pixel(WIDTH / 2, HEIGHT / 2);
        let corner = pixel(2, 2);

        // The normalized cube fills the view center; the corner stays clear.
        assert_ne!(center, corner, "cube did not render");
        // The fallback color is violet: blue dominates green.
        assert!(center[2] > center[1], "unexpected center color {:?}", center);
    });
}

#[test]
fn one_material_instance_is_shared_across_all_drawables() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let (device, queue) = request_gpu().await;

        let mut root = NodeData::container();
        for x in [-3.0f32, 0.0, 3.0] {
            let mut child = NodeData::from_mesh(Shape::Sphere.mesh());
            child.transform = Instance {
                position: Vector3::new(x, 0.0, 0.0),
                ..Instance::default()
            };
            // one nested level to make the recursion do real work
            let mut wrapper = NodeData::container();
            wrapper.children.push(child);
            root.children.push(wrapper);
        }
        let mut scene = root.normalized(TARGET_EXTENT).upload(&device);
        assert_eq!(scene.drawable_count(), 3);

        let material_layout = material_bind_group_layout(&device);
        let material = Arc::new(Material::new(
            &device,
            &material_layout,
            MaterialSpec::Metallic,
            Texture::solid_color(FALLBACK_COLOR, &device, &queue),
            false,
        ));
        scene.set_material_all(&material);

        let mut seen = 0;
        scene.for_each_material(&mut |m| {
            let m = m.expect("drawable without material");
            assert!(Arc::ptr_eq(m, &material));
            seen += 1;
        });
        assert_eq!(seen, 3);
    });
}
