//! Frame composition: one render pass that clears to the background color,
//! draws the reference grid when enabled, and draws the attached scene with
//! the pipeline its material asks for. The same pass serves the surface and
//! the offscreen snapshot target.

use crate::{context::Context, data_structures::node::SceneNode};

pub fn render_scene(
    ctx: &Context,
    scene: Option<&SceneNode>,
    encoder: &mut wgpu::CommandEncoder,
    color_view: &wgpu::TextureView,
    depth_view: &wgpu::TextureView,
) {
    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Scene Render Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: color_view,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(ctx.clear_color()),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
    });

    if ctx.environment.state.show_grid {
        render_pass.set_pipeline(&ctx.pipelines.grid);
        render_pass.set_bind_group(0, &ctx.camera.bind_group, &[]);
        render_pass.set_bind_group(1, &ctx.environment.bind_group, &[]);
        render_pass.set_vertex_buffer(0, ctx.grid.vertex_buffer.slice(..));
        render_pass.draw(0..ctx.grid.vertex_count, 0..1);
    }

    if let Some(scene) = scene {
        let wireframe = scene
            .material()
            .map(|m| m.params.wireframe)
            .unwrap_or(false);
        render_pass.set_pipeline(if wireframe {
            &ctx.pipelines.wireframe
        } else {
            &ctx.pipelines.lit
        });
        scene.draw(
            &ctx.camera.bind_group,
            &ctx.environment.bind_group,
            &mut render_pass,
        );
    }
}
