//! Snapshot export: render the current scene offscreen, read the pixels
//! back, encode a PNG, and hand it to the platform (a file on native, a
//! browser download on wasm).
//!
//! Capture is split in two: [`begin_capture`] records and submits the GPU
//! work synchronously on the event thread, the returned [`PendingSnapshot`]
//! finishes the readback asynchronously. On wasm the pending half is moved
//! into a `spawn_local` future so the event loop never blocks.

use anyhow::{Context as _, Result};

use crate::{
    context::Context,
    data_structures::{node::SceneNode, texture::Texture},
    render,
};

pub const SNAPSHOT_FILE: &str = "snapshot.png";

/// Buffer rows must be aligned to `COPY_BYTES_PER_ROW_ALIGNMENT` for the
/// texture-to-buffer copy.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Drop the per-row alignment padding from mapped readback data.
pub fn strip_row_padding(padded: &[u8], width: u32, height: u32, bytes_per_row: u32) -> Vec<u8> {
    let row_bytes = (width * 4) as usize;
    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * bytes_per_row as usize;
        pixels.extend_from_slice(&padded[start..start + row_bytes]);
    }
    pixels
}

/// A submitted snapshot render whose readback has not completed yet.
#[derive(Debug)]
pub struct PendingSnapshot {
    device: wgpu::Device,
    readback: wgpu::Buffer,
    width: u32,
    height: u32,
    bytes_per_row: u32,
}

/// Render the scene into an offscreen target at the surface size and submit
/// the readback copy.
pub fn begin_capture(ctx: &Context, scene: Option<&SceneNode>) -> PendingSnapshot {
    let width = ctx.config.width;
    let height = ctx.config.height;

    let target = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("snapshot target"),
        size: wgpu::Extent3d {
            width,
            height,
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
    let depth = Texture::create_depth_texture(&ctx.device, [width, height], "snapshot depth");

    let bytes_per_row = padded_bytes_per_row(width);
    let readback = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("snapshot readback buffer"),
        size: bytes_per_row as u64 * height as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("snapshot encoder"),
        });
    render::render_scene(ctx, scene, &mut encoder, &target_view, &depth.view);
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
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    ctx.queue.submit(std::iter::once(encoder.finish()));

    PendingSnapshot {
        device: ctx.device.clone(),
        readback,
        width,
        height,
        bytes_per_row,
    }
}

impl PendingSnapshot {
    /// Wait for the readback, strip the row padding, and encode the PNG.
    pub async fn finish(self) -> Result<Vec<u8>> {
        let slice = self.readback.slice(..);
        let (sender, receiver) = futures_intrusive::channel::shared::oneshot_channel();
        slice.map_async(wgpu::MapMode::Read, move |v| {
            let _ = sender.send(v);
        });
        // The browser polls for us on wasm
        #[cfg(not(target_arch = "wasm32"))]
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .context("waiting for snapshot readback")?;
        receiver
            .receive()
            .await
            .context("snapshot readback cancelled")?
            .context("mapping snapshot readback buffer")?;

        let pixels = {
            let padded = slice.get_mapped_range();
            strip_row_padding(&padded, self.width, self.height, self.bytes_per_row)
        };
        self.readback.unmap();

        encode_png(pixels, self.width, self.height)
    }
}

/// One-call capture for callers that can await on the event thread.
pub async fn capture_png(ctx: &Context, scene: Option<&SceneNode>) -> Result<Vec<u8>> {
    begin_capture(ctx, scene).finish().await
}

fn encode_png(pixels: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>> {
    let image = image::RgbaImage::from_raw(width, height, pixels)
        .context("snapshot pixel buffer has unexpected size")?;
    let mut png = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut png, image::ImageFormat::Png)
        .context("encoding snapshot PNG")?;
    Ok(png.into_inner())
}

/// Write the snapshot next to the working directory.
#[cfg(not(target_arch = "wasm32"))]
pub fn deliver_png(png: &[u8]) -> Result<std::path::PathBuf> {
    let path = std::path::PathBuf::from(SNAPSHOT_FILE);
    std::fs::write(&path, png).with_context(|| format!("writing {}", path.display()))?;
    log::info!("snapshot written to {}", path.display());
    Ok(path)
}

/// Trigger a browser download via a temporary anchor element.
#[cfg(target_arch = "wasm32")]
pub fn deliver_png(png: &[u8]) -> Result<()> {
    use base64::Engine as _;
    use wasm_bindgen::JsCast;

    let href = format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    );
    let document = web_sys::window()
        .and_then(|w| w.document())
        .context("no browser document")?;
    let anchor: web_sys::HtmlAnchorElement = document
        .create_element("a")
        .ok()
        .and_then(|e| e.dyn_into().ok())
        .context("creating download anchor")?;
    anchor.set_href(&href);
    anchor.set_download(SNAPSHOT_FILE);
    anchor.click();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_padding_aligns_to_copy_requirement() {
        // 100 px * 4 bytes = 400, next multiple of 256 is 512
        assert_eq!(padded_bytes_per_row(100), 512);
        // already aligned widths stay untouched
        assert_eq!(padded_bytes_per_row(64), 256);
    }

    #[test]
    fn strip_row_padding_keeps_pixel_rows() {
        let width = 2u32;
        let height = 2u32;
        let bytes_per_row = 16u32;
        let mut padded = vec![0u8; (bytes_per_row * height) as usize];
        // first pixel of each row marked
        padded[0] = 0xAA;
        padded[bytes_per_row as usize] = 0xBB;

        let pixels = strip_row_padding(&padded, width, height, bytes_per_row);
        assert_eq!(pixels.len(), (width * height * 4) as usize);
        assert_eq!(pixels[0], 0xAA);
        assert_eq!(pixels[(width * 4) as usize], 0xBB);
    }
}
