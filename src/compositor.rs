//! Material composition: preset + optional texture into one shared GPU
//! material, applied recursively to every drawable of the active model.
//!
//! Composition is split in two so the decision logic stays testable without
//! a device: [`compose`] resolves what the material should be on the CPU,
//! [`upload`] turns that into GPU resources, and [`recompose`] pushes the
//! result through the whole scene graph.

use std::sync::Arc;

use crate::{
    context::Context,
    data_structures::{
        material::{Material, MaterialSpec},
        node::SceneNode,
        texture::Texture,
    },
};

/// A fully resolved material, ready for upload.
#[derive(Debug)]
pub struct ComposedMaterial {
    pub spec: MaterialSpec,
    pub image: Option<image::DynamicImage>,
}

impl ComposedMaterial {
    pub fn is_textured(&self) -> bool {
        self.image.is_some()
    }
}

/// Resolve a preset and an optionally decoded texture into the material to
/// build. Unlit presets ignore texture input entirely; a missing or failed
/// texture falls back to the preset's solid color.
pub fn compose(spec: MaterialSpec, image: Option<image::DynamicImage>) -> ComposedMaterial {
    let image = if spec.params().wireframe { None } else { image };
    ComposedMaterial { spec, image }
}

/// Build the GPU material for a composed result.
pub fn upload(ctx: &Context, composed: &ComposedMaterial) -> Arc<Material> {
    let (color_map, textured) = match &composed.image {
        Some(image) => {
            match Texture::from_image(&ctx.device, &ctx.queue, image, Some("material color map")) {
                Ok(texture) => (texture, true),
                Err(e) => {
                    log::warn!("texture upload failed, using fallback color: {:?}", e);
                    (
                        Texture::solid_color(
                            composed.spec.fallback_color(),
                            &ctx.device,
                            &ctx.queue,
                        ),
                        false,
                    )
                }
            }
        }
        None => (
            Texture::solid_color(composed.spec.fallback_color(), &ctx.device, &ctx.queue),
            false,
        ),
    };

    Arc::new(Material::new(
        &ctx.device,
        &ctx.material_bind_group_layout,
        composed.spec,
        color_map,
        textured,
    ))
}

/// Compose, upload, and assign to every drawable under `root`.
///
/// Runs synchronously on the event thread, so a frame never observes a
/// half-recomposed graph.
pub fn recompose(
    ctx: &Context,
    root: &mut SceneNode,
    spec: MaterialSpec,
    image: Option<image::DynamicImage>,
) -> Arc<Material> {
    let material = upload(ctx, &compose(spec, image));
    root.set_material_all(&material);
    material
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_image() -> image::DynamicImage {
        image::DynamicImage::new_rgba8(2, 2)
    }

    #[test]
    fn wireframe_ignores_texture_input() {
        let composed = compose(MaterialSpec::Wireframe, Some(dummy_image()));
        assert!(!composed.is_textured());
    }

    #[test]
    fn lit_presets_keep_texture_input() {
        let composed = compose(MaterialSpec::Matte, Some(dummy_image()));
        assert!(composed.is_textured());
        let composed = compose(MaterialSpec::Silk, Some(dummy_image()));
        assert!(composed.is_textured());
    }

    #[test]
    fn missing_texture_composes_flat() {
        let composed = compose(MaterialSpec::Metallic, None);
        assert!(!composed.is_textured());
        assert_eq!(composed.spec, MaterialSpec::Metallic);
    }
}
