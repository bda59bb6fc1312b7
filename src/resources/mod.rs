//! Asset resolution: descriptors, loading, parsing, and texture decoding.
//!
//! This module turns a [`ModelDescriptor`] into a CPU node graph and a
//! [`TextureSource`] into a decoded image. Everything here is GPU-free;
//! the viewer uploads the results once they arrive on the event thread.

use anyhow::{Context as _, Result};
use base64::Engine as _;

use crate::{
    data_structures::{material::TextureSource, node::NodeData},
    geometry::Shape,
};

pub mod gltf;
pub mod io;
pub mod obj;

/// Declared format of an externally loaded asset. Selection is by this
/// declaration (or file extension), never by content sniffing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetFormat {
    /// Binary or text glTF transmission format (.glb / .gltf).
    Gltf,
    /// Plain-text vertex/face format (.obj).
    Obj,
}

impl AssetFormat {
    /// Infer a format from a file extension, for upload pickers that only
    /// know the file name.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "glb" | "gltf" => Some(AssetFormat::Gltf),
            "obj" => Some(AssetFormat::Obj),
            _ => None,
        }
    }
}

/// The one active model: a built-in shape or an external asset. Immutable;
/// replaced wholesale on every model switch.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelDescriptor {
    Procedural(Shape),
    Asset { url: String, format: AssetFormat },
}

impl Default for ModelDescriptor {
    fn default() -> Self {
        ModelDescriptor::Procedural(Shape::Cube)
    }
}

/// Resolve a descriptor into an (un-normalized) CPU node graph.
///
/// Procedural shapes never fail; asset loads surface IO and parse errors
/// to the caller, which keeps the previous model on display.
pub async fn load_node_graph(descriptor: &ModelDescriptor) -> Result<NodeData> {
    match descriptor {
        ModelDescriptor::Procedural(shape) => Ok(NodeData::from_mesh(shape.mesh())),
        ModelDescriptor::Asset { url, format } => match format {
            AssetFormat::Gltf => gltf::load_gltf(url)
                .await
                .with_context(|| format!("loading gltf asset {}", url)),
            AssetFormat::Obj => obj::load_obj(url)
                .await
                .with_context(|| format!("loading obj asset {}", url)),
        },
    }
}

/// Decode a texture source into an image, ready for sRGB upload.
pub async fn decode_texture(source: &TextureSource) -> Result<image::DynamicImage> {
    let bytes = match source {
        TextureSource::DataUri(uri) => decode_data_uri(uri)?,
        TextureSource::Url(url) => io::load_binary(url)
            .await
            .with_context(|| format!("fetching texture {}", url))?,
    };
    image::load_from_memory(&bytes).context("decoding texture image")
}

fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let payload = uri
        .split_once("base64,")
        .map(|(_, payload)| payload)
        .context("texture data URI is not base64-encoded")?;
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .context("decoding base64 texture payload")
}
