//! glTF (.glb / .gltf) parsing into the CPU node graph.
//!
//! Geometry and node transforms only; embedded PBR materials, animations
//! and skins are skipped because the viewer's compositor assigns its own
//! material to every drawable right after attach.

use std::io::{BufReader, Cursor};

use anyhow::Result;

use crate::{
    data_structures::{instance::Instance, mesh::MeshData, node::NodeData},
    resources::io,
};

pub async fn load_gltf(file_name: &str) -> Result<NodeData> {
    let bytes = io::load_binary(file_name).await?;
    let gltf = gltf::Gltf::from_reader(BufReader::new(Cursor::new(&bytes)))?;

    // Load buffers: binary chunk of a .glb, or external URIs of a .gltf
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                if let Some(blob) = gltf.blob.as_deref() {
                    buffer_data.push(blob.to_vec());
                }
            }
            gltf::buffer::Source::Uri(uri) => {
                let bin = io::load_binary(uri).await?;
                buffer_data.push(bin);
            }
        }
    }

    parse_document(&gltf, &buffer_data, file_name)
}

/// Walk the document's scenes into a single node graph.
pub fn parse_document(
    gltf: &gltf::Gltf,
    buffer_data: &[Vec<u8>],
    name: &str,
) -> Result<NodeData> {
    let mut roots = Vec::new();
    for scene in gltf.scenes() {
        for node in scene.nodes() {
            roots.push(to_node_data(node, buffer_data));
        }
    }

    anyhow::ensure!(!roots.is_empty(), "{} contains no scene nodes", name);

    let root = if roots.len() == 1 {
        roots.pop().unwrap()
    } else {
        let mut root = NodeData::container();
        root.children = roots;
        root
    };
    anyhow::ensure!(root.drawable_count() > 0, "{} contains no geometry", name);
    Ok(root)
}

fn to_node_data(node: gltf::scene::Node, buf: &[Vec<u8>]) -> NodeData {
    let mut out = NodeData::container();

    let decomposed = node.transform().decomposed();
    out.transform = Instance {
        position: decomposed.0.into(),
        rotation: decomposed.1.into(),
        scale: decomposed.2.into(),
    };

    if let Some(mesh) = node.mesh() {
        let name = mesh.name().unwrap_or("unnamed mesh");
        let mut primitives: Vec<MeshData> = mesh
            .primitives()
            .map(|primitive| primitive_mesh(&primitive, buf, name))
            .filter(|m| !m.is_empty())
            .collect();
        // A single primitive stays on this node; multiple primitives become
        // sibling drawables so each keeps its own buffers.
        if primitives.len() == 1 {
            out.mesh = Some(primitives.pop().unwrap());
        } else {
            out.children
                .extend(primitives.into_iter().map(NodeData::from_mesh));
        }
    }

    for child in node.children() {
        out.children.push(to_node_data(child, buf));
    }

    out
}

fn primitive_mesh(primitive: &gltf::Primitive, buf: &[Vec<u8>], name: &str) -> MeshData {
    let reader = primitive.reader(|buffer| buf.get(buffer.index()).map(Vec::as_slice));

    let mut mesh = MeshData::with_capacity(name, 0, 0);
    if let Some(positions) = reader.read_positions() {
        mesh.positions.extend(positions);
    }
    if let Some(normals) = reader.read_normals() {
        mesh.normals.extend(normals);
    }
    if let Some(uvs) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
        mesh.uvs.extend(uvs);
    }
    match reader.read_indices() {
        Some(indices) => mesh.indices.extend(indices.into_u32()),
        // Non-indexed primitives draw vertices in order
        None => mesh.indices.extend(0..mesh.positions.len() as u32),
    }

    mesh
}
