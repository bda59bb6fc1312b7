//! OBJ parsing into the CPU node graph.
//!
//! Materials referenced by the OBJ are deliberately not resolved: the
//! compositor overrides every drawable with the active material right after
//! attach, so loading .mtl textures would only waste bandwidth.

use std::io::{BufReader, Cursor};

use anyhow::Result;

use crate::{
    data_structures::{mesh::MeshData, node::NodeData},
    resources::io,
};

pub async fn load_obj(file_name: &str) -> Result<NodeData> {
    let obj_text = io::load_string(file_name).await?;
    parse_obj(&obj_text, file_name)
}

/// Parse OBJ text into a node graph: one child node per contained model.
pub fn parse_obj(obj_text: &str, name: &str) -> Result<NodeData> {
    let obj_cursor = Cursor::new(obj_text);
    let mut obj_reader = BufReader::new(obj_cursor);

    let (models, _materials) = tobj::load_obj_buf(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        // material libraries are ignored, see module docs
        |_| Ok(Default::default()),
    )?;

    let mut nodes: Vec<NodeData> = models
        .iter()
        .filter_map(|m| {
            let mesh = to_mesh_data(m, name);
            if mesh.is_empty() {
                log::warn!("skipping empty mesh {:?} in {}", m.name, name);
                None
            } else {
                Some(NodeData::from_mesh(mesh))
            }
        })
        .collect();

    anyhow::ensure!(!nodes.is_empty(), "{} contains no usable geometry", name);

    if nodes.len() == 1 {
        Ok(nodes.pop().unwrap())
    } else {
        let mut root = NodeData::container();
        root.children = nodes;
        Ok(root)
    }
}

fn to_mesh_data(m: &tobj::Model, file_name: &str) -> MeshData {
    let vertex_count = m.mesh.positions.len() / 3;
    let mut mesh = MeshData::with_capacity(file_name, vertex_count, m.mesh.indices.len());

    for i in 0..vertex_count {
        mesh.positions.push([
            m.mesh.positions[i * 3],
            m.mesh.positions[i * 3 + 1],
            m.mesh.positions[i * 3 + 2],
        ]);
        mesh.uvs.push([
            m.mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
            1.0 - m.mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
        ]);
        mesh.normals.push([
            m.mesh.normals.get(i * 3).map_or(0.0, |f| *f),
            m.mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
            m.mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
        ]);
    }
    mesh.indices.extend_from_slice(&m.mesh.indices);

    mesh
}
