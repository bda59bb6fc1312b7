//! Node graphs: the CPU parse/factory output and the live GPU scene tree.
//!
//! Loaders and the geometry factory produce a [`NodeData`] hierarchy, which
//! is normalized (centered and uniformly scaled) and then uploaded into a
//! [`SceneNode`] tree attached to the scene root. Drawability is a
//! capability (`mesh.is_some()`), not a node type: loaded assets yield
//! arbitrary mixes of container and mesh nodes.

use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::data_structures::{
    instance::Instance,
    material::Material,
    mesh::{Aabb, DrawMesh, GpuMesh, MeshData},
};

/// Fixed world-unit extent every attached model is normalized to.
pub const TARGET_EXTENT: f32 = 4.0;

/// CPU-side scene node: a local transform, an optional mesh, and children.
#[derive(Clone, Debug, Default)]
pub struct NodeData {
    pub transform: Instance,
    pub mesh: Option<MeshData>,
    pub children: Vec<NodeData>,
}

impl NodeData {
    pub fn container() -> Self {
        Self::default()
    }

    pub fn from_mesh(mesh: MeshData) -> Self {
        Self {
            mesh: Some(mesh),
            ..Self::default()
        }
    }

    pub fn drawable_count(&self) -> usize {
        let own = if self.mesh.is_some() { 1 } else { 0 };
        own + self
            .children
            .iter()
            .map(NodeData::drawable_count)
            .sum::<usize>()
    }

    /// Bounding box of the whole graph in the root's parent space.
    pub fn bounds(&self) -> Option<Aabb> {
        let mut out = None;
        self.accumulate_bounds(&Instance::default(), &mut out);
        out
    }

    fn accumulate_bounds(&self, parent: &Instance, out: &mut Option<Aabb>) {
        let world = parent * &self.transform;
        if let Some(mesh) = &self.mesh {
            for p in &mesh.positions {
                let wp = world.transform_point((*p).into());
                match out {
                    Some(aabb) => aabb.grow(wp),
                    None => *out = Some(Aabb::from_point(wp)),
                }
            }
        }
        for child in &self.children {
            child.accumulate_bounds(&world, out);
        }
    }

    /// Wrap the graph in a root whose transform maps the bounding-box center
    /// to the origin and uniformly scales the maximum extent to `target`.
    ///
    /// Graphs without drawable geometry (or with degenerate extent) are
    /// returned unscaled under an identity root.
    pub fn normalized(self, target: f32) -> NodeData {
        let mut root = NodeData::container();
        let transform = match self.bounds() {
            Some(aabb) if aabb.max_extent() > f32::EPSILON => {
                let factor = target / aabb.max_extent();
                Instance {
                    position: -aabb.center() * factor,
                    scale: cgmath::Vector3::new(factor, factor, factor),
                    ..Instance::default()
                }
            }
            _ => {
                log::warn!("normalizing a node graph without measurable extent");
                Instance::default()
            }
        };
        root.transform = transform;
        root.children.push(self);
        root
    }

    /// Upload the graph into a live GPU scene tree.
    pub fn upload(&self, device: &wgpu::Device) -> SceneNode {
        let (mesh, instance_buffer) = match &self.mesh {
            Some(mesh) => {
                let gpu = mesh.upload(device);
                let raw = [Instance::default().to_raw()];
                let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Node Instance Buffer"),
                    contents: bytemuck::cast_slice(&raw),
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                });
                (Some(gpu), Some(buffer))
            }
            None => (None, None),
        };
        SceneNode {
            transform: self.transform.clone(),
            world: self.transform.clone(),
            mesh,
            material: None,
            instance_buffer,
            children: self.children.iter().map(|c| c.upload(device)).collect(),
        }
    }
}

/// Live GPU scene node. Exactly one root is attached to the scene at a time;
/// every drawable descendant holds a reference to the one shared material.
pub struct SceneNode {
    pub transform: Instance,
    world: Instance,
    mesh: Option<GpuMesh>,
    material: Option<Arc<Material>>,
    instance_buffer: Option<wgpu::Buffer>,
    children: Vec<SceneNode>,
}

impl SceneNode {
    /// Assign the same shared material instance to every drawable node in
    /// the subtree.
    pub fn set_material_all(&mut self, material: &Arc<Material>) {
        if self.mesh.is_some() {
            self.material = Some(material.clone());
        }
        for child in &mut self.children {
            child.set_material_all(material);
        }
    }

    /// The shared material, if any drawable carries one yet.
    pub fn material(&self) -> Option<&Arc<Material>> {
        if let Some(material) = &self.material {
            return Some(material);
        }
        self.children.iter().find_map(SceneNode::material)
    }

    pub fn drawable_count(&self) -> usize {
        let own = if self.mesh.is_some() { 1 } else { 0 };
        own + self
            .children
            .iter()
            .map(SceneNode::drawable_count)
            .sum::<usize>()
    }

    /// Visit every drawable node's material reference.
    pub fn for_each_material(&self, f: &mut dyn FnMut(Option<&Arc<Material>>)) {
        if self.mesh.is_some() {
            f(self.material.as_ref());
        }
        for child in &self.children {
            child.for_each_material(f);
        }
    }

    /// Recompute cached world transforms from `parent` downwards.
    pub fn update_world_transforms(&mut self, parent: &Instance) {
        self.world = parent * &self.transform;
        for child in &mut self.children {
            child.update_world_transforms(&self.world);
        }
    }

    /// Push the cached world transforms into the per-node instance buffers.
    pub fn write_to_buffers(&self, queue: &wgpu::Queue) {
        if let Some(buffer) = &self.instance_buffer {
            let raw = [self.world.to_raw()];
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(&raw));
        }
        for child in &self.children {
            child.write_to_buffers(queue);
        }
    }

    pub fn draw<'a, 'pass>(
        &'a self,
        camera_bind_group: &'a wgpu::BindGroup,
        env_bind_group: &'a wgpu::BindGroup,
        render_pass: &'pass mut wgpu::RenderPass<'a>,
    ) where
        'a: 'pass,
    {
        if let (Some(mesh), Some(material), Some(instances)) =
            (&self.mesh, &self.material, &self.instance_buffer)
        {
            render_pass.set_vertex_buffer(1, instances.slice(..));
            render_pass.draw_mesh(mesh, &material.bind_group, camera_bind_group, env_bind_group);
        }
        for child in &self.children {
            child.draw(camera_bind_group, env_bind_group, render_pass);
        }
    }
}
