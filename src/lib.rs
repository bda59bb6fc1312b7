//! verseview
//!
//! A lightweight, cross-platform viewer engine for a single styled 3D model,
//! focused on native and WASM compatibility. The crate owns the full scene
//! lifecycle: a GPU scene graph, a continuous render loop, async asset
//! loading with stale-generation discard, recursive material recomposition,
//! environment control, and snapshot export.
//!
//! High-level modules
//! - `camera`: fixed viewer camera, projection and uniforms
//! - `compositor`: material composition and recursive application
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: meshes, instances, materials, textures, node graphs
//! - `environment`: light/background/fog/grid state and GPU resources
//! - `geometry`: procedural shape factory
//! - `pipelines`: lit, wireframe and grid render pipelines
//! - `render`: frame composition shared by the surface and snapshot paths
//! - `resources`: asset IO and parsing (glTF/OBJ) and texture decoding
//! - `snapshot`: framebuffer readback and PNG export
//! - `viewer`: the scene/render lifecycle manager and winit event loop
//!

pub mod camera;
pub mod compositor;
pub mod context;
pub mod data_structures;
pub mod environment;
pub mod geometry;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod snapshot;
pub mod viewer;

pub use data_structures::material::{MaterialSpec, TextureSource};
pub use environment::{EnvironmentState, FogSettings};
pub use geometry::Shape;
pub use resources::{AssetFormat, ModelDescriptor};
pub use viewer::{ViewerConfig, ViewerHandle, ViewerInput, run};
