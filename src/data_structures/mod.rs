//! Engine data structures: instances, meshes, materials, textures, nodes.
//!
//! This module contains the core data types for scene representation:
//!
//! - `instance` holds per-node transformation data
//! - `mesh` contains CPU mesh data and GPU mesh resources
//! - `material` contains material presets and GPU material resources
//! - `node` contains the CPU node graph and the live GPU scene tree
//! - `texture` contains the GPU texture wrapper and creation utilities

pub mod instance;
pub mod material;
pub mod mesh;
pub mod node;
pub mod texture;
