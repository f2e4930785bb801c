//! skelmesh-export library
//!
//! Turns an imported scene graph into a `.mesh` model asset:
//! - [`import`] - glTF/GLB loading into the [`scene`] arena
//! - [`skeleton`] - bone hierarchy flattening
//! - [`weights`] - influence slot assignment
//! - [`mesh`] - per-mesh conversion and scene traversal
//! - [`formats`] - stream and file writers

pub mod formats;
pub mod import;
pub mod mesh;
pub mod scene;
pub mod skeleton;
pub mod weights;

use std::path::Path;

use anyhow::Result;
use skelmesh_common::ModelAsset;

pub use import::{IMPORT_ROOT, import_gltf};
pub use mesh::{ExportOptions, convert_scene};
pub use scene::{NodeId, Scene, SceneBone, SceneMesh, SceneNode, VertexWeight};
pub use skeleton::BoneFlattener;
pub use weights::{WeightStats, assign_skin_weights};

/// Import a scene file and convert it to an in-memory model asset
pub fn export_to_memory(input: &Path, options: &ExportOptions) -> Result<ModelAsset> {
    let scene = import_gltf(input)?;
    convert_scene(&scene, options)
}
