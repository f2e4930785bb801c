//! Bone hierarchy flattener (scene graph -> flat bone table)
//!
//! Each bone a mesh names is located in the scene under a designated root.
//! Its bind transform is the chain of local transforms from the bone node up
//! to, but excluding, that root. Parents are linked by flat index, and only
//! to ancestors that are themselves bones of the same mesh.

use anyhow::{Context, Result};
use glam::Mat4;
use hashbrown::HashMap;
use skelmesh_common::{BoneRecord, Skeleton};

use crate::scene::{NodeId, Scene, SceneMesh};

/// Flattens mesh bone lists against one subtree of a scene
pub struct BoneFlattener<'s> {
    scene: &'s Scene,
    root: NodeId,
    /// Node name -> node, first pre-order match wins
    nodes_by_name: HashMap<&'s str, NodeId>,
}

impl<'s> BoneFlattener<'s> {
    pub fn new(scene: &'s Scene, root: NodeId) -> Self {
        let mut nodes_by_name = HashMap::new();
        for id in scene.preorder(root) {
            nodes_by_name
                .entry(scene.node(id).name.as_str())
                .or_insert(id);
        }
        Self {
            scene,
            root,
            nodes_by_name,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Build the bone table for one mesh, in the mesh's bone order
    pub fn flatten(&self, mesh: &SceneMesh) -> Result<Skeleton> {
        let mut bone_index: HashMap<&str, u32> = HashMap::with_capacity(mesh.bones.len());
        for (i, bone) in mesh.bones.iter().enumerate() {
            bone_index.entry(bone.name.as_str()).or_insert(i as u32);
        }

        let mut bones = Vec::with_capacity(mesh.bones.len());
        for bone in &mesh.bones {
            let node = *self.nodes_by_name.get(bone.name.as_str()).with_context(|| {
                format!(
                    "Bone '{}' of mesh '{}' has no node under '{}'",
                    bone.name,
                    mesh.name,
                    self.scene.node(self.root).name
                )
            })?;

            let transform = self.bind_transform(node);
            let parent = self.parent_index(node, &bone_index);
            bones.push(BoneRecord::new(bone.name.clone(), bone.offset, transform, parent));
        }

        Ok(Skeleton::new(bones))
    }

    /// Local transforms from `node` up to the root, root excluded
    pub fn bind_transform(&self, node: NodeId) -> Mat4 {
        let mut transform = Mat4::IDENTITY;
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.root {
                break;
            }
            let n = self.scene.node(id);
            transform = n.transform * transform;
            current = n.parent;
        }
        transform
    }

    fn parent_index(&self, node: NodeId, bone_index: &HashMap<&str, u32>) -> Option<u32> {
        if node == self.root {
            return None;
        }
        let parent = self.scene.node(node).parent?;
        if parent == self.root {
            return None;
        }

        let parent_name = self.scene.node(parent).name.as_str();
        let index = bone_index.get(parent_name).copied();
        if index.is_none() {
            tracing::debug!(
                "'{}' is parented to non-bone node '{}', chain broken",
                self.scene.node(node).name,
                parent_name
            );
        }
        index
    }
}
