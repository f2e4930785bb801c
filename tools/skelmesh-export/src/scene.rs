//! In-memory scene graph handed over by the importer.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Node 0 is
//! always the scene root.

use glam::Mat4;

/// Index of a node in [`Scene`]
pub type NodeId = usize;

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    /// Transform relative to the parent node
    pub transform: Mat4,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Indices into [`Scene::meshes`]
    pub meshes: Vec<usize>,
}

/// One bone's influence on one vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexWeight {
    pub vertex: u32,
    pub weight: f32,
}

/// A bone as the importer sees it: a name that matches a scene node, the
/// inverse bind matrix, and the vertices it moves.
#[derive(Debug, Clone)]
pub struct SceneBone {
    pub name: String,
    pub offset: Mat4,
    pub weights: Vec<VertexWeight>,
}

/// Raw mesh data as imported. Faces are polygons; only triangles export.
#[derive(Debug, Clone, Default)]
pub struct SceneMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub tangents: Option<Vec<[f32; 3]>>,
    pub bitangents: Option<Vec<[f32; 3]>>,
    pub faces: Vec<Vec<u32>>,
    pub bones: Vec<SceneBone>,
    pub material_index: u32,
}

/// Node arena plus the meshes the nodes reference
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    pub meshes: Vec<SceneMesh>,
}

impl Scene {
    /// Scene with a single identity root
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![SceneNode {
                name: root_name.into(),
                transform: Mat4::IDENTITY,
                parent: None,
                children: Vec::new(),
                meshes: Vec::new(),
            }],
            meshes: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn add_node(&mut self, parent: NodeId, name: impl Into<String>, transform: Mat4) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(SceneNode {
            name: name.into(),
            transform,
            parent: Some(parent),
            children: Vec::new(),
            meshes: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Attach a mesh to a node; returns the mesh index
    pub fn add_mesh(&mut self, node: NodeId, mesh: SceneMesh) -> usize {
        let index = self.meshes.len();
        self.meshes.push(mesh);
        self.nodes[node].meshes.push(index);
        index
    }

    /// Depth-first pre-order walk of the subtree under `from` (inclusive)
    pub fn preorder(&self, from: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id].children.iter().rev());
        }
        order
    }

    /// First node named `name` in a pre-order walk from `from`
    pub fn find_node(&self, from: NodeId, name: &str) -> Option<NodeId> {
        self.preorder(from)
            .into_iter()
            .find(|&id| self.nodes[id].name == name)
    }
}
