//! In-memory records of a `.mesh` asset.
//!
//! Records carry no pointer links: bones refer to parents and vertices refer
//! to bones by flat index, so a decoded asset is relocatable as flat buffers.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use super::{MAX_INFLUENCES, NO_PARENT, Skeleton, UNUSED_SLOT, VERTEX_RECORD_SIZE};
use crate::FormatError;

// =============================================================================
// Vertex Record
// =============================================================================

/// One vertex, laid out exactly as it appears in the stream and GPU buffers.
///
/// `tangent.w` holds the bitangent handedness (-1 or +1). Unused influence
/// slots carry bone index [`UNUSED_SLOT`] and weight 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct VertexRecord {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 4],
    pub bones: [i32; MAX_INFLUENCES],
    pub weights: [f32; MAX_INFLUENCES],
}

const _: () = assert!(std::mem::size_of::<VertexRecord>() == VERTEX_RECORD_SIZE);

impl VertexRecord {
    pub const SIZE: usize = VERTEX_RECORD_SIZE;

    /// Rigid vertex with every influence slot unused
    pub fn new(position: [f32; 3], uv: [f32; 2], normal: [f32; 3], tangent: [f32; 4]) -> Self {
        Self {
            position,
            uv,
            normal,
            tangent,
            bones: [UNUSED_SLOT; MAX_INFLUENCES],
            weights: [0.0; MAX_INFLUENCES],
        }
    }

    /// Index of the first unused influence slot
    pub fn first_free_slot(&self) -> Option<usize> {
        self.bones.iter().position(|&b| b == UNUSED_SLOT)
    }

    /// Place one influence into the first unused slot.
    ///
    /// Occupies exactly one slot. Returns `false` (and leaves the vertex
    /// untouched) when all slots are taken.
    pub fn push_influence(&mut self, bone: u32, weight: f32) -> bool {
        match self.first_free_slot() {
            Some(slot) => {
                self.bones[slot] = bone as i32;
                self.weights[slot] = weight;
                true
            }
            None => false,
        }
    }

    /// Populated `(bone index, weight)` slots, in slot order
    pub fn influences(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.bones
            .iter()
            .zip(self.weights.iter())
            .filter(|&(&bone, _)| bone != UNUSED_SLOT)
            .map(|(&bone, &weight)| (bone as u32, weight))
    }

    pub fn influence_count(&self) -> usize {
        self.influences().count()
    }

    pub fn is_skinned(&self) -> bool {
        self.bones.iter().any(|&b| b != UNUSED_SLOT)
    }

    /// Weights rescaled so populated slots sum to 1.0.
    ///
    /// The format stores weights as assigned; renderers that need unit sums
    /// call this after decode. Vertices without influences return all zeros.
    pub fn normalized_weights(&self) -> [f32; MAX_INFLUENCES] {
        let total: f32 = self.influences().map(|(_, w)| w).sum();
        let mut out = [0.0; MAX_INFLUENCES];
        if total <= f32::EPSILON {
            return out;
        }
        for (slot, (&bone, &weight)) in self.bones.iter().zip(self.weights.iter()).enumerate() {
            if bone != UNUSED_SLOT {
                out[slot] = weight / total;
            }
        }
        out
    }
}

impl Default for VertexRecord {
    fn default() -> Self {
        Self::new([0.0; 3], [0.0; 2], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0, 1.0])
    }
}

// =============================================================================
// Bone Record
// =============================================================================

/// One skeletal joint
#[derive(Debug, Clone, PartialEq)]
pub struct BoneRecord {
    pub name: String,
    /// Inverse bind-pose matrix (mesh space -> bone space)
    pub offset: Mat4,
    /// Bind-time transform accumulated up to, but excluding, the mesh root
    pub transform: Mat4,
    /// Flat index of the parent bone; `None` when parented at the root
    pub parent: Option<u32>,
}

impl BoneRecord {
    pub fn new(
        name: impl Into<String>,
        offset: Mat4,
        transform: Mat4,
        parent: Option<u32>,
    ) -> Self {
        Self {
            name: name.into(),
            offset,
            transform,
            parent,
        }
    }

    /// Parent index as stored in the stream
    pub fn parent_index(&self) -> i32 {
        self.parent.map_or(NO_PARENT, |p| p as i32)
    }
}

// =============================================================================
// Mesh Record / Model Asset
// =============================================================================

/// One drawable unit
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshRecord {
    /// Empty means "use the asset name" once written and decoded
    pub name: String,
    /// Empty means [`super::DEFAULT_SHADER`]
    pub shader: String,
    /// Reserved for forward compatibility; the decoder ignores it
    pub material_index: u32,
    pub skeleton: Skeleton,
    pub vertices: Vec<VertexRecord>,
    pub faces: Vec<[u32; 3]>,
}

impl MeshRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// A mesh with no bones is drawn without skinning
    pub fn is_rigid(&self) -> bool {
        self.skeleton.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Face list flattened into a triangle index buffer
    pub fn indices(&self) -> &[u32] {
        bytemuck::cast_slice(&self.faces)
    }

    /// Structural checks shared by the encoder and decoder: non-empty
    /// vertex and face lists, parent closure, influence and face indices in
    /// range.
    pub fn validate(&self) -> Result<(), FormatError> {
        if self.vertices.is_empty() {
            return Err(FormatError::NoVertices {
                mesh: self.name.clone(),
            });
        }
        if self.faces.is_empty() {
            return Err(FormatError::NoFaces {
                mesh: self.name.clone(),
            });
        }

        self.skeleton.validate(&self.name)?;

        let bone_count = self.skeleton.len() as u32;
        for (i, vertex) in self.vertices.iter().enumerate() {
            for &bone in &vertex.bones {
                if bone != UNUSED_SLOT && (bone < 0 || bone as u32 >= bone_count) {
                    return Err(FormatError::InvalidInfluence {
                        mesh: self.name.clone(),
                        vertex: i as u32,
                        bone,
                        bone_count,
                    });
                }
            }
        }

        let vertex_count = self.vertices.len() as u32;
        for (i, face) in self.faces.iter().enumerate() {
            if let Some(&index) = face.iter().find(|&&idx| idx >= vertex_count) {
                return Err(FormatError::FaceIndexOutOfRange {
                    mesh: self.name.clone(),
                    face: i as u32,
                    index,
                    vertex_count,
                });
            }
        }

        Ok(())
    }
}

/// Complete contents of one `.mesh` stream
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelAsset {
    pub meshes: Vec<MeshRecord>,
}

impl ModelAsset {
    pub fn new(meshes: Vec<MeshRecord>) -> Self {
        Self { meshes }
    }

    pub fn mesh(&self, name: &str) -> Option<&MeshRecord> {
        self.meshes.iter().find(|m| m.name == name)
    }
}
