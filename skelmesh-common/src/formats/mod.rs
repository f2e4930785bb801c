//! Skeletal mesh binary format (.mesh)
//!
//! One file holds one [`ModelAsset`]. Every multi-byte field is written in
//! host-native byte order, so files are not portable across endianness.
//!
//! # Layout
//! ```text
//! u8   magic (236)
//! u32  mesh_count
//! per mesh:
//!   str  name            (u8 length + bytes, 0 = use asset name)
//!   str  shader          (u8 length + bytes, 0 = "default")
//!   u32  material_index  (reserved, ignored by the decoder)
//!   u32  bone_count
//!   per bone:
//!     str       name
//!     f32 × 16  offset matrix (column-major)
//!     f32 × 16  bind-time transform (column-major)
//!     i32       parent index (-1 = none)
//!   u32  vertex_count
//!   VertexRecord × vertex_count   (80 bytes each)
//!   u32  face_count
//!   u32 × 3 × face_count
//! ```

mod decode;
mod encode;
mod header;
mod records;
mod serialization;
mod skeleton;

pub use decode::{DecodeState, ModelDecoder, decode_model_asset};
pub use encode::{encode_model_asset, write_model_asset};
pub use header::AssetHeader;
pub use records::{BoneRecord, MeshRecord, ModelAsset, VertexRecord};
pub use serialization::BinarySerializable;
pub use skeleton::Skeleton;

// =============================================================================
// Format Constants
// =============================================================================

/// First byte of every `.mesh` stream
pub const MAGIC_NUMBER: u8 = 236;

/// File extension of the binary stream
pub const MESH_EXT: &str = "mesh";

/// File extension of the companion metadata file
pub const META_EXT: &str = "meta";

/// Shader name used when the stream carries an empty shader field
pub const DEFAULT_SHADER: &str = "default";

/// Longest name a length-prefixed string field can carry
pub const MAX_NAME_LEN: usize = u8::MAX as usize;

/// Parent index of a bone attached directly to the mesh root
pub const NO_PARENT: i32 = -1;

/// Bone index of an unused influence slot
pub const UNUSED_SLOT: i32 = -1;

/// Influence slots per vertex
pub const MAX_INFLUENCES: usize = 4;

/// Weights below this never occupy an influence slot
pub const MIN_SKIN_WEIGHT: f32 = 0.01;

/// Size of one serialized [`VertexRecord`] (20 four-byte fields)
pub const VERTEX_RECORD_SIZE: usize = 80;

/// Size of one serialized matrix (16 × f32)
pub(crate) const MATRIX_SIZE: usize = 64;

/// Size of one serialized face (3 × u32)
pub(crate) const FACE_SIZE: usize = 12;
