//! Binary serialization trait for fixed-size records.
//!
//! The decoder parses the asset header through `deserialize` and sizes the
//! vertex array by `SIZE`. Arrays themselves are cast in bulk with bytemuck.

use super::{AssetHeader, VertexRecord};

/// Trait for fixed-size, binary-serializable records.
///
/// The trait returns `Vec<u8>` because associated consts cannot size a return
/// array on stable Rust.
pub trait BinarySerializable: Sized {
    /// Size of the serialized record in bytes.
    const SIZE: usize;

    /// Serialize to bytes (native byte order).
    fn serialize(&self) -> Vec<u8>;

    /// Deserialize from bytes.
    ///
    /// Returns `None` if the byte slice is too short.
    fn deserialize(bytes: &[u8]) -> Option<Self>;
}

impl BinarySerializable for AssetHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

impl BinarySerializable for VertexRecord {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        bytemuck::bytes_of(self).to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        let bytes = bytes.get(..Self::SIZE)?;
        Some(bytemuck::pod_read_unaligned(bytes))
    }
}
