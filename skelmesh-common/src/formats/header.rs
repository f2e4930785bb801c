//! Asset header: magic byte followed by the mesh count.

use super::MAGIC_NUMBER;

/// Header at the start of every `.mesh` stream (5 bytes, unpadded)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetHeader {
    pub magic: u8,
    pub mesh_count: u32,
}

impl AssetHeader {
    pub const SIZE: usize = 5;

    pub fn new(mesh_count: u32) -> Self {
        Self {
            magic: MAGIC_NUMBER,
            mesh_count,
        }
    }

    /// Write header to bytes (native byte order)
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0] = self.magic;
        bytes[1..5].copy_from_slice(&self.mesh_count.to_ne_bytes());
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            magic: bytes[0],
            mesh_count: u32::from_ne_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]),
        })
    }
}
