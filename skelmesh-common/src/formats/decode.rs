//! Stream decoder: `.mesh` bytes -> [`ModelAsset`].
//!
//! The decoder walks `Unopened -> HeaderValidated -> MeshParsed* -> Ready`.
//! Any structural failure moves it to `Failed` and the whole asset is
//! abandoned; there is no partial result.

use std::io::Read;

use bytemuck::Pod;
use glam::Mat4;

use super::{
    AssetHeader, BinarySerializable, BoneRecord, DEFAULT_SHADER, FACE_SIZE, MAGIC_NUMBER,
    MATRIX_SIZE, MeshRecord, ModelAsset, NO_PARENT, Skeleton, VertexRecord,
};
use crate::FormatError;

/// Upper bound on one allocation step while reading a record array
const READ_CHUNK_BYTES: usize = 64 * 1024;

/// Progress of a [`ModelDecoder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    Unopened,
    HeaderValidated { mesh_count: u32 },
    MeshParsed { parsed: u32, mesh_count: u32 },
    Ready,
    Failed,
}

impl DecodeState {
    fn label(&self) -> &'static str {
        match self {
            Self::Unopened => "unopened",
            Self::HeaderValidated { .. } => "header-validated",
            Self::MeshParsed { .. } => "mid-asset",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

/// Incremental reader for one `.mesh` stream.
///
/// `asset_name` replaces mesh names stored with length 0.
pub struct ModelDecoder<R> {
    reader: R,
    asset_name: String,
    state: DecodeState,
    budget: Option<u64>,
}

impl<R: Read> ModelDecoder<R> {
    pub fn new(reader: R, asset_name: impl Into<String>) -> Self {
        Self {
            reader,
            asset_name: asset_name.into(),
            state: DecodeState::Unopened,
            budget: None,
        }
    }

    /// Cap the number of bytes the decoder may consume.
    ///
    /// Counts are checked against the remaining budget before anything is
    /// allocated for them.
    pub fn with_budget(mut self, max_bytes: u64) -> Self {
        self.budget = Some(max_bytes);
        self
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Bytes the decoder may still consume, if a budget was set
    pub fn remaining_budget(&self) -> Option<u64> {
        self.budget
    }

    /// Read and check the header. The mesh count is only read once the magic
    /// byte has matched.
    pub fn read_header(&mut self) -> Result<AssetHeader, FormatError> {
        if self.state != DecodeState::Unopened {
            return Err(self.invalid("read the header"));
        }
        let result = self.read_header_inner();
        self.track(result)
    }

    /// Read the next mesh, or `None` once every mesh has been read
    pub fn next_mesh(&mut self) -> Result<Option<MeshRecord>, FormatError> {
        let (parsed, mesh_count) = match self.state {
            DecodeState::HeaderValidated { mesh_count } => (0, mesh_count),
            DecodeState::MeshParsed { parsed, mesh_count } => (parsed, mesh_count),
            DecodeState::Ready => return Ok(None),
            _ => return Err(self.invalid("read a mesh")),
        };

        if parsed == mesh_count {
            self.state = DecodeState::Ready;
            return Ok(None);
        }

        let result = self.read_mesh();
        let mesh = self.track(result)?;
        self.state = DecodeState::MeshParsed {
            parsed: parsed + 1,
            mesh_count,
        };
        Ok(Some(mesh))
    }

    /// Read the whole asset
    pub fn decode(&mut self) -> Result<ModelAsset, FormatError> {
        if self.state == DecodeState::Unopened {
            self.read_header()?;
        }
        let mut meshes = Vec::new();
        while let Some(mesh) = self.next_mesh()? {
            meshes.push(mesh);
        }
        Ok(ModelAsset::new(meshes))
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    // =========================================================================
    // Grammar
    // =========================================================================

    fn read_header_inner(&mut self) -> Result<AssetHeader, FormatError> {
        let mut bytes = [0u8; AssetHeader::SIZE];
        self.read_bytes(&mut bytes[..1], "magic number")?;
        if bytes[0] != MAGIC_NUMBER {
            return Err(FormatError::BadMagic {
                found: bytes[0],
                expected: MAGIC_NUMBER,
            });
        }
        self.read_bytes(&mut bytes[1..], "mesh count")?;
        let header = AssetHeader::deserialize(&bytes).ok_or(FormatError::Truncated {
            what: "asset header",
        })?;

        self.state = DecodeState::HeaderValidated {
            mesh_count: header.mesh_count,
        };
        tracing::debug!("'{}': {} meshes", self.asset_name, header.mesh_count);
        Ok(header)
    }

    fn read_mesh(&mut self) -> Result<MeshRecord, FormatError> {
        let mut name = self.read_str("mesh name")?;
        if name.is_empty() {
            name = self.asset_name.clone();
        }

        let mut shader = self.read_str("shader name")?;
        if shader.is_empty() {
            shader = DEFAULT_SHADER.to_string();
        }

        let material_index = self.read_u32("material index")?;

        let bone_count = self.read_u32("bone count")?;
        self.check_budget(
            bone_count as u64 * (1 + 2 * MATRIX_SIZE as u64 + 4),
            "bone table",
        )?;
        let mut bones = Vec::new();
        for _ in 0..bone_count {
            bones.push(self.read_bone()?);
        }

        let vertex_count = self.read_u32("vertex count")?;
        if vertex_count == 0 {
            return Err(FormatError::NoVertices { mesh: name });
        }
        let vertices: Vec<VertexRecord> = self.read_array(
            vertex_count,
            <VertexRecord as BinarySerializable>::SIZE,
            "vertices",
            "vertex array",
        )?;

        let face_count = self.read_u32("face count")?;
        if face_count == 0 {
            return Err(FormatError::NoFaces { mesh: name });
        }
        let faces: Vec<[u32; 3]> = self.read_array(face_count, FACE_SIZE, "faces", "face array")?;

        let mesh = MeshRecord {
            name,
            shader,
            material_index,
            skeleton: Skeleton::new(bones),
            vertices,
            faces,
        };
        mesh.validate()?;

        tracing::debug!(
            "mesh '{}': {} bones, {} vertices, {} faces",
            mesh.name,
            bone_count,
            vertex_count,
            face_count
        );
        Ok(mesh)
    }

    fn read_bone(&mut self) -> Result<BoneRecord, FormatError> {
        let name = self.read_str("bone name")?;
        let offset = self.read_matrix("bone offset matrix")?;
        let transform = self.read_matrix("bone transform")?;
        let parent = self.read_i32("bone parent index")?;

        // Range is checked by Skeleton::validate once the table is complete
        let parent = if parent == NO_PARENT {
            None
        } else {
            Some(parent as u32)
        };

        Ok(BoneRecord {
            name,
            offset,
            transform,
            parent,
        })
    }

    // =========================================================================
    // Primitive reads
    // =========================================================================

    fn read_bytes(&mut self, buf: &mut [u8], what: &'static str) -> Result<(), FormatError> {
        self.check_budget(buf.len() as u64, what)?;
        self.reader
            .read_exact(buf)
            .map_err(|e| FormatError::from_read(e, what))?;
        if let Some(remaining) = self.budget.as_mut() {
            *remaining -= buf.len() as u64;
        }
        Ok(())
    }

    fn read_u8(&mut self, what: &'static str) -> Result<u8, FormatError> {
        let mut b = [0u8; 1];
        self.read_bytes(&mut b, what)?;
        Ok(b[0])
    }

    fn read_u32(&mut self, what: &'static str) -> Result<u32, FormatError> {
        let mut b = [0u8; 4];
        self.read_bytes(&mut b, what)?;
        Ok(u32::from_ne_bytes(b))
    }

    fn read_i32(&mut self, what: &'static str) -> Result<i32, FormatError> {
        let mut b = [0u8; 4];
        self.read_bytes(&mut b, what)?;
        Ok(i32::from_ne_bytes(b))
    }

    fn read_matrix(&mut self, what: &'static str) -> Result<Mat4, FormatError> {
        let mut cols = [0f32; 16];
        self.read_bytes(bytemuck::cast_slice_mut(&mut cols), what)?;
        Ok(Mat4::from_cols_array(&cols))
    }

    fn read_str(&mut self, what: &'static str) -> Result<String, FormatError> {
        let len = self.read_u8(what)? as usize;
        if len == 0 {
            return Ok(String::new());
        }
        let mut bytes = vec![0u8; len];
        self.read_bytes(&mut bytes, what)?;
        String::from_utf8(bytes).map_err(|_| FormatError::InvalidUtf8 { what })
    }

    // =========================================================================
    // Bookkeeping
    // =========================================================================

    fn check_budget(&self, requested: u64, what: &'static str) -> Result<(), FormatError> {
        match self.budget {
            Some(remaining) if requested > remaining => Err(FormatError::BudgetExceeded {
                what,
                requested,
                remaining,
            }),
            _ => Ok(()),
        }
    }

    /// Read `count` records of `size` bytes each.
    ///
    /// The whole array is checked against the budget up front, but storage
    /// only grows in steps of at most [`READ_CHUNK_BYTES`] as the bytes
    /// arrive. A count the stream cannot back ends in `Truncated` after one
    /// step instead of committing memory for every record.
    fn read_array<T: Pod>(
        &mut self,
        count: u32,
        size: usize,
        what: &'static str,
        array: &'static str,
    ) -> Result<Vec<T>, FormatError> {
        debug_assert_eq!(size, std::mem::size_of::<T>());
        self.check_budget(count as u64 * size as u64, what)?;

        let count = count as usize;
        let step = (READ_CHUNK_BYTES / size).max(1);
        let mut items: Vec<T> = Vec::new();
        while items.len() < count {
            let start = items.len();
            let n = step.min(count - start);
            items
                .try_reserve(n)
                .map_err(|_| FormatError::AllocationRejected {
                    what,
                    count: count as u64,
                })?;
            items.resize(start + n, T::zeroed());
            self.read_bytes(bytemuck::cast_slice_mut(&mut items[start..]), array)?;
        }
        Ok(items)
    }

    fn track<T>(&mut self, result: Result<T, FormatError>) -> Result<T, FormatError> {
        if result.is_err() {
            self.state = DecodeState::Failed;
        }
        result
    }

    fn invalid(&self, action: &'static str) -> FormatError {
        FormatError::InvalidState {
            state: self.state.label(),
            action,
        }
    }
}

/// Decode one complete asset from a stream.
///
/// No byte budget is applied. Counts in an untrusted stream can still ask for
/// large arrays, so callers that know the stream length should cap it with
/// [`ModelDecoder::with_budget`].
pub fn decode_model_asset<R: Read>(
    reader: R,
    asset_name: &str,
) -> Result<ModelAsset, FormatError> {
    ModelDecoder::new(reader, asset_name).decode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::encode_model_asset;
    use std::io::Cursor;

    fn cube() -> MeshRecord {
        let mut mesh = MeshRecord::new("cube");
        mesh.shader = DEFAULT_SHADER.to_string();
        mesh.vertices = (0..8)
            .map(|i| {
                let p = [(i & 1) as f32, ((i >> 1) & 1) as f32, ((i >> 2) & 1) as f32];
                VertexRecord::new(p, [p[0], p[1]], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0, 1.0])
            })
            .collect();
        mesh.faces = vec![
            [0, 1, 2],
            [2, 1, 3],
            [4, 6, 5],
            [5, 6, 7],
            [0, 4, 1],
            [1, 4, 5],
            [2, 3, 6],
            [3, 7, 6],
        ];
        mesh
    }

    fn skinned() -> MeshRecord {
        let mut mesh = MeshRecord::new("arm");
        mesh.shader = "skinned".to_string();
        mesh.material_index = 2;
        mesh.skeleton = Skeleton::new(vec![
            BoneRecord::new(
                "upper",
                Mat4::from_translation(glam::Vec3::Y),
                Mat4::IDENTITY,
                None,
            ),
            BoneRecord::new(
                "lower",
                Mat4::from_scale(glam::Vec3::splat(2.0)),
                Mat4::from_translation(glam::Vec3::NEG_Y),
                Some(0),
            ),
        ]);
        mesh.vertices = vec![VertexRecord::default(); 3];
        mesh.vertices[0].push_influence(0, 1.0);
        mesh.vertices[1].push_influence(0, 0.5);
        mesh.vertices[1].push_influence(1, 0.5);
        mesh.faces = vec![[0, 1, 2]];
        mesh
    }

    fn encode(meshes: Vec<MeshRecord>) -> Vec<u8> {
        encode_model_asset(&ModelAsset::new(meshes)).unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let asset = ModelAsset::new(vec![cube(), skinned()]);
        let bytes = encode_model_asset(&asset).unwrap();
        let decoded = decode_model_asset(Cursor::new(bytes), "model").unwrap();
        assert_eq!(decoded, asset);
    }

    #[test]
    fn test_minimal_cube_size() {
        let bytes = encode(vec![cube()]);
        let mesh_head = (1 + 4) + (1 + 7) + 4 + 4;
        let expected = AssetHeader::SIZE + mesh_head + 4 + 8 * VertexRecord::SIZE + 4 + 8 * 3 * 4;
        assert_eq!(bytes.len(), expected);

        let decoded = decode_model_asset(Cursor::new(bytes), "cube").unwrap();
        let mesh = &decoded.meshes[0];
        assert!(mesh.is_rigid());
        assert_eq!(mesh.shader, "default");
    }

    #[test]
    fn test_bad_magic_reads_one_byte() {
        let mut bytes = encode(vec![cube()]);
        bytes[0] = 235;
        let mut decoder = ModelDecoder::new(Cursor::new(bytes), "cube");

        let err = decoder.read_header().unwrap_err();
        assert!(matches!(err, FormatError::BadMagic { found: 235, expected: 236 }));
        assert_eq!(decoder.state(), DecodeState::Failed);
        assert_eq!(decoder.into_inner().position(), 1);
    }

    #[test]
    fn test_header_parsed_after_magic() {
        let mut decoder = ModelDecoder::new(Cursor::new(encode(vec![cube(), cube()])), "cube");
        let header = decoder.read_header().unwrap();
        assert_eq!(header, AssetHeader::new(2));
        assert_eq!(decoder.into_inner().position(), AssetHeader::SIZE as u64);

        // Magic present, mesh count cut short
        let err = decode_model_asset(Cursor::new([MAGIC_NUMBER, 1, 0]), "cube").unwrap_err();
        assert!(matches!(err, FormatError::Truncated { what: "mesh count" }));
    }

    #[test]
    fn test_empty_name_uses_asset_name() {
        let mut mesh = cube();
        mesh.name.clear();
        let decoded = decode_model_asset(Cursor::new(encode(vec![mesh])), "crate").unwrap();
        assert_eq!(decoded.meshes[0].name, "crate");
    }

    #[test]
    fn test_empty_shader_field_uses_default() {
        // Hand-written stream: the encoder never emits an empty shader field
        let mut bytes = encode(vec![cube()]);
        // header(5) + name(1 + 4), then shader length byte
        assert_eq!(bytes[10], 7);
        bytes.splice(10..18, [0u8]);
        let decoded = decode_model_asset(Cursor::new(bytes), "cube").unwrap();
        assert_eq!(decoded.meshes[0].shader, DEFAULT_SHADER);
    }

    #[test]
    fn test_truncated_stream() {
        let bytes = encode(vec![skinned()]);
        for cut in [3, 12, 40, bytes.len() - 1] {
            let err = decode_model_asset(Cursor::new(&bytes[..cut]), "arm").unwrap_err();
            assert!(
                matches!(err, FormatError::Truncated { .. }),
                "cut at {cut}: {err}"
            );
        }
    }

    #[test]
    fn test_zero_vertex_count_is_fatal() {
        let mut bytes = AssetHeader::new(1).to_bytes().to_vec();
        bytes.extend([1, b'm', 0]); // name "m", default shader
        bytes.extend(0u32.to_ne_bytes()); // material
        bytes.extend(0u32.to_ne_bytes()); // bones
        bytes.extend(0u32.to_ne_bytes()); // vertices
        let err = decode_model_asset(Cursor::new(bytes), "m").unwrap_err();
        assert!(matches!(err, FormatError::NoVertices { .. }));
    }

    #[test]
    fn test_zero_face_count_is_fatal() {
        let mut bytes = AssetHeader::new(1).to_bytes().to_vec();
        bytes.extend([1, b'm', 0]);
        bytes.extend(0u32.to_ne_bytes());
        bytes.extend(0u32.to_ne_bytes());
        bytes.extend(1u32.to_ne_bytes());
        bytes.extend(bytemuck::bytes_of(&VertexRecord::default()));
        bytes.extend(0u32.to_ne_bytes()); // faces
        let err = decode_model_asset(Cursor::new(bytes), "m").unwrap_err();
        assert!(matches!(err, FormatError::NoFaces { .. }));
    }

    #[test]
    fn test_bad_parent_is_fatal() {
        let mut bytes = encode(vec![skinned()]);
        // Patch bone 1's parent index (last 4 bytes of the bone table)
        let bone_table_end = 5 + 4 + 8 + 4 + 4 + 2 * (1 + 5 + 128 + 4);
        bytes[bone_table_end - 4..bone_table_end].copy_from_slice(&7i32.to_ne_bytes());
        let err = decode_model_asset(Cursor::new(bytes), "arm").unwrap_err();
        assert!(matches!(err, FormatError::InvalidParentIndex { bone: 1, parent: 7, .. }));
    }

    #[test]
    fn test_second_mesh_failure_abandons_asset() {
        let mut bytes = encode(vec![cube(), cube()]);
        bytes.truncate(bytes.len() - 4);
        let mut decoder = ModelDecoder::new(Cursor::new(bytes), "cube");
        assert!(decoder.decode().is_err());
        assert_eq!(decoder.state(), DecodeState::Failed);
        assert!(matches!(
            decoder.next_mesh(),
            Err(FormatError::InvalidState { state: "failed", .. })
        ));
    }

    #[test]
    fn test_state_transitions() {
        let bytes = encode(vec![cube()]);
        let mut decoder = ModelDecoder::new(Cursor::new(bytes), "cube");
        assert_eq!(decoder.state(), DecodeState::Unopened);
        assert!(decoder.next_mesh().is_err());

        let bytes = encode(vec![cube()]);
        let mut decoder = ModelDecoder::new(Cursor::new(bytes), "cube");
        decoder.read_header().unwrap();
        assert_eq!(decoder.state(), DecodeState::HeaderValidated { mesh_count: 1 });
        assert!(decoder.next_mesh().unwrap().is_some());
        assert_eq!(
            decoder.state(),
            DecodeState::MeshParsed {
                parsed: 1,
                mesh_count: 1
            }
        );
        assert!(decoder.next_mesh().unwrap().is_none());
        assert_eq!(decoder.state(), DecodeState::Ready);
    }

    #[test]
    fn test_budget_rejects_oversized_count() {
        let mut bytes = AssetHeader::new(1).to_bytes().to_vec();
        bytes.extend([1, b'm', 0]);
        bytes.extend(0u32.to_ne_bytes());
        bytes.extend(0u32.to_ne_bytes());
        bytes.extend(u32::MAX.to_ne_bytes()); // vertex count
        let err = ModelDecoder::new(Cursor::new(bytes), "m")
            .with_budget(1024)
            .decode()
            .unwrap_err();
        assert!(matches!(err, FormatError::BudgetExceeded { what: "vertices", .. }));
    }

    #[test]
    fn test_unbacked_vertex_count_without_budget() {
        // 50M vertices claimed, one present
        let mut bytes = AssetHeader::new(1).to_bytes().to_vec();
        bytes.extend([1, b'm', 0]);
        bytes.extend(0u32.to_ne_bytes());
        bytes.extend(0u32.to_ne_bytes());
        bytes.extend(50_000_000u32.to_ne_bytes());
        bytes.extend(bytemuck::bytes_of(&VertexRecord::default()));

        let mut decoder = ModelDecoder::new(Cursor::new(bytes), "m");
        let err = decoder.decode().unwrap_err();
        assert!(matches!(err, FormatError::Truncated { what: "vertex array" }));
        assert_eq!(decoder.state(), DecodeState::Failed);
    }

    #[test]
    fn test_large_array_spans_read_steps() {
        let mut mesh = cube();
        let step = READ_CHUNK_BYTES / VertexRecord::SIZE;
        mesh.vertices = (0..step * 2 + 7)
            .map(|i| {
                let p = [i as f32, 0.0, 0.0];
                VertexRecord::new(p, [0.0; 2], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0, 1.0])
            })
            .collect();
        let asset = ModelAsset::new(vec![mesh]);
        let bytes = encode_model_asset(&asset).unwrap();

        let decoded = decode_model_asset(Cursor::new(bytes), "cube").unwrap();
        assert_eq!(decoded, asset);
    }

    #[test]
    fn test_budget_exact_fit() {
        let bytes = encode(vec![cube()]);
        let len = bytes.len() as u64;
        let mut decoder = ModelDecoder::new(Cursor::new(bytes), "cube").with_budget(len);
        assert!(decoder.decode().is_ok());
        assert_eq!(decoder.remaining_budget(), Some(0));
    }

    #[test]
    fn test_invalid_utf8_name() {
        let mut bytes = encode(vec![cube()]);
        bytes[6] = 0xFF;
        let err = decode_model_asset(Cursor::new(bytes), "cube").unwrap_err();
        assert!(matches!(err, FormatError::InvalidUtf8 { what: "mesh name" }));
    }
}
