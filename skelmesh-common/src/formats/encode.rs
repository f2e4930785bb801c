//! Stream encoder: [`ModelAsset`] -> `.mesh` bytes.

use std::io::Write;

use glam::Mat4;

use super::{AssetHeader, DEFAULT_SHADER, MAX_NAME_LEN, MeshRecord, ModelAsset, VERTEX_RECORD_SIZE};
use crate::FormatError;

/// Encode a complete asset into memory.
///
/// Every mesh is validated before its bytes are produced, so an error never
/// leaves a partially-correct stream behind.
pub fn encode_model_asset(asset: &ModelAsset) -> Result<Vec<u8>, FormatError> {
    let mut out = Vec::with_capacity(estimated_size(asset));

    out.extend_from_slice(&AssetHeader::new(asset.meshes.len() as u32).to_bytes());
    for mesh in &asset.meshes {
        encode_mesh(&mut out, mesh)?;
    }

    Ok(out)
}

/// Encode an asset and write it with a single `write_all`
pub fn write_model_asset<W: Write>(w: &mut W, asset: &ModelAsset) -> Result<(), FormatError> {
    let bytes = encode_model_asset(asset)?;
    w.write_all(&bytes)?;
    w.flush()?;
    Ok(())
}

fn encode_mesh(out: &mut Vec<u8>, mesh: &MeshRecord) -> Result<(), FormatError> {
    mesh.validate()?;

    let shader = if mesh.shader.is_empty() {
        DEFAULT_SHADER
    } else {
        mesh.shader.as_str()
    };

    write_str(out, &mesh.name, "mesh name")?;
    write_str(out, shader, "shader name")?;
    out.extend_from_slice(&mesh.material_index.to_ne_bytes());

    // Bones
    out.extend_from_slice(&(mesh.skeleton.len() as u32).to_ne_bytes());
    for bone in mesh.skeleton.bones() {
        write_str(out, &bone.name, "bone name")?;
        write_matrix(out, &bone.offset);
        write_matrix(out, &bone.transform);
        out.extend_from_slice(&bone.parent_index().to_ne_bytes());
    }

    // Vertices
    out.extend_from_slice(&(mesh.vertices.len() as u32).to_ne_bytes());
    out.extend_from_slice(bytemuck::cast_slice(&mesh.vertices));

    // Faces
    out.extend_from_slice(&(mesh.faces.len() as u32).to_ne_bytes());
    out.extend_from_slice(bytemuck::cast_slice(&mesh.faces));

    Ok(())
}

/// Length-prefixed string: one length byte, raw bytes, no terminator
fn write_str(out: &mut Vec<u8>, s: &str, what: &'static str) -> Result<(), FormatError> {
    let len = s.len();
    if len > MAX_NAME_LEN {
        return Err(FormatError::NameTooLong {
            what,
            name: s.to_string(),
            len,
        });
    }
    out.push(len as u8);
    out.extend_from_slice(s.as_bytes());
    Ok(())
}

fn write_matrix(out: &mut Vec<u8>, m: &Mat4) {
    out.extend_from_slice(bytemuck::cast_slice(&m.to_cols_array()));
}

fn estimated_size(asset: &ModelAsset) -> usize {
    AssetHeader::SIZE
        + asset
            .meshes
            .iter()
            .map(|m| {
                2 * (1 + MAX_NAME_LEN)
                    + 16
                    + m.skeleton.len() * (1 + MAX_NAME_LEN + 2 * super::MATRIX_SIZE + 4)
                    + m.vertices.len() * VERTEX_RECORD_SIZE
                    + m.faces.len() * super::FACE_SIZE
            })
            .sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{BoneRecord, Skeleton, VertexRecord};

    fn quad(name: &str) -> MeshRecord {
        let mut mesh = MeshRecord::new(name);
        mesh.vertices = vec![VertexRecord::default(); 4];
        mesh.faces = vec![[0, 1, 2], [2, 1, 3]];
        mesh
    }

    #[test]
    fn test_header_and_names() {
        let bytes = encode_model_asset(&ModelAsset::new(vec![quad("q")])).unwrap();

        assert_eq!(bytes[0], 236);
        assert_eq!(&bytes[1..5], &1u32.to_ne_bytes());
        // name
        assert_eq!(bytes[5], 1);
        assert_eq!(bytes[6], b'q');
        // shader defaults to "default"
        assert_eq!(bytes[7], 7);
        assert_eq!(&bytes[8..15], b"default");
    }

    #[test]
    fn test_explicit_shader_is_kept() {
        let mut mesh = quad("q");
        mesh.shader = "skinned".to_string();
        let bytes = encode_model_asset(&ModelAsset::new(vec![mesh])).unwrap();
        assert_eq!(bytes[7], 7);
        assert_eq!(&bytes[8..15], b"skinned");
    }

    #[test]
    fn test_bone_layout() {
        let mut mesh = quad("q");
        let offset = Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        mesh.skeleton = Skeleton::new(vec![BoneRecord::new("b", offset, Mat4::IDENTITY, None)]);
        let bytes = encode_model_asset(&ModelAsset::new(vec![mesh])).unwrap();

        // 5 header + 2 name + 8 shader + 4 material
        let mut at = 19;
        assert_eq!(&bytes[at..at + 4], &1u32.to_ne_bytes());
        at += 4;
        assert_eq!(&bytes[at..at + 2], &[1, b'b']);
        at += 2;
        // translation lives in column 3 of a column-major matrix
        let tx = f32::from_ne_bytes(bytes[at + 48..at + 52].try_into().unwrap());
        assert_eq!(tx, 1.0);
        at += 128;
        assert_eq!(&bytes[at..at + 4], &(-1i32).to_ne_bytes());
    }

    #[test]
    fn test_long_name_rejected() {
        let mesh = quad(&"x".repeat(256));
        let err = encode_model_asset(&ModelAsset::new(vec![mesh])).unwrap_err();
        assert!(matches!(err, FormatError::NameTooLong { len: 256, .. }));
    }

    #[test]
    fn test_255_byte_name_accepted() {
        let mesh = quad(&"x".repeat(255));
        assert!(encode_model_asset(&ModelAsset::new(vec![mesh])).is_ok());
    }

    #[test]
    fn test_no_partial_stream_on_error() {
        let mut bad = quad("bad");
        bad.faces.clear();
        let asset = ModelAsset::new(vec![quad("good"), bad]);

        let mut sink = Vec::new();
        assert!(write_model_asset(&mut sink, &asset).is_err());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_estimate_covers_output() {
        let asset = ModelAsset::new(vec![quad("a"), quad("b")]);
        let bytes = encode_model_asset(&asset).unwrap();
        assert!(estimated_size(&asset) >= bytes.len());
    }
}
