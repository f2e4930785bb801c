//! Scene mesh -> mesh record conversion

use anyhow::{Context, Result, bail};
use glam::Vec3;
use skelmesh_common::{DEFAULT_SHADER, MeshRecord, ModelAsset, VertexRecord};

use crate::scene::{Scene, SceneMesh};
use crate::skeleton::BoneFlattener;
use crate::weights::assign_skin_weights;

/// Knobs for one export
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Node whose subtree is exported; the scene root when `None`
    pub root: Option<String>,
    /// Shader name written for every mesh; `"default"` when `None`
    pub shader: Option<String>,
}

/// Convert every mesh under the export root, in scene-graph pre-order.
///
/// Each mesh is named after the node it hangs from.
pub fn convert_scene(scene: &Scene, options: &ExportOptions) -> Result<ModelAsset> {
    let root = match &options.root {
        Some(name) => scene
            .find_node(scene.root(), name)
            .with_context(|| format!("Root node '{}' not found in scene", name))?,
        None => scene.root(),
    };
    let shader = options.shader.as_deref().unwrap_or(DEFAULT_SHADER);
    let flattener = BoneFlattener::new(scene, root);

    let mut meshes = Vec::new();
    for id in scene.preorder(root) {
        let node = scene.node(id);
        for &index in &node.meshes {
            let source = &scene.meshes[index];
            let record = convert_mesh(&flattener, source, &node.name, shader)
                .with_context(|| format!("Failed to convert mesh on node '{}'", node.name))?;
            tracing::info!(
                "Mesh '{}': {} vertices, {} faces, {} bones",
                record.name,
                record.vertex_count(),
                record.face_count(),
                record.skeleton.len()
            );
            meshes.push(record);
        }
    }

    if meshes.is_empty() {
        bail!("No meshes under '{}'", scene.node(root).name);
    }

    Ok(ModelAsset::new(meshes))
}

/// Build one mesh record: vertices, faces, bone table and influence slots
pub fn convert_mesh(
    flattener: &BoneFlattener<'_>,
    mesh: &SceneMesh,
    name: &str,
    shader: &str,
) -> Result<MeshRecord> {
    let mut vertices = build_vertices(mesh)?;
    let faces = build_faces(mesh)?;
    let skeleton = flattener.flatten(mesh)?;

    let stats = assign_skin_weights(&mut vertices, &mesh.bones)?;
    if stats.below_threshold > 0 {
        tracing::debug!(
            "'{}': {} weights under threshold discarded",
            name,
            stats.below_threshold
        );
    }

    let mut record = MeshRecord::new(name);
    record.shader = shader.to_string();
    record.material_index = mesh.material_index;
    record.skeleton = skeleton;
    record.vertices = vertices;
    record.faces = faces;
    Ok(record)
}

/// Interleave the scene attributes into vertex records with empty slots
pub fn build_vertices(mesh: &SceneMesh) -> Result<Vec<VertexRecord>> {
    let count = mesh.positions.len();
    let normals = mesh
        .normals
        .as_deref()
        .with_context(|| format!("Mesh '{}' has no normals", mesh.name))?;

    check_len(&mesh.name, "normals", normals.len(), count)?;
    if let Some(uvs) = &mesh.uvs {
        check_len(&mesh.name, "uvs", uvs.len(), count)?;
    }

    let tangent_frame = match (&mesh.tangents, &mesh.bitangents) {
        (Some(t), Some(b)) => {
            check_len(&mesh.name, "tangents", t.len(), count)?;
            check_len(&mesh.name, "bitangents", b.len(), count)?;
            Some((t.as_slice(), b.as_slice()))
        }
        _ => {
            tracing::warn!(
                "Mesh '{}' has no tangent frame, generating one",
                mesh.name
            );
            None
        }
    };

    let vertices = (0..count)
        .map(|i| {
            let normal = normals[i];
            let uv = mesh.uvs.as_ref().map_or([0.0; 2], |uvs| uvs[i]);
            let tangent = match tangent_frame {
                Some((t, b)) => {
                    let w = tangent_handedness(normal.into(), t[i].into(), b[i].into());
                    [t[i][0], t[i][1], t[i][2], w]
                }
                None => {
                    let t = fallback_tangent(normal.into());
                    [t.x, t.y, t.z, 1.0]
                }
            };
            VertexRecord::new(mesh.positions[i], uv, normal, tangent)
        })
        .collect();

    Ok(vertices)
}

/// Triangles only; any other polygon aborts the export
pub fn build_faces(mesh: &SceneMesh) -> Result<Vec<[u32; 3]>> {
    mesh.faces
        .iter()
        .enumerate()
        .map(|(i, face)| match face.as_slice() {
            &[a, b, c] => Ok([a, b, c]),
            other => bail!(
                "Mesh '{}' face {} has {} indices, expected 3",
                mesh.name,
                i,
                other.len()
            ),
        })
        .collect()
}

/// Sign of the tangent frame: -1 when `cross(n, t)` points away from `b`
pub fn tangent_handedness(normal: Vec3, tangent: Vec3, bitangent: Vec3) -> f32 {
    if normal.cross(tangent).dot(bitangent) < 0.0 {
        -1.0
    } else {
        1.0
    }
}

fn fallback_tangent(normal: Vec3) -> Vec3 {
    let n = normal.normalize_or_zero();
    if n == Vec3::ZERO {
        return Vec3::X;
    }
    n.any_orthonormal_vector()
}

fn check_len(mesh: &str, what: &str, len: usize, expected: usize) -> Result<()> {
    if len != expected {
        bail!(
            "Mesh '{}' has {} {}, expected one per position ({})",
            mesh,
            len,
            what,
            expected
        );
    }
    Ok(())
}
