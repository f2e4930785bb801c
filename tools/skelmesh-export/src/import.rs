//! glTF/GLB scene import
//!
//! Builds a [`Scene`] under a synthetic identity root named [`IMPORT_ROOT`].
//! Each primitive becomes one scene mesh on the node that carries it. Skin
//! joints that weight at least one vertex of the primitive become its bones,
//! with the inverse bind matrices as offsets.

use std::path::Path;

use anyhow::{Context, Result, bail};
use glam::{Mat4, Vec3};

use crate::scene::{NodeId, Scene, SceneBone, SceneMesh, VertexWeight};

/// Name of the synthetic node parenting the glTF scene roots
pub const IMPORT_ROOT: &str = "RootNode";

/// Load a glTF or GLB file into a scene graph
pub fn import_gltf(input: &Path) -> Result<Scene> {
    let (document, buffers, _images) =
        gltf::import(input).with_context(|| format!("Failed to load glTF: {:?}", input))?;

    let gltf_scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .context("No scenes found in glTF")?;

    let mut scene = Scene::new(IMPORT_ROOT);
    let root = scene.root();
    for node in gltf_scene.nodes() {
        add_node(&mut scene, root, &node, &buffers)?;
    }

    tracing::debug!(
        "Imported {:?}: {} nodes, {} meshes",
        input,
        scene.nodes().len(),
        scene.meshes.len()
    );
    Ok(scene)
}

fn node_name(node: &gltf::Node<'_>) -> String {
    node.name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()))
}

fn add_node(
    scene: &mut Scene,
    parent: NodeId,
    node: &gltf::Node<'_>,
    buffers: &[gltf::buffer::Data],
) -> Result<()> {
    let name = node_name(node);
    let transform = Mat4::from_cols_array_2d(&node.transform().matrix());
    let id = scene.add_node(parent, name.clone(), transform);

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            let scene_mesh = read_primitive(&name, &primitive, node.skin(), buffers)
                .with_context(|| {
                    format!(
                        "Failed to read primitive {} of mesh {:?}",
                        primitive.index(),
                        mesh.name().unwrap_or(&name)
                    )
                })?;
            scene.add_mesh(id, scene_mesh);
        }
    }

    for child in node.children() {
        add_node(scene, id, &child, buffers)?;
    }
    Ok(())
}

fn read_primitive(
    name: &str,
    primitive: &gltf::Primitive<'_>,
    skin: Option<gltf::Skin<'_>>,
    buffers: &[gltf::buffer::Data],
) -> Result<SceneMesh> {
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        bail!("Primitive mode {:?} is not supported, only triangles", primitive.mode());
    }

    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .context("No positions in mesh")?
        .collect();
    let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|iter| iter.collect());
    let uvs: Option<Vec<[f32; 2]>> = reader
        .read_tex_coords(0)
        .map(|iter| iter.into_f32().collect());

    // glTF stores the bitangent as a sign in tangent.w
    let (tangents, bitangents) = match (reader.read_tangents(), &normals) {
        (Some(iter), Some(normals)) => {
            let raw: Vec<[f32; 4]> = iter.collect();
            let bitangents = raw
                .iter()
                .zip(normals)
                .map(|(t, &n)| {
                    let b = Vec3::from(n).cross(Vec3::new(t[0], t[1], t[2])) * t[3];
                    b.to_array()
                })
                .collect();
            let tangents = raw.iter().map(|t| [t[0], t[1], t[2]]).collect();
            (Some(tangents), Some(bitangents))
        }
        _ => (None, None),
    };

    let indices: Vec<u32> = match reader.read_indices() {
        Some(iter) => iter.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    let faces = indices.chunks(3).map(<[u32]>::to_vec).collect();

    let bones = match skin {
        Some(skin) => {
            let joint_count = skin.joints().count();
            let mut joint_weights: Vec<Vec<VertexWeight>> = vec![Vec::new(); joint_count];
            let mut set = 0;
            while let (Some(joints), Some(weights)) =
                (reader.read_joints(set), reader.read_weights(set))
            {
                for (vertex, (j, w)) in joints.into_u16().zip(weights.into_f32()).enumerate() {
                    for (&joint, &weight) in j.iter().zip(w.iter()) {
                        if weight <= 0.0 {
                            continue;
                        }
                        let slot = joint_weights.get_mut(joint as usize).with_context(|| {
                            format!(
                                "Joint index {} out of range for skin with {} joints",
                                joint, joint_count
                            )
                        })?;
                        slot.push(VertexWeight {
                            vertex: vertex as u32,
                            weight,
                        });
                    }
                }
                set += 1;
            }
            read_bones(&skin, buffers, joint_weights)
        }
        None => Vec::new(),
    };

    Ok(SceneMesh {
        name: name.to_string(),
        positions,
        uvs,
        normals,
        tangents,
        bitangents,
        faces,
        bones,
        material_index: primitive.material().index().unwrap_or(0) as u32,
    })
}

/// Joints that carry weight, in skin joint order
fn read_bones(
    skin: &gltf::Skin<'_>,
    buffers: &[gltf::buffer::Data],
    joint_weights: Vec<Vec<VertexWeight>>,
) -> Vec<SceneBone> {
    let reader = skin.reader(|buffer| Some(&buffers[buffer.index()]));
    let inverse_bind: Vec<Mat4> = reader
        .read_inverse_bind_matrices()
        .map(|iter| iter.map(|m| Mat4::from_cols_array_2d(&m)).collect())
        .unwrap_or_default();

    skin.joints()
        .zip(joint_weights)
        .enumerate()
        .filter(|(_, (_, weights))| !weights.is_empty())
        .map(|(i, (joint, weights))| SceneBone {
            name: node_name(&joint),
            offset: inverse_bind.get(i).copied().unwrap_or(Mat4::IDENTITY),
            weights,
        })
        .collect()
}
