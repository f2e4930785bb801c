//! Programmatic GLB fixtures
//!
//! Builds a small skinned quad:
//!
//! ```text
//! Armature (+5 x)
//! ├── Hip (+1 y)
//! │   └── Knee (+1 y)
//! └── Leg (mesh, skin [Hip, Knee])
//! ```

#![allow(dead_code)]

use serde_json::json;
use std::path::Path;

pub const QUAD_POSITIONS: [[f32; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 2.0, 0.0],
    [0.0, 2.0, 0.0],
];
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// JOINTS_0 / WEIGHTS_0 per vertex
pub const QUAD_JOINTS: [[u8; 4]; 4] = [[0, 0, 0, 0], [0, 1, 0, 0], [1, 0, 0, 0], [1, 0, 0, 0]];
pub const QUAD_WEIGHTS: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.5, 0.5, 0.0, 0.0],
    [0.995, 0.005, 0.0, 0.0],
    [1.0, 0.0, 0.0, 0.0],
];

fn push_f32s(buf: &mut Vec<u8>, values: &[f32]) {
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
}

fn translation(x: f32, y: f32, z: f32) -> [f32; 16] {
    [
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        x, y, z, 1.0,
    ]
}

/// Binary chunk plus `(offset, length)` of each buffer view
fn quad_buffer() -> (Vec<u8>, Vec<(usize, usize)>) {
    let mut buf = Vec::new();
    let mut views = Vec::new();
    let mut view = |buf: &mut Vec<u8>, start: usize| views.push((start, buf.len() - start));

    let start = buf.len();
    push_f32s(&mut buf, QUAD_POSITIONS.as_flattened());
    view(&mut buf, start);

    let start = buf.len();
    push_f32s(&mut buf, &[0.0f32, 0.0, 1.0].repeat(4));
    view(&mut buf, start);

    let start = buf.len();
    push_f32s(&mut buf, &[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
    view(&mut buf, start);

    let start = buf.len();
    buf.extend_from_slice(QUAD_JOINTS.as_flattened());
    view(&mut buf, start);

    let start = buf.len();
    push_f32s(&mut buf, QUAD_WEIGHTS.as_flattened());
    view(&mut buf, start);

    let start = buf.len();
    for i in QUAD_INDICES {
        buf.extend_from_slice(&i.to_le_bytes());
    }
    view(&mut buf, start);

    // Inverse bind matrices of Hip (world y=1) and Knee (world y=2)
    let start = buf.len();
    push_f32s(&mut buf, &translation(-5.0, -1.0, 0.0));
    push_f32s(&mut buf, &translation(-5.0, -2.0, 0.0));
    view(&mut buf, start);

    (buf, views)
}

fn quad_json(buffer_len: usize, views: &[(usize, usize)]) -> serde_json::Value {
    let buffer_views: Vec<serde_json::Value> = views
        .iter()
        .map(|&(offset, length)| json!({ "buffer": 0, "byteOffset": offset, "byteLength": length }))
        .collect();

    json!({
        "asset": { "version": "2.0", "generator": "skelmesh-export tests" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "name": "Armature", "translation": [5.0, 0.0, 0.0], "children": [1, 3] },
            { "name": "Hip", "translation": [0.0, 1.0, 0.0], "children": [2] },
            { "name": "Knee", "translation": [0.0, 1.0, 0.0] },
            { "name": "Leg", "mesh": 0, "skin": 0 }
        ],
        "meshes": [{
            "name": "LegMesh",
            "primitives": [{
                "attributes": {
                    "POSITION": 0,
                    "NORMAL": 1,
                    "TEXCOORD_0": 2,
                    "JOINTS_0": 3,
                    "WEIGHTS_0": 4
                },
                "indices": 5
            }]
        }],
        "skins": [{ "joints": [1, 2], "inverseBindMatrices": 6 }],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 4, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 2.0, 0.0] },
            { "bufferView": 1, "componentType": 5126, "count": 4, "type": "VEC3" },
            { "bufferView": 2, "componentType": 5126, "count": 4, "type": "VEC2" },
            { "bufferView": 3, "componentType": 5121, "count": 4, "type": "VEC4" },
            { "bufferView": 4, "componentType": 5126, "count": 4, "type": "VEC4" },
            { "bufferView": 5, "componentType": 5125, "count": 6, "type": "SCALAR" },
            { "bufferView": 6, "componentType": 5126, "count": 2, "type": "MAT4" }
        ],
        "bufferViews": buffer_views,
        "buffers": [{ "byteLength": buffer_len }]
    })
}

/// Assemble a GLB container from JSON and a binary chunk
pub fn assemble_glb(json: &serde_json::Value, buffer_data: &[u8]) -> Vec<u8> {
    let json_bytes = serde_json::to_vec(json).expect("Failed to serialize JSON");

    let json_padding = (4 - (json_bytes.len() % 4)) % 4;
    let json_chunk_length = json_bytes.len() + json_padding;
    let buffer_padding = (4 - (buffer_data.len() % 4)) % 4;
    let buffer_chunk_length = buffer_data.len() + buffer_padding;
    let total_length = 12 + 8 + json_chunk_length + 8 + buffer_chunk_length;

    let mut glb = Vec::with_capacity(total_length);

    // Header
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total_length as u32).to_le_bytes());

    // JSON chunk
    glb.extend_from_slice(&(json_chunk_length as u32).to_le_bytes());
    glb.extend_from_slice(&0x4E4F534Au32.to_le_bytes());
    glb.extend_from_slice(&json_bytes);
    glb.extend(std::iter::repeat_n(0x20u8, json_padding));

    // BIN chunk
    glb.extend_from_slice(&(buffer_chunk_length as u32).to_le_bytes());
    glb.extend_from_slice(&0x004E4942u32.to_le_bytes());
    glb.extend_from_slice(buffer_data);
    glb.extend(std::iter::repeat_n(0u8, buffer_padding));

    glb
}

pub fn skinned_quad_glb() -> Vec<u8> {
    let (buffer, views) = quad_buffer();
    assemble_glb(&quad_json(buffer.len(), &views), &buffer)
}

pub fn write_skinned_quad(path: &Path) {
    std::fs::write(path, skinned_quad_glb()).expect("Failed to write GLB");
}
