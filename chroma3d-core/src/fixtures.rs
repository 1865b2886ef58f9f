//! Model files generated in memory for tests.
//!
//! Shared by the unit tests and, through a `#[path]` include, by the
//! integration tests, so it only depends on std and dev-dependencies.

#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Positions of a unit right triangle followed by u16 indices and padding
fn triangle_buffer() -> Vec<u8> {
    let mut bin = Vec::new();
    for c in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
        bin.extend_from_slice(&c.to_le_bytes());
    }
    for i in [0u16, 1, 2] {
        bin.extend_from_slice(&i.to_le_bytes());
    }
    bin.extend_from_slice(&[0, 0]);
    bin
}

fn data_uri(bin: &[u8]) -> String {
    format!("data:application/octet-stream;base64,{}", STANDARD.encode(bin))
}

/// Two nodes, each with its own mesh; the first one is textured
pub fn two_mesh_gltf_json(buffer_uri: Option<&str>) -> String {
    format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "nodes": [0, 1] }}],
  "nodes": [
    {{ "name": "left", "mesh": 0 }},
    {{ "name": "right", "mesh": 1, "translation": [3.0, 0.0, 0.0] }}
  ],
  "meshes": [
    {{ "name": "left", "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "material": 0 }}] }},
    {{ "name": "right", "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "indices": 1 }}] }}
  ],
  "materials": [
    {{ "pbrMetallicRoughness": {{ "baseColorFactor": [1.0, 0.0, 0.0, 1.0], "baseColorTexture": {{ "index": 0 }} }} }}
  ],
  "textures": [{{ "source": 0 }}],
  "images": [{{ "uri": "albedo.png" }}],
  "buffers": [{{ {} "byteLength": 44 }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 6 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }},
    {{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }}
  ]
}}"#,
        buffer_uri.unwrap_or("")
    )
}

pub fn two_mesh_gltf_data_uri() -> String {
    let uri = format!("\"uri\": \"{}\",", data_uri(&triangle_buffer()));
    two_mesh_gltf_json(Some(&uri))
}

pub fn two_mesh_glb() -> Vec<u8> {
    glb(&two_mesh_gltf_json(None), &triangle_buffer())
}

/// `.gltf` text with one triangle mesh (index 0) and the given node list.
///
/// `nodes` and `roots` are JSON arrays, so tests can build arbitrary
/// hierarchies, including malformed ones.
pub fn triangle_gltf(nodes: &str, roots: &str) -> String {
    format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "nodes": {roots} }}],
  "nodes": {nodes},
  "meshes": [{{ "primitives": [{{ "attributes": {{ "POSITION": 0 }} }}] }}],
  "buffers": [{{ "uri": "{uri}", "byteLength": 44 }}],
  "bufferViews": [{{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }}],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }}
  ]
}}"#,
        uri = data_uri(&triangle_buffer()),
    )
}

/// GLB with `count` nodes side by side, each with its own textured mesh
pub fn multi_mesh_glb(count: usize) -> Vec<u8> {
    let nodes: Vec<String> = (0..count)
        .map(|i| format!(r#"{{ "name": "part{i}", "mesh": {i}, "translation": [{}.0, 0.0, 0.0] }}"#, i * 2))
        .collect();
    let meshes: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{ "name": "part{i}", "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "material": 0 }}] }}"#
            )
        })
        .collect();
    let roots: Vec<String> = (0..count).map(|i| i.to_string()).collect();

    let json = format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "nodes": [{}] }}],
  "nodes": [{}],
  "meshes": [{}],
  "materials": [{{ "pbrMetallicRoughness": {{ "baseColorTexture": {{ "index": 0 }} }} }}],
  "textures": [{{ "name": "albedo", "source": 0 }}],
  "images": [{{ "uri": "albedo.png" }}],
  "buffers": [{{ "byteLength": 44 }}],
  "bufferViews": [{{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }}],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }}
  ]
}}"#,
        roots.join(", "),
        nodes.join(", "),
        meshes.join(", ")
    );

    glb(&json, &triangle_buffer())
}

/// Wrap a JSON document and binary chunk into a GLB container
pub fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json = json.as_bytes().to_vec();
    json.resize(json.len().next_multiple_of(4), b' ');
    let mut bin = bin.to_vec();
    bin.resize(bin.len().next_multiple_of(4), 0);

    let total = 12 + 8 + json.len() + 8 + bin.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(b"JSON");
    out.extend_from_slice(&json);
    out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    out.extend_from_slice(b"BIN\0");
    out.extend_from_slice(&bin);
    out
}

/// Binary STL holding a single box spanning `min..max`
pub fn box_stl(min: [f32; 3], max: [f32; 3]) -> Vec<u8> {
    let p = |x: usize, y: usize, z: usize| {
        [
            if x == 0 { min[0] } else { max[0] },
            if y == 0 { min[1] } else { max[1] },
            if z == 0 { min[2] } else { max[2] },
        ]
    };
    let quads = [
        [p(0, 0, 0), p(0, 1, 0), p(1, 1, 0), p(1, 0, 0)],
        [p(0, 0, 1), p(1, 0, 1), p(1, 1, 1), p(0, 1, 1)],
        [p(0, 0, 0), p(0, 0, 1), p(0, 1, 1), p(0, 1, 0)],
        [p(1, 0, 0), p(1, 1, 0), p(1, 1, 1), p(1, 0, 1)],
        [p(0, 0, 0), p(1, 0, 0), p(1, 0, 1), p(0, 0, 1)],
        [p(0, 1, 0), p(0, 1, 1), p(1, 1, 1), p(1, 1, 0)],
    ];

    let mut data = vec![0u8; 80];
    data.extend_from_slice(&12u32.to_le_bytes());
    for [a, b, c, d] in quads {
        for triangle in [[a, b, c], [a, c, d]] {
            // zero normal, left for the parser to compute
            data.extend_from_slice(&[0u8; 12]);
            for vertex in triangle {
                for value in vertex {
                    data.extend_from_slice(&value.to_le_bytes());
                }
            }
            data.extend_from_slice(&[0u8; 2]);
        }
    }
    data
}
