/// glTF 2.0 / GLB loading via the gltf crate
use gltf::mesh::Mode;
use nalgebra::Matrix4;

use crate::error::LoadError;
use crate::geometry::{Mesh, Triangle, Vertex};
use crate::material::{Color, Material};
use crate::scene::{SceneNode, Surface};

/// Required extensions that only affect shading; safe to ignore
const IGNORABLE_EXTENSION_PREFIXES: &[&str] = &["KHR_materials_", "KHR_texture_", "EXT_texture_"];

/// Deepest node chain followed from a scene root
const MAX_NODE_DEPTH: usize = 128;

/// Node instances a document may expand to once shared children are copied
const MAX_NODE_INSTANCES: usize = 65_536;

/// Parse a `.gltf` (JSON) or `.glb` (binary) document into a node hierarchy.
///
/// Buffers must be embedded (GLB blob or `data:` URI); a single local file
/// cannot reach sibling `.bin` files. Images are never decoded.
pub fn parse_gltf(data: &[u8]) -> Result<Vec<SceneNode>, LoadError> {
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(data)?;

    for extension in &document.as_json().extensions_required {
        if !IGNORABLE_EXTENSION_PREFIXES
            .iter()
            .any(|prefix| extension.starts_with(prefix))
        {
            return Err(LoadError::UnsupportedExtension(extension.clone()));
        }
    }

    let buffers = gltf::import_buffers(&document, None, blob)?;

    let nodes: Vec<SceneNode> =
        match document.default_scene().or_else(|| document.scenes().next()) {
            Some(scene) => {
                let mut walker = NodeWalker::new(&buffers);
                scene
                    .nodes()
                    .map(|node| walker.convert(&node))
                    .collect::<Result<_, _>>()?
            }
            None => {
                log::debug!("glTF has no scene, placing every mesh at the origin");
                document
                    .meshes()
                    .map(|mesh| SceneNode {
                        name: mesh.name().map(str::to_string),
                        surfaces: convert_mesh(&mesh, &buffers),
                        ..SceneNode::new()
                    })
                    .collect()
            }
        };

    let mut triangles = 0;
    for node in &nodes {
        count_triangles(node, &mut triangles);
    }
    if triangles == 0 {
        return Err(LoadError::Empty);
    }
    Ok(nodes)
}

fn count_triangles(node: &SceneNode, total: &mut usize) {
    *total += node
        .surfaces
        .iter()
        .map(|s| s.mesh.triangles.len())
        .sum::<usize>();
    for child in &node.children {
        count_triangles(child, total);
    }
}

/// Converts the node hierarchy, refusing cycles and runaway expansion.
///
/// The document format stores children as indices, so a malformed file can
/// list a node under itself or share one subtree under many parents.
struct NodeWalker<'a> {
    buffers: &'a [gltf::buffer::Data],
    ancestors: Vec<usize>,
    instances: usize,
}

impl<'a> NodeWalker<'a> {
    fn new(buffers: &'a [gltf::buffer::Data]) -> Self {
        Self {
            buffers,
            ancestors: Vec::new(),
            instances: 0,
        }
    }

    fn convert(&mut self, node: &gltf::Node) -> Result<SceneNode, LoadError> {
        let index = node.index();
        if self.ancestors.contains(&index) {
            return Err(LoadError::NodeCycle(index));
        }
        if self.ancestors.len() >= MAX_NODE_DEPTH {
            return Err(LoadError::Hierarchy(format!(
                "nodes are nested more than {} levels deep",
                MAX_NODE_DEPTH
            )));
        }
        self.instances += 1;
        if self.instances > MAX_NODE_INSTANCES {
            return Err(LoadError::Hierarchy(format!(
                "scene expands to more than {} nodes",
                MAX_NODE_INSTANCES
            )));
        }

        self.ancestors.push(index);
        let children = node
            .children()
            .map(|child| self.convert(&child))
            .collect::<Result<Vec<_>, _>>();
        self.ancestors.pop();

        Ok(SceneNode {
            name: node.name().map(str::to_string),
            local: Matrix4::from(node.transform().matrix()),
            surfaces: node
                .mesh()
                .map(|mesh| convert_mesh(&mesh, self.buffers))
                .unwrap_or_default(),
            children: children?,
        })
    }
}

fn convert_mesh(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> Vec<Surface> {
    let mut surfaces = Vec::new();

    for primitive in mesh.primitives() {
        if primitive.mode() != Mode::Triangles {
            log::debug!(
                "skipping {:?} primitive in mesh {:?}",
                primitive.mode(),
                mesh.name()
            );
            continue;
        }

        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

        let Some(positions) = reader.read_positions() else {
            log::debug!("primitive without positions in mesh {:?}", mesh.name());
            continue;
        };
        let positions: Vec<[f32; 3]> = positions.collect();
        let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|iter| iter.collect());
        let indices: Vec<u32> = match reader.read_indices() {
            Some(iter) => iter.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };

        let vertex = |index: u32| -> Option<Vertex> {
            let i = index as usize;
            let [x, y, z] = *positions.get(i)?;
            let [nx, ny, nz] = normals
                .as_ref()
                .and_then(|n| n.get(i).copied())
                .unwrap_or([0.0; 3]);
            Some(Vertex::new(x, y, z, nx, ny, nz))
        };

        let mut out = Mesh::with_capacity(indices.len() / 3);
        for face in indices.chunks_exact(3) {
            match (vertex(face[0]), vertex(face[1]), vertex(face[2])) {
                (Some(a), Some(b), Some(c)) => {
                    let mut triangle = Triangle::new(a, b, c);
                    triangle.fill_missing_normals();
                    out.add_triangle(triangle);
                }
                _ => log::debug!("dropping face with out-of-range index {:?}", face),
            }
        }

        if out.is_empty() {
            continue;
        }

        let mut surface = Surface::new(out).with_material(convert_material(&primitive.material()));
        surface.name = mesh.name().map(str::to_string);
        surfaces.push(surface);
    }

    surfaces
}

fn convert_material(material: &gltf::Material) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, _] = pbr.base_color_factor();
    let mut out = Material::new(
        Color::from_linear([r, g, b]),
        pbr.metallic_factor(),
        pbr.roughness_factor(),
    );
    out.texture = pbr.base_color_texture().map(|info| {
        let texture = info.texture();
        texture
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("texture{}", texture.index()))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_glb_nodes_keep_transforms_and_textures() {
        let nodes = parse_gltf(&fixtures::two_mesh_glb()).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].name.as_deref(), Some("left"));
        assert_eq!(nodes[1].local[(0, 3)], 3.0);

        let left = &nodes[0].surfaces[0];
        assert_eq!(left.mesh.triangles.len(), 1);
        assert_eq!(left.material.base_color, Color::rgb(255, 0, 0));
        assert_eq!(left.material.texture.as_deref(), Some("texture0"));

        let right = &nodes[1].surfaces[0];
        assert_eq!(right.mesh.triangles.len(), 1);
        assert!(right.material.texture.is_none());
        // normals are absent in the file and get computed
        assert!((right.mesh.triangles[0].vertices[0].normal.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_gltf_with_embedded_buffer() {
        let nodes = parse_gltf(fixtures::two_mesh_gltf_data_uri().as_bytes()).unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_external_buffer_cannot_be_resolved() {
        let json = fixtures::two_mesh_gltf_json(Some("\"uri\": \"model.bin\","));
        assert!(matches!(parse_gltf(json.as_bytes()), Err(LoadError::Gltf(_))));
    }

    #[test]
    fn test_required_compression_extension_is_rejected() {
        let json = fixtures::two_mesh_gltf_data_uri().replacen(
            "\"asset\"",
            "\"extensionsUsed\": [\"KHR_draco_mesh_compression\"], \
             \"extensionsRequired\": [\"KHR_draco_mesh_compression\"], \"asset\"",
            1,
        );
        assert!(matches!(
            parse_gltf(json.as_bytes()),
            Err(LoadError::UnsupportedExtension(_)) | Err(LoadError::Gltf(_))
        ));
    }

    #[test]
    fn test_self_parented_node_is_an_error() {
        let json = fixtures::triangle_gltf(r#"[{ "mesh": 0, "children": [0] }]"#, "[0]");
        assert!(matches!(parse_gltf(json.as_bytes()), Err(LoadError::NodeCycle(0))));
    }

    #[test]
    fn test_cycle_through_ancestor_is_an_error() {
        let nodes = r#"[
            { "name": "root", "children": [1] },
            { "name": "arm", "mesh": 0, "children": [2] },
            { "name": "hand", "children": [0] }
        ]"#;
        let json = fixtures::triangle_gltf(nodes, "[0]");
        assert!(matches!(parse_gltf(json.as_bytes()), Err(LoadError::NodeCycle(0))));
    }

    #[test]
    fn test_shared_child_is_instanced_under_each_parent() {
        let nodes = r#"[
            { "children": [2] },
            { "children": [2], "translation": [2.0, 0.0, 0.0] },
            { "mesh": 0 }
        ]"#;
        let json = fixtures::triangle_gltf(nodes, "[0, 1]");
        let roots = parse_gltf(json.as_bytes()).unwrap();
        assert_eq!(roots.len(), 2);
        assert!(roots.iter().all(|root| root.children.len() == 1));
    }

    #[test]
    fn test_deep_chain_is_refused() {
        let nodes: Vec<String> = (0..=MAX_NODE_DEPTH)
            .map(|i| {
                if i == MAX_NODE_DEPTH {
                    r#"{ "mesh": 0 }"#.to_string()
                } else {
                    format!(r#"{{ "children": [{}] }}"#, i + 1)
                }
            })
            .collect();
        let json = fixtures::triangle_gltf(&format!("[{}]", nodes.join(", ")), "[0]");
        assert!(matches!(parse_gltf(json.as_bytes()), Err(LoadError::Hierarchy(_))));
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(parse_gltf(b"glTF\x02\x00\x00\x00garbage").is_err());
        assert!(parse_gltf(b"{ not json").is_err());
    }
}
