/// Wavefront OBJ loading via tobj
use std::io::{BufReader, Cursor};

use crate::error::LoadError;
use crate::geometry::{Mesh, Triangle, Vertex};
use crate::scene::{SceneNode, Surface};

/// Parse OBJ text into one node per object.
///
/// `mtllib` statements are ignored; the previewer replaces materials anyway.
pub fn parse_obj(data: &[u8]) -> Result<Vec<SceneNode>, LoadError> {
    let mut reader = BufReader::new(Cursor::new(data));
    let (models, _materials) = tobj::load_obj_buf(
        &mut reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |path| {
            log::debug!("skipping material library {}", path.display());
            Err(tobj::LoadError::OpenFileFailed)
        },
    )?;

    let mut nodes = Vec::with_capacity(models.len());
    for model in models {
        let mesh = convert_mesh(&model.mesh);
        if mesh.is_empty() {
            log::debug!("OBJ object {:?} has no faces", model.name);
            continue;
        }
        let mut node = SceneNode::with_surface(Surface::new(mesh).named(model.name.clone()));
        node.name = Some(model.name);
        nodes.push(node);
    }

    if nodes.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok(nodes)
}

fn convert_mesh(mesh: &tobj::Mesh) -> Mesh {
    let position = |i: usize| {
        [
            mesh.positions[i * 3],
            mesh.positions[i * 3 + 1],
            mesh.positions[i * 3 + 2],
        ]
    };
    let normal = |i: usize| {
        if mesh.normals.len() >= (i + 1) * 3 {
            [
                mesh.normals[i * 3],
                mesh.normals[i * 3 + 1],
                mesh.normals[i * 3 + 2],
            ]
        } else {
            [0.0; 3]
        }
    };

    let mut out = Mesh::with_capacity(mesh.indices.len() / 3);
    for face in mesh.indices.chunks_exact(3) {
        let vertex = |index: u32| {
            let i = index as usize;
            let [x, y, z] = position(i);
            let [nx, ny, nz] = normal(i);
            Vertex::new(x, y, z, nx, ny, nz)
        };
        let mut triangle = Triangle::new(vertex(face[0]), vertex(face[1]), vertex(face[2]));
        triangle.fill_missing_normals();
        out.add_triangle(triangle);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_OBJECTS: &str = "mtllib parts.mtl
o base
v 0 0 0
v 2 0 0
v 2 0 2
v 0 0 2
f 1 2 3 4
o pin
v 1 0 1
v 1 3 1
v 1.5 0 1
usemtl steel
f 5 6 7
";

    #[test]
    fn test_objects_become_nodes() {
        let nodes = parse_obj(TWO_OBJECTS.as_bytes()).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].name.as_deref(), Some("base"));
        // the quad is triangulated
        assert_eq!(nodes[0].surfaces[0].mesh.triangles.len(), 2);
        assert_eq!(nodes[1].surfaces[0].mesh.triangles.len(), 1);
        assert_eq!(nodes[1].surfaces[0].mesh.bounds().max.y, 3.0);
    }

    #[test]
    fn test_missing_normals_are_computed() {
        let nodes = parse_obj(TWO_OBJECTS.as_bytes()).unwrap();
        let triangle = &nodes[0].surfaces[0].mesh.triangles[0];
        assert!((triangle.vertices[0].normal.norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_no_faces_is_empty() {
        let result = parse_obj(b"v 0 0 0\nv 1 0 0\n");
        assert!(matches!(result, Err(LoadError::Empty)));
    }
}
