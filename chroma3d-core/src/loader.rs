/// Format dispatch from accepted file bytes to a scene root
use crate::error::LoadError;
use crate::format::ModelFormat;
use crate::gltf_scene::parse_gltf;
use crate::obj::parse_obj;
use crate::scene::{SceneRoot, Surface};
use crate::stl::parse_stl;

/// Parse `bytes` with the one parser matching `format`
pub fn load_scene(format: ModelFormat, file_name: &str, bytes: &[u8]) -> Result<SceneRoot, LoadError> {
    log::debug!("parsing {} as {} ({} bytes)", file_name, format, bytes.len());

    let scene = match format {
        ModelFormat::Stl => {
            let mesh = parse_stl(bytes)?;
            if mesh.is_empty() {
                return Err(LoadError::Empty);
            }
            SceneRoot::single(format, Surface::new(mesh).named(stem(file_name)))
        }
        ModelFormat::Obj => SceneRoot::new(format, parse_obj(bytes)?),
        ModelFormat::Glb | ModelFormat::Gltf => SceneRoot::new(format, parse_gltf(bytes)?),
    };

    if scene.triangle_count() == 0 {
        return Err(LoadError::Empty);
    }

    log::info!(
        "loaded {}: {} surfaces, {} triangles",
        file_name,
        scene.surface_count(),
        scene.triangle_count()
    );
    Ok(scene)
}

fn stem(file_name: &str) -> &str {
    file_name
        .rsplit_once('.')
        .map_or(file_name, |(stem, _)| stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    const TETRA_OBJ: &str = "\
o tetra
v 0 0 0
v 1 0 0
v 0 1 0
v 0 0 1
f 1 3 2
f 1 2 4
f 1 4 3
f 2 3 4
";

    #[test]
    fn test_stl_yields_single_named_surface() {
        let bytes = fixtures::box_stl([0.0; 3], [2.0, 1.0, 1.0]);
        let scene = load_scene(ModelFormat::Stl, "bracket.stl", &bytes).unwrap();

        assert_eq!(scene.format, ModelFormat::Stl);
        assert_eq!(scene.surface_count(), 1);
        assert_eq!(scene.triangle_count(), 12);
        let mut names = Vec::new();
        scene.for_each_surface(|_, surface| names.push(surface.name.clone()));
        assert_eq!(names, [Some("bracket".to_string())]);
    }

    #[test]
    fn test_obj_dispatch() {
        let scene = load_scene(ModelFormat::Obj, "tetra.obj", TETRA_OBJ.as_bytes()).unwrap();
        assert_eq!(scene.triangle_count(), 4);
    }

    #[test]
    fn test_glb_dispatch() {
        let scene = load_scene(ModelFormat::Glb, "pair.glb", &fixtures::two_mesh_glb()).unwrap();
        assert_eq!(scene.surface_count(), 2);
    }

    #[test]
    fn test_format_mismatch_is_an_error_not_a_panic() {
        let bytes = fixtures::box_stl([0.0; 3], [1.0; 3]);
        assert!(load_scene(ModelFormat::Glb, "box.glb", &bytes).is_err());
        assert!(load_scene(ModelFormat::Stl, "junk.stl", b"not a mesh").is_err());
    }

    #[test]
    fn test_stl_without_triangles_is_empty() {
        let result = load_scene(ModelFormat::Stl, "empty.stl", b"solid empty\nendsolid empty\n");
        assert!(matches!(result, Err(LoadError::Empty)));
    }
}
