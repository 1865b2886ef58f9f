/// Scene graph produced by the parsers
use nalgebra::Matrix4;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::format::ModelFormat;
use crate::geometry::{Aabb, Mesh};
use crate::material::{Material, Preset};
use crate::transform::ModelTransform;

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one parse result; survives material swaps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryId(u64);

impl GeometryId {
    fn next() -> Self {
        Self(NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A drawable triangle surface with its shading
#[derive(Debug, Clone)]
pub struct Surface {
    pub name: Option<String>,
    pub mesh: Arc<Mesh>,
    pub material: Material,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Surface {
    pub fn new(mesh: Mesh) -> Self {
        Self {
            name: None,
            mesh: Arc::new(mesh),
            material: Material::default(),
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }
}

/// A node in the scene hierarchy
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: Option<String>,
    pub local: Matrix4<f32>,
    pub surfaces: Vec<Surface>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new() -> Self {
        Self {
            name: None,
            local: Matrix4::identity(),
            surfaces: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_surface(surface: Surface) -> Self {
        Self {
            surfaces: vec![surface],
            ..Self::new()
        }
    }

    fn visit<'a>(&'a self, parent: &Matrix4<f32>, f: &mut impl FnMut(&Matrix4<f32>, &'a Surface)) {
        let world = parent * self.local;
        for surface in &self.surfaces {
            f(&world, surface);
        }
        for child in &self.children {
            child.visit(&world, f);
        }
    }

    fn visit_mut(&mut self, f: &mut impl FnMut(&mut Surface)) {
        for surface in &mut self.surfaces {
            f(surface);
        }
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }
}

impl Default for SceneNode {
    fn default() -> Self {
        Self::new()
    }
}

/// The renderable graph derived from one parsed asset
#[derive(Debug, Clone)]
pub struct SceneRoot {
    id: GeometryId,
    pub format: ModelFormat,
    pub nodes: Vec<SceneNode>,
    /// Normalization applied on top of the node transforms
    pub transform: ModelTransform,
}

impl SceneRoot {
    pub fn new(format: ModelFormat, nodes: Vec<SceneNode>) -> Self {
        Self {
            id: GeometryId::next(),
            format,
            nodes,
            transform: ModelTransform::identity(),
        }
    }

    /// A scene holding one surface, as produced for STL files
    pub fn single(format: ModelFormat, surface: Surface) -> Self {
        Self::new(format, vec![SceneNode::with_surface(surface)])
    }

    pub fn id(&self) -> GeometryId {
        self.id
    }

    /// Visit every surface with its world matrix, excluding normalization
    pub fn for_each_surface<'a>(&'a self, mut f: impl FnMut(&Matrix4<f32>, &'a Surface)) {
        let identity = Matrix4::identity();
        for node in &self.nodes {
            node.visit(&identity, &mut f);
        }
    }

    pub fn for_each_surface_mut(&mut self, mut f: impl FnMut(&mut Surface)) {
        for node in &mut self.nodes {
            node.visit_mut(&mut f);
        }
    }

    /// Surfaces paired with their full model matrix, normalization included
    pub fn drawables(&self) -> Vec<(Matrix4<f32>, &Surface)> {
        let normalization = self.transform.matrix();
        let mut out = Vec::new();
        self.for_each_surface(|world, surface| out.push((normalization * world, surface)));
        out
    }

    pub fn surface_count(&self) -> usize {
        let mut count = 0;
        self.for_each_surface(|_, _| count += 1);
        count
    }

    pub fn triangle_count(&self) -> usize {
        let mut count = 0;
        self.for_each_surface(|_, surface| count += surface.mesh.triangles.len());
        count
    }

    /// Bounds of the parsed geometry before normalization
    pub fn local_bounds(&self) -> Aabb {
        let mut bounds = Aabb::empty();
        self.for_each_surface(|world, surface| {
            bounds = bounds.union(&surface.mesh.bounds().transformed(world));
        });
        bounds
    }

    /// Bounds after normalization, as seen by the camera
    pub fn bounds(&self) -> Aabb {
        self.local_bounds().transformed(&self.transform.matrix())
    }

    /// Replace every surface's material with `preset`, enabling shadows
    pub fn apply_preset(&mut self, preset: &Preset) {
        let material = preset.material();
        self.for_each_surface_mut(|surface| {
            surface.material = material.clone();
            surface.cast_shadow = true;
            surface.receive_shadow = true;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{apply_preset, find_preset};
    use nalgebra::{Point3, Vector3};

    fn two_level_scene() -> SceneRoot {
        let mut parent = SceneNode::with_surface(Surface::new(Mesh::cube(1.0)).named("base"));
        parent.local = Matrix4::new_translation(&Vector3::new(10.0, 0.0, 0.0));

        let mut child = SceneNode::with_surface(Surface::new(Mesh::cube(1.0)).named("top"));
        child.local = Matrix4::new_translation(&Vector3::new(0.0, 2.0, 0.0));
        parent.children.push(child);

        SceneRoot::new(ModelFormat::Gltf, vec![parent])
    }

    #[test]
    fn test_world_bounds_follow_hierarchy() {
        let scene = two_level_scene();
        assert_eq!(scene.surface_count(), 2);
        assert_eq!(scene.triangle_count(), 24);

        let bounds = scene.local_bounds();
        assert_eq!(bounds.min, Point3::new(9.5, -0.5, -0.5));
        assert_eq!(bounds.max, Point3::new(10.5, 2.5, 0.5));
    }

    #[test]
    fn test_each_parse_gets_new_id() {
        let a = SceneRoot::single(ModelFormat::Stl, Surface::new(Mesh::cube(1.0)));
        let b = SceneRoot::single(ModelFormat::Stl, Surface::new(Mesh::cube(1.0)));
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn test_apply_preset_reaches_every_surface() {
        let mut scene = two_level_scene();
        scene.for_each_surface_mut(|surface| surface.material.texture = Some("albedo".into()));

        let bronze = find_preset("bronze").unwrap();
        let styled = apply_preset(&scene, bronze);

        styled.for_each_surface(|_, surface| {
            assert_eq!(surface.material, bronze.material());
            assert!(surface.cast_shadow && surface.receive_shadow);
        });
        // the input is untouched and geometry is shared
        scene.for_each_surface(|_, surface| assert!(surface.material.texture.is_some()));
        let before: Vec<_> = scene.drawables().iter().map(|(_, s)| s.mesh.clone()).collect();
        let after: Vec<_> = styled.drawables().iter().map(|(_, s)| s.mesh.clone()).collect();
        assert!(before.iter().zip(&after).all(|(a, b)| Arc::ptr_eq(a, b)));
        assert_eq!(scene.id(), styled.id());
    }
}
