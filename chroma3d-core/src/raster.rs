/// Software rasterizer shared by the terminal and browser front ends
use nalgebra::{Matrix4, Point3, Vector3};

use crate::geometry::{face_normal, Aabb};
use crate::guides::{draw_gizmo, draw_grid, Guides};
use crate::lighting::LightRig;
use crate::material::{Color, Material};
use crate::projection::{project_with, Camera};
use crate::scene::SceneRoot;

/// RGBA8 color target with a depth buffer
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    color: Vec<u8>,
    depth: Vec<f32>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            color: vec![0; size * 4],
            depth: vec![f32::INFINITY; size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if (width, height) != (self.width, self.height) {
            *self = Self::new(width, height);
        }
    }

    pub fn clear(&mut self, background: Color) {
        for pixel in self.color.chunks_exact_mut(4) {
            pixel.copy_from_slice(&[background.r, background.g, background.b, 0xff]);
        }
        self.depth.fill(f32::INFINITY);
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.width + x) * 4;
        [
            self.color[i],
            self.color[i + 1],
            self.color[i + 2],
            self.color[i + 3],
        ]
    }

    /// Whether geometry was drawn at this pixel
    pub fn is_covered(&self, x: usize, y: usize) -> bool {
        self.depth[y * self.width + x].is_finite()
    }

    /// Mix `color` over the pixel at `x, y`; false when off screen
    pub(crate) fn blend(&mut self, x: i64, y: i64, color: Color, alpha: f32) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        let i = (y as usize * self.width + x as usize) * 4;
        let alpha = alpha.clamp(0.0, 1.0);
        for (channel, value) in self.color[i..i + 3].iter_mut().zip([color.r, color.g, color.b]) {
            *channel = (*channel as f32 * (1.0 - alpha) + value as f32 * alpha).round() as u8;
        }
        true
    }

    /// Row-major RGBA bytes, ready for a canvas `ImageData`
    pub fn as_rgba(&self) -> &[u8] {
        &self.color
    }
}

/// Counters from one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub triangles_drawn: usize,
    pub pixels_shaded: usize,
    pub shadow_pixels: usize,
    /// Grid and gizmo pixels
    pub guide_pixels: usize,
}

/// Draw `scene` (or just the background and guides when empty) into `target`.
///
/// The grid lies on the ground plane under the model, or at the origin
/// when nothing is loaded; the gizmo is drawn last, over the model.
pub fn render_scene(
    target: &mut Framebuffer,
    scene: Option<&SceneRoot>,
    camera: &Camera,
    lights: &LightRig,
    guides: &Guides,
) -> RenderStats {
    let mut stats = RenderStats::default();
    target.clear(lights.background);
    if target.width == 0 || target.height == 0 {
        return stats;
    }

    let ground = scene
        .map(SceneRoot::bounds)
        .filter(Aabb::is_finite)
        .map_or(0.0, |bounds| bounds.min.y);
    stats.guide_pixels += draw_grid(target, camera, ground, &guides.grid);

    if let Some(scene) = scene {
        draw_model(target, scene, camera, lights, &mut stats);
    }

    stats.guide_pixels += draw_gizmo(target, camera, &guides.gizmo);
    stats
}

fn draw_model(
    target: &mut Framebuffer,
    scene: &SceneRoot,
    camera: &Camera,
    lights: &LightRig,
    stats: &mut RenderStats,
) {
    let view_projection = camera.view_projection();
    let drawables = scene.drawables();

    if lights.contact_shadow.enabled {
        stats.shadow_pixels = draw_contact_shadow(target, scene, &drawables, &view_projection, lights);
    }

    let (width, height) = (target.width, target.height);
    for (model, surface) in &drawables {
        for triangle in &surface.mesh.triangles {
            let world = triangle
                .vertices
                .map(|vertex| model.transform_point(&vertex.position));

            let mut normal = face_normal(&world[0], &world[1], &world[2]);
            if normal == Vector3::zeros() {
                continue;
            }

            let mut screen = [(0.0, 0.0, 0.0); 3];
            let mut visible = true;
            for (slot, point) in screen.iter_mut().zip(&world) {
                match project_with(&view_projection, point, width as f32, height as f32) {
                    Some(projected) => *slot = projected,
                    None => visible = false,
                }
            }
            if !visible {
                continue;
            }

            let centroid = Point3::from((world[0].coords + world[1].coords + world[2].coords) / 3.0);
            let view = (camera.position - centroid)
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(Vector3::z);
            // STL winding is unreliable, so light both sides
            if normal.dot(&view) < 0.0 {
                normal = -normal;
            }

            let shaded = Color::from_linear(shade(&surface.material, &normal, &view, lights));
            let rgba = [shaded.r, shaded.g, shaded.b, 0xff];

            let color = &mut target.color;
            let depth = &mut target.depth;
            let mut drawn = false;
            for_each_pixel(&screen, width, height, |idx, z| {
                if (-1.0..=1.0).contains(&z) && z < depth[idx] {
                    depth[idx] = z;
                    color[idx * 4..idx * 4 + 4].copy_from_slice(&rgba);
                    stats.pixels_shaded += 1;
                    drawn = true;
                }
            });
            if drawn {
                stats.triangles_drawn += 1;
            }
        }
    }
}

/// Approximate metal/roughness shading in linear light
fn shade(material: &Material, normal: &Vector3<f32>, view: &Vector3<f32>, lights: &LightRig) -> [f32; 3] {
    let base = material.base_color.to_linear();
    let metal = material.metalness;
    let rough = material.roughness.clamp(0.05, 1.0);

    let key = &lights.directional;
    let to_light = key.direction();
    let key_color = key.color.to_linear();
    let ambient = lights.ambient_color.to_linear();

    let n_dot_l = normal.dot(&to_light).max(0.0);
    let half = (to_light + view).try_normalize(f32::EPSILON).unwrap_or(*normal);
    let shininess = (2.0 / rough.powi(4) - 2.0).clamp(1.0, 512.0);
    let highlight = if n_dot_l > 0.0 {
        normal.dot(&half).max(0.0).powf(shininess) * (1.0 - rough * 0.7)
    } else {
        0.0
    };
    // stand-in for the studio environment reflections
    let environment = (0.5 - rough * 0.25) * (0.6 + 0.4 * normal.y.max(0.0));

    let mut out = [0.0; 3];
    for c in 0..3 {
        let f0 = 0.04 + (base[c] - 0.04) * metal;
        let diffuse = base[c] * (1.0 - metal);
        let direct = key_color[c] * key.intensity * n_dot_l;
        out[c] = diffuse * (ambient[c] * lights.ambient_intensity + direct)
            + f0 * (environment + highlight * key_color[c] * key.intensity);
    }
    out
}

/// Darken the ground plane under shadow-casting surfaces
fn draw_contact_shadow(
    target: &mut Framebuffer,
    scene: &SceneRoot,
    drawables: &[(Matrix4<f32>, &crate::scene::Surface)],
    view_projection: &Matrix4<f32>,
    lights: &LightRig,
) -> usize {
    let shadow = &lights.contact_shadow;
    let bounds = scene.bounds();
    if !bounds.is_finite() {
        return 0;
    }
    let ground = bounds.min.y;
    let half = shadow.scale / 2.0;
    let (width, height) = (target.width, target.height);
    let mut coverage = vec![0.0f32; width * height];

    for (model, surface) in drawables {
        if !surface.cast_shadow {
            continue;
        }
        for triangle in &surface.mesh.triangles {
            let world = triangle
                .vertices
                .map(|vertex| model.transform_point(&vertex.position));
            if world.iter().all(|p| p.y - ground > shadow.far) {
                continue;
            }
            if world.iter().any(|p| p.x.abs() > half || p.z.abs() > half) {
                continue;
            }

            let mut screen = [(0.0, 0.0, 0.0); 3];
            let mut visible = true;
            for (slot, point) in screen.iter_mut().zip(&world) {
                let flat = Point3::new(point.x, ground, point.z);
                match project_with(view_projection, &flat, width as f32, height as f32) {
                    Some(projected) => *slot = projected,
                    None => visible = false,
                }
            }
            if visible {
                for_each_pixel(&screen, width, height, |idx, _| coverage[idx] = 1.0);
            }
        }
    }

    let radius = shadow.blur.max(0.0).round() as usize;
    if radius > 0 {
        box_blur(&mut coverage, width, height, radius);
    }

    let mut shaded = 0;
    for (idx, alpha) in coverage.into_iter().enumerate() {
        if alpha <= 0.0 {
            continue;
        }
        let keep = 1.0 - shadow.opacity.clamp(0.0, 1.0) * alpha;
        for channel in &mut target.color[idx * 4..idx * 4 + 3] {
            *channel = (*channel as f32 * keep).round() as u8;
        }
        shaded += 1;
    }
    shaded
}

/// Separable box blur over a single-channel image
fn box_blur(values: &mut [f32], width: usize, height: usize, radius: usize) {
    let mut scratch = vec![0.0f32; values.len()];
    let window = (radius * 2 + 1) as f32;

    for y in 0..height {
        for x in 0..width {
            let lo = x.saturating_sub(radius);
            let hi = (x + radius).min(width - 1);
            let sum: f32 = values[y * width + lo..=y * width + hi].iter().sum();
            scratch[y * width + x] = sum / window;
        }
    }
    for y in 0..height {
        for x in 0..width {
            let lo = y.saturating_sub(radius);
            let hi = (y + radius).min(height - 1);
            let sum: f32 = (lo..=hi).map(|row| scratch[row * width + x]).sum();
            values[y * width + x] = sum / window;
        }
    }
}

/// Visit pixels whose centers fall inside a screen-space triangle
fn for_each_pixel(
    coords: &[(f32, f32, f32); 3],
    width: usize,
    height: usize,
    mut plot: impl FnMut(usize, f32),
) {
    let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

    // Bounding box
    let min_x = v0.0.min(v1.0).min(v2.0).floor() as i64;
    let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i64;
    let min_y = v0.1.min(v1.1).min(v2.1).floor() as i64;
    let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i64;

    // Clip to screen bounds
    let min_x = min_x.max(0);
    let max_x = max_x.min(width as i64 - 1);
    let min_y = min_y.max(0);
    let max_y = max_y.min(height as i64 - 1);

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;

            if let Some((w0, w1, w2)) = barycentric(
                (v0.0, v0.1),
                (v1.0, v1.1),
                (v2.0, v2.1),
                (px, py),
            ) {
                if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                    let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                    plot(y as usize * width + x as usize, depth);
                }
            }
        }
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ModelFormat;
    use crate::framing::fit_camera;
    use crate::geometry::Mesh;
    use crate::material::find_preset;
    use crate::scene::Surface;

    fn framed_cube(preset: &str) -> (SceneRoot, Camera) {
        let mut scene = SceneRoot::single(ModelFormat::Stl, Surface::new(Mesh::cube(1.0)));
        scene.apply_preset(find_preset(preset).unwrap());
        let mut camera = Camera::new(90, 160);
        fit_camera(&mut camera, &scene.bounds(), 1.2);
        (scene, camera)
    }

    #[test]
    fn test_empty_viewport_is_background() {
        let mut target = Framebuffer::new(8, 8);
        let lights = LightRig::default();
        let stats = render_scene(&mut target, None, &Camera::default(), &lights, &Guides::hidden());

        assert_eq!(stats, RenderStats::default());
        let bg = lights.background;
        assert_eq!(target.pixel(3, 5), [bg.r, bg.g, bg.b, 0xff]);
        assert!(!target.is_covered(3, 5));
    }

    #[test]
    fn test_framed_model_covers_center_not_corners() {
        let (scene, camera) = framed_cube("chroma-orange");
        let mut target = Framebuffer::new(90, 160);
        let stats = render_scene(&mut target, Some(&scene), &camera, &LightRig::default(), &Guides::hidden());

        assert!(stats.triangles_drawn > 0);
        assert!(target.is_covered(45, 80));
        assert!(!target.is_covered(0, 0));
        assert!(!target.is_covered(89, 159));

        let [r, _, b, _] = target.pixel(45, 80);
        assert!(r > b, "orange should read warmer than blue");
    }

    #[test]
    fn test_presets_change_pixels_not_coverage() {
        let (mut scene, camera) = framed_cube("chroma-orange");
        let lights = LightRig::default();
        let mut orange = Framebuffer::new(90, 160);
        render_scene(&mut orange, Some(&scene), &camera, &lights, &Guides::hidden());

        scene.apply_preset(find_preset("royal-blue").unwrap());
        let mut blue = Framebuffer::new(90, 160);
        render_scene(&mut blue, Some(&scene), &camera, &lights, &Guides::hidden());

        for y in 0..160 {
            for x in 0..90 {
                assert_eq!(orange.is_covered(x, y), blue.is_covered(x, y));
            }
        }
        assert_ne!(orange.pixel(45, 80), blue.pixel(45, 80));
    }

    #[test]
    fn test_contact_shadow_toggle() {
        let (scene, camera) = framed_cube("silver");
        let mut lights = LightRig::default();
        let mut target = Framebuffer::new(90, 160);

        let with_shadow = render_scene(&mut target, Some(&scene), &camera, &lights, &Guides::hidden());
        assert!(with_shadow.shadow_pixels > 0);

        lights.contact_shadow.enabled = false;
        let without = render_scene(&mut target, Some(&scene), &camera, &lights, &Guides::hidden());
        assert_eq!(without.shadow_pixels, 0);
    }

    #[test]
    fn test_guides_show_without_a_model() {
        let mut target = Framebuffer::new(90, 160);
        let lights = LightRig::default();
        let stats = render_scene(&mut target, None, &Camera::new(90, 160), &lights, &Guides::default());

        assert!(stats.guide_pixels > 0);
        assert_eq!(stats.triangles_drawn, 0);
        let bg = [lights.background.r, lights.background.g, lights.background.b, 0xff];
        let lit = (0..160)
            .flat_map(|y| (0..90).map(move |x| (x, y)))
            .filter(|&(x, y)| target.pixel(x, y) != bg)
            .count();
        assert!(lit > 0);
        assert!((0..90).all(|x| (0..160).all(|y| !target.is_covered(x, y))));
    }

    #[test]
    fn test_model_draws_over_the_grid() {
        let (scene, camera) = framed_cube("chroma-orange");
        let mut plain = Framebuffer::new(90, 160);
        let mut guided = Framebuffer::new(90, 160);
        render_scene(&mut plain, Some(&scene), &camera, &LightRig::default(), &Guides::hidden());
        let stats = render_scene(&mut guided, Some(&scene), &camera, &LightRig::default(), &Guides::default());

        assert!(stats.guide_pixels > 0);
        assert_eq!(plain.pixel(45, 80), guided.pixel(45, 80));
    }

    #[test]
    fn test_barycentric_degenerate() {
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.5, 0.5)).is_none());
        let (w0, w1, w2) = barycentric((0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (1.0, 1.0)).unwrap();
        assert!((w0 + w1 + w2 - 1.0).abs() < 1e-6);
        assert!(w0 > 0.0 && w1 > 0.0 && w2 > 0.0);
    }
}
