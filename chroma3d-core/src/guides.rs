/// Inspection aids drawn with the model: a ground grid and an axis gizmo
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::material::Color;
use crate::projection::{project_with, Camera};
use crate::raster::Framebuffer;

/// Pieces each grid line is split into so lines crossing the near plane
/// still draw their visible part
const GRID_SEGMENTS: usize = 20;

/// Square grid on the ground plane, centered below the model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    pub enabled: bool,
    /// Side length of the grid
    pub size: f32,
    pub cell_size: f32,
    /// Lines on multiples of this use the section color
    pub section_size: f32,
    pub cell_color: Color,
    pub section_color: Color,
    /// Lines this far from the camera have faded out completely
    pub fade_distance: f32,
    pub fade_strength: f32,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            size: 20.0,
            cell_size: 0.5,
            section_size: 1.0,
            cell_color: Color::from_u32(0x333333),
            section_color: Color::from_u32(0x444444),
            fade_distance: 18.0,
            fade_strength: 2.0,
        }
    }
}

/// X/Y/Z triad in the bottom-right corner, turning with the camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisGizmo {
    pub enabled: bool,
    /// X, Y and Z arm colors
    pub colors: [Color; 3],
    /// Arm length as a fraction of the shorter viewport side
    pub size: f32,
}

impl Default for AxisGizmo {
    fn default() -> Self {
        Self {
            enabled: true,
            colors: [
                Color::from_u32(0xff6b6b),
                Color::from_u32(0x4ade80),
                Color::from_u32(0x60a5fa),
            ],
            size: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Guides {
    pub grid: GridOptions,
    pub gizmo: AxisGizmo,
}

impl Guides {
    /// Neither grid nor gizmo
    pub fn hidden() -> Self {
        Self {
            grid: GridOptions {
                enabled: false,
                ..GridOptions::default()
            },
            gizmo: AxisGizmo {
                enabled: false,
                ..AxisGizmo::default()
            },
        }
    }
}

/// Blend the grid lines at height `ground` into `target`; returns pixels touched
pub(crate) fn draw_grid(target: &mut Framebuffer, camera: &Camera, ground: f32, grid: &GridOptions) -> usize {
    if !grid.enabled || !(grid.cell_size > 0.0 && grid.size > 0.0) {
        return 0;
    }

    let view_projection = camera.view_projection();
    let (width, height) = (target.width() as f32, target.height() as f32);
    let half = grid.size / 2.0;
    let lines = (half / grid.cell_size).floor() as i32;
    let per_section = (grid.section_size / grid.cell_size).round().max(1.0) as i32;

    let mut plotted = 0;
    for i in -lines..=lines {
        let offset = i as f32 * grid.cell_size;
        let color = if i % per_section == 0 {
            grid.section_color
        } else {
            grid.cell_color
        };

        for (start, end) in [
            (Point3::new(offset, ground, -half), Point3::new(offset, ground, half)),
            (Point3::new(-half, ground, offset), Point3::new(half, ground, offset)),
        ] {
            let step = (end - start) / GRID_SEGMENTS as f32;
            for s in 0..GRID_SEGMENTS {
                let a = start + step * s as f32;
                let b = a + step;
                let alpha = fade(grid, camera, &nalgebra::center(&a, &b));
                if alpha <= 0.0 {
                    continue;
                }

                let (Some(pa), Some(pb)) = (
                    project_with(&view_projection, &a, width, height),
                    project_with(&view_projection, &b, width, height),
                ) else {
                    continue;
                };
                if !(-1.0..=1.0).contains(&pa.2) || !(-1.0..=1.0).contains(&pb.2) {
                    continue;
                }
                plotted += draw_line(target, (pa.0, pa.1), (pb.0, pb.1), color, alpha);
            }
        }
    }
    plotted
}

fn fade(grid: &GridOptions, camera: &Camera, point: &Point3<f32>) -> f32 {
    if grid.fade_distance <= 0.0 {
        return 1.0;
    }
    let distance = (point - camera.position).norm();
    (1.0 - (distance / grid.fade_distance).powf(grid.fade_strength)).clamp(0.0, 1.0)
}

/// Draw the axis triad over everything else; returns pixels touched
pub(crate) fn draw_gizmo(target: &mut Framebuffer, camera: &Camera, gizmo: &AxisGizmo) -> usize {
    if !gizmo.enabled {
        return 0;
    }
    let arm = target.width().min(target.height()) as f32 * gizmo.size;
    if arm < 2.0 {
        return 0;
    }
    let center = (
        target.width() as f32 - arm * 1.6,
        target.height() as f32 - arm * 1.6,
    );

    let view = camera.view_matrix();
    let mut arms: Vec<(Vector3<f32>, Color)> = [Vector3::x(), Vector3::y(), Vector3::z()]
        .into_iter()
        .zip(gizmo.colors)
        .map(|(axis, color)| (view.transform_vector(&axis), color))
        .collect();
    // view space looks down -z: draw the arms pointing away first
    arms.sort_by(|a, b| a.0.z.total_cmp(&b.0.z));

    let mut plotted = 0;
    for (direction, color) in arms {
        let tip = (center.0 + direction.x * arm, center.1 - direction.y * arm);
        plotted += draw_line(target, center, tip, color, 1.0);
        let (tx, ty) = (tip.0.floor() as i64, tip.1.floor() as i64);
        for dy in -1..=1 {
            for dx in -1..=1 {
                if target.blend(tx + dx, ty + dy, color, 1.0) {
                    plotted += 1;
                }
            }
        }
    }
    plotted
}

/// DDA line between two screen positions
fn draw_line(target: &mut Framebuffer, a: (f32, f32), b: (f32, f32), color: Color, alpha: f32) -> usize {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let span = dx.abs().max(dy.abs()).ceil();
    if !span.is_finite() {
        return 0;
    }
    let limit = ((target.width() + target.height()) * 4) as f32;
    let steps = span.clamp(1.0, limit) as usize;

    let mut plotted = 0;
    for step in 0..=steps {
        let t = step as f32 / steps as f32;
        let x = (a.0 + dx * t).floor() as i64;
        let y = (a.1 + dy * t).floor() as i64;
        if target.blend(x, y, color, alpha) {
            plotted += 1;
        }
    }
    plotted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn background() -> Color {
        Color::from_u32(0x0a0a0b)
    }

    #[test]
    fn test_grid_runs_through_the_look_at_point() {
        let camera = Camera::new(90, 160);
        let mut target = Framebuffer::new(90, 160);
        target.clear(background());

        let plotted = draw_grid(&mut target, &camera, 0.0, &GridOptions::default());
        assert!(plotted > 0);

        // the x = 0 and z = 0 lines cross at the origin, the screen center
        let bg = background();
        let near_center = (43..=47)
            .flat_map(|x| (78..=82).map(move |y| (x, y)))
            .any(|(x, y)| target.pixel(x, y) != [bg.r, bg.g, bg.b, 0xff]);
        assert!(near_center);
    }

    #[test]
    fn test_disabled_grid_draws_nothing() {
        let camera = Camera::new(90, 160);
        let mut target = Framebuffer::new(90, 160);
        let grid = GridOptions {
            enabled: false,
            ..GridOptions::default()
        };
        assert_eq!(draw_grid(&mut target, &camera, 0.0, &grid), 0);
    }

    #[test]
    fn test_fade_is_full_nearby_and_gone_far_away() {
        let camera = Camera::default();
        let grid = GridOptions::default();
        assert!(fade(&grid, &camera, &camera.position) > 0.99);

        let far = camera.position + Vector3::new(grid.fade_distance * 2.0, 0.0, 0.0);
        assert_eq!(fade(&grid, &camera, &far), 0.0);
    }

    #[test]
    fn test_gizmo_draws_every_axis_color_in_the_corner() {
        let camera = Camera::new(90, 160);
        let mut target = Framebuffer::new(90, 160);
        target.clear(background());
        let gizmo = AxisGizmo::default();

        assert!(draw_gizmo(&mut target, &camera, &gizmo) > 0);
        for color in gizmo.colors {
            let rgba = [color.r, color.g, color.b, 0xff];
            let found = (45..90)
                .flat_map(|x| (80..160).map(move |y| (x, y)))
                .any(|(x, y)| target.pixel(x, y) == rgba);
            assert!(found, "missing arm {}", color.to_hex());
        }
        // nothing outside the bottom-right quadrant
        assert_eq!(target.pixel(10, 10), [0x0a, 0x0a, 0x0b, 0xff]);
    }

    #[test]
    fn test_tiny_viewport_skips_gizmo() {
        let mut target = Framebuffer::new(8, 8);
        assert_eq!(draw_gizmo(&mut target, &Camera::new(8, 8), &AxisGizmo::default()), 0);
    }
}
