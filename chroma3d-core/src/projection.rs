/// Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

use crate::transform::Transform;

/// Camera configuration for 3D rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in radians
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Where the camera sits before any model is framed
    pub home: Point3<f32>,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        let home = Point3::new(2.2, 1.6, 2.2);
        Self {
            position: home,
            target: Point3::origin(),
            up: Vector3::y(),
            fov: 35f32.to_radians(),
            aspect: aspect_ratio(width, height),
            near: 0.1,
            far: 100.0,
            home,
        }
    }

    pub fn with_fov_degrees(mut self, degrees: f32) -> Self {
        self.fov = degrees.to_radians();
        self
    }

    pub fn with_home(mut self, home: Point3<f32>) -> Self {
        self.home = home;
        self.position = home;
        self
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    /// Return to the home position looking at the origin
    pub fn reset(&mut self) {
        self.position = self.home;
        self.target = Point3::origin();
        self.near = 0.1;
        self.far = 100.0;
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).norm()
    }

    /// The narrower of the horizontal and vertical half-angles
    pub fn min_half_fov(&self) -> f32 {
        let half_vertical = self.fov / 2.0;
        let half_horizontal = (half_vertical.tan() * self.aspect).atan();
        half_vertical.min(half_horizontal)
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Project a 3D point to screen space: (x, y, depth in -1..=1).
    ///
    /// Returns `None` for points behind the camera.
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        model_matrix: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        project_with(
            &Transform::mvp_matrix(model_matrix, &self.view_matrix(), &self.projection_matrix()),
            point,
            width as f32,
            height as f32,
        )
    }
}

/// Project through a precomputed model-view-projection matrix
pub(crate) fn project_with(
    mvp: &Matrix4<f32>,
    point: &Point3<f32>,
    width: f32,
    height: f32,
) -> Option<(f32, f32, f32)> {
    let clip = mvp * Vector4::new(point.x, point.y, point.z, 1.0);

    // Prevent division by near-zero depth values
    if clip.w < 1e-6 {
        return None;
    }

    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    let depth = clip.z / clip.w;

    // Convert to screen space
    let screen_x = (ndc_x + 1.0) * 0.5 * width;
    let screen_y = (1.0 - ndc_y) * 0.5 * height;

    Some((screen_x, screen_y, depth))
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

impl Default for Camera {
    /// Portrait 9:16 viewport
    fn default() -> Self {
        Self::new(360, 640)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_creation() {
        let camera = Camera::new(800, 600);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
        assert!((camera.fov - 35f32.to_radians()).abs() < 1e-6);
        assert_eq!(camera.position, camera.home);
    }

    #[test]
    fn test_view_matrix() {
        let camera = Camera::new(800, 600);
        let view = camera.view_matrix();
        // View matrix should be non-zero
        assert!(view.norm() > 0.0);
    }

    #[test]
    fn test_target_projects_to_center() {
        let camera = Camera::new(360, 640);
        let (x, y, depth) = camera
            .project_to_screen(&Point3::origin(), &Matrix4::identity(), 360, 640)
            .unwrap();
        assert!((x - 180.0).abs() < 1e-3);
        assert!((y - 320.0).abs() < 1e-3);
        assert!(depth > -1.0 && depth < 1.0);
    }

    #[test]
    fn test_point_behind_camera_is_rejected() {
        let camera = Camera::new(360, 640);
        let behind = camera.position + (camera.position - camera.target);
        assert!(camera
            .project_to_screen(&behind, &Matrix4::identity(), 360, 640)
            .is_none());
    }

    #[test]
    fn test_portrait_viewport_is_limited_horizontally() {
        let camera = Camera::default();
        assert!(camera.min_half_fov() < camera.fov / 2.0);
    }
}
