/// 3D transformation matrices and the model normalization transform
use nalgebra::{Matrix4, Point3, Vector3};

/// Uniform scale followed by a translation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelTransform {
    pub scale: f32,
    pub translation: Vector3<f32>,
}

impl ModelTransform {
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            translation: Vector3::zeros(),
        }
    }

    pub fn new(scale: f32, translation: Vector3<f32>) -> Self {
        Self { scale, translation }
    }

    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.translation == Vector3::zeros()
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        Transform::translation_matrix(self.translation.x, self.translation.y, self.translation.z)
            * Transform::scale_matrix(self.scale)
    }

    pub fn apply(&self, point: &Point3<f32>) -> Point3<f32> {
        Point3::from(point.coords * self.scale + self.translation)
    }
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Create a uniform scale matrix
    pub fn scale_matrix(scale: f32) -> Matrix4<f32> {
        Matrix4::new_scaling(scale)
    }

    /// Create a model-view-projection matrix
    pub fn mvp_matrix(
        model: &Matrix4<f32>,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) -> Matrix4<f32> {
        projection * view * model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transform() {
        let transform = ModelTransform::identity();
        assert!(transform.is_identity());
        assert!((transform.matrix() - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_scale_then_translate() {
        let transform = ModelTransform::new(2.0, Vector3::new(1.0, 0.0, -1.0));
        let point = Point3::new(1.0, 2.0, 3.0);
        let expected = Point3::new(3.0, 4.0, 5.0);

        assert_eq!(transform.apply(&point), expected);
        assert!((transform.matrix().transform_point(&point) - expected).norm() < 1e-6);
    }
}
