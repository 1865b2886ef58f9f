/// Camera auto-framing around a model's bounding volume
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::geometry::Aabb;
use crate::projection::Camera;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramingOptions {
    /// Multiplier on the distance that just fits the model
    pub margin: f32,
    /// Frames to keep refitting after a load
    pub refit_frames: u32,
}

impl Default for FramingOptions {
    fn default() -> Self {
        Self {
            margin: 1.2,
            refit_frames: 3,
        }
    }
}

/// Move the camera so `bounds` fits in view, keeping the viewing direction.
///
/// Degenerate bounds send the camera home and return `false`.
pub fn fit_camera(camera: &mut Camera, bounds: &Aabb, margin: f32) -> bool {
    if !bounds.is_finite() || !bounds.bounding_radius().is_finite() {
        camera.reset();
        return false;
    }

    let center = bounds.center();
    let radius = match bounds.bounding_radius() {
        r if r > f32::EPSILON => r,
        _ => 0.5,
    };

    let direction = match (camera.position - camera.target).try_normalize(f32::EPSILON) {
        Some(direction) => direction,
        None => camera
            .home
            .coords
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::z),
    };

    let distance = radius * margin.max(1.0) / camera.min_half_fov().sin();
    camera.target = center;
    camera.position = center + direction * distance;
    camera.near = (distance - radius * 2.0).max(distance / 100.0);
    camera.far = distance + radius * 4.0;
    true
}

/// Refits the camera for a few frames after a model is mounted
#[derive(Debug, Clone)]
pub struct AutoFramer {
    options: FramingOptions,
    remaining: u32,
}

impl AutoFramer {
    pub fn new(options: FramingOptions) -> Self {
        Self {
            options,
            remaining: 0,
        }
    }

    /// Fit immediately and schedule the follow-up refits
    pub fn begin(&mut self, camera: &mut Camera, bounds: &Aabb) -> bool {
        self.remaining = self.options.refit_frames;
        fit_camera(camera, bounds, self.options.margin)
    }

    pub fn cancel(&mut self) {
        self.remaining = 0;
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    /// Refit once if frames remain; returns whether the camera moved
    pub fn tick(&mut self, camera: &mut Camera, bounds: &Aabb) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        let before = camera.position;
        fit_camera(camera, bounds, self.options.margin);
        (camera.position - before).norm() > 1e-4
    }
}
