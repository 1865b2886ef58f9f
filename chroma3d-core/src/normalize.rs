/// Rescaling and recentering of freshly parsed scenes
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::geometry::Aabb;
use crate::scene::SceneRoot;
use crate::transform::ModelTransform;

/// Size range outside of which a model gets rescaled
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    pub min_extent: f32,
    pub max_extent: f32,
    /// Largest dimension after rescaling
    pub target_extent: f32,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            min_extent: 0.01,
            max_extent: 100.0,
            target_extent: 1.0,
        }
    }
}

/// What normalization did to a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Size was reasonable; only recentered
    Recentered,
    /// Uniformly rescaled into the target size, then recentered
    Rescaled,
    /// Zero-size geometry; recentered without scaling
    Flat,
    /// Empty bounds, or bounds too large to measure; left untouched
    Degenerate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub transform: ModelTransform,
    /// Bounds of the geometry before normalization
    pub source_bounds: Aabb,
    pub outcome: Outcome,
}

/// Compute the normalization transform for a scene.
///
/// Works from the parsed geometry only, ignoring any transform already set
/// on the scene, so repeated calls give the same answer.
pub fn normalize(scene: &SceneRoot, options: &NormalizeOptions) -> Normalization {
    normalize_bounds(&scene.local_bounds(), options)
}

pub fn normalize_bounds(bounds: &Aabb, options: &NormalizeOptions) -> Normalization {
    // finite corners can still be far enough apart to overflow the extent
    let extent = bounds.max_extent();
    if !bounds.is_finite() || !extent.is_finite() {
        return Normalization {
            transform: ModelTransform::identity(),
            source_bounds: *bounds,
            outcome: Outcome::Degenerate,
        };
    }

    let (scale, outcome) = if extent <= f32::EPSILON {
        (1.0, Outcome::Flat)
    } else if extent < options.min_extent || extent > options.max_extent {
        (options.target_extent / extent, Outcome::Rescaled)
    } else {
        (1.0, Outcome::Recentered)
    };

    let center: Vector3<f32> = bounds.center().coords;
    Normalization {
        transform: ModelTransform::new(scale, -center * scale),
        source_bounds: *bounds,
        outcome,
    }
}

impl SceneRoot {
    /// Apply the normalization transform in place
    pub fn normalize(&mut self, options: &NormalizeOptions) -> Normalization {
        let normalization = normalize(self, options);
        log::debug!(
            "normalized {:?}: {:?}, scale {}",
            self.id(),
            normalization.outcome,
            normalization.transform.scale
        );
        self.transform = normalization.transform;
        normalization
    }
}
