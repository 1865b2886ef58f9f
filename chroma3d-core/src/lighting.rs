/// Light rig used by the preview viewport
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::material::Color;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalLight {
    /// Position the light shines from, toward the origin
    pub position: [f32; 3],
    pub intensity: f32,
    pub color: Color,
    pub cast_shadow: bool,
}

impl DirectionalLight {
    /// Unit vector pointing from the scene toward the light
    pub fn direction(&self) -> Vector3<f32> {
        Vector3::from(self.position)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::y)
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            position: [3.0, 6.0, 4.0],
            intensity: 0.8,
            color: Color::WHITE,
            cast_shadow: true,
        }
    }
}

/// Soft darkening on the ground plane under the model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactShadow {
    pub enabled: bool,
    pub opacity: f32,
    /// Side length of the square shadow catcher
    pub scale: f32,
    pub blur: f32,
    /// Geometry further than this above the ground casts nothing
    pub far: f32,
}

impl Default for ContactShadow {
    fn default() -> Self {
        Self {
            enabled: true,
            opacity: 0.35,
            scale: 10.0,
            blur: 2.5,
            far: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightRig {
    pub ambient_intensity: f32,
    pub ambient_color: Color,
    pub directional: DirectionalLight,
    pub contact_shadow: ContactShadow,
    /// Viewport clear color
    pub background: Color,
}

impl Default for LightRig {
    fn default() -> Self {
        Self {
            ambient_intensity: 0.35,
            ambient_color: Color::WHITE,
            directional: DirectionalLight::default(),
            contact_shadow: ContactShadow::default(),
            background: Color::from_u32(0x0a0a0b),
        }
    }
}

impl LightRig {
    /// The hero sculpture's dimmer key light
    pub fn showcase() -> Self {
        Self {
            directional: DirectionalLight {
                position: [4.0, 6.0, 3.0],
                intensity: 0.6,
                ..DirectionalLight::default()
            },
            ..Self::default()
        }
    }
}
