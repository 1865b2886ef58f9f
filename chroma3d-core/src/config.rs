/// Viewer configuration loaded from JSON
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::framing::FramingOptions;
use crate::guides::Guides;
use crate::lighting::LightRig;
use crate::material::{find_preset, Preset, DEFAULT_PRESET};
use crate::normalize::NormalizeOptions;
use crate::orbit::OrbitOptions;
use crate::projection::Camera;
use crate::quote::QuoteContact;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
    /// Vertical field of view
    pub fov_degrees: f32,
    pub home: [f32; 3],
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 360,
            height: 640,
            fov_degrees: 35.0,
            home: [2.2, 1.6, 2.2],
        }
    }
}

impl ViewportConfig {
    pub fn camera(&self) -> Camera {
        Camera::new(self.width, self.height)
            .with_fov_degrees(self.fov_degrees)
            .with_home(Point3::from(self.home))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub viewport: ViewportConfig,
    pub normalize: NormalizeOptions,
    pub framing: FramingOptions,
    pub orbit: OrbitOptions,
    pub lighting: LightRig,
    /// Ground grid and axis gizmo
    pub guides: Guides,
    /// Preset key applied to freshly loaded models
    pub default_preset: String,
    pub contact: QuoteContact,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            normalize: NormalizeOptions::default(),
            framing: FramingOptions::default(),
            orbit: OrbitOptions::default(),
            lighting: LightRig::default(),
            guides: Guides::default(),
            default_preset: DEFAULT_PRESET.to_string(),
            contact: QuoteContact::default(),
        }
    }
}

impl ViewerConfig {
    /// The hero sculpture: a bronze turntable with a tighter lens
    pub fn showcase() -> Self {
        Self {
            viewport: ViewportConfig {
                fov_degrees: 30.0,
                ..ViewportConfig::default()
            },
            framing: FramingOptions {
                margin: 1.1,
                ..FramingOptions::default()
            },
            orbit: OrbitOptions::turntable(),
            lighting: LightRig::showcase(),
            guides: Guides::hidden(),
            default_preset: "bronze".to_string(),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("reading config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check ranges and resolve the default preset
    pub fn validate(&self) -> Result<&'static Preset, ConfigError> {
        let viewport = &self.viewport;
        if viewport.width == 0 || viewport.height == 0 {
            return Err(ConfigError::Invalid("viewport must be at least 1x1".into()));
        }
        if !(viewport.fov_degrees > 0.0 && viewport.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "fov_degrees {} is outside (0, 180)",
                viewport.fov_degrees
            )));
        }
        if self.framing.margin < 1.0 {
            return Err(ConfigError::Invalid("framing margin must be at least 1".into()));
        }
        let normalize = &self.normalize;
        if !(normalize.min_extent > 0.0
            && normalize.min_extent < normalize.max_extent
            && normalize.target_extent > 0.0)
        {
            return Err(ConfigError::Invalid(format!(
                "normalize range [{}, {}] with target {} is not usable",
                normalize.min_extent, normalize.max_extent, normalize.target_extent
            )));
        }
        let grid = &self.guides.grid;
        if grid.enabled && !(grid.cell_size > 0.0 && grid.size > 0.0) {
            return Err(ConfigError::Invalid("grid size and cell_size must be positive".into()));
        }
        if self.orbit.min_polar_angle > self.orbit.max_polar_angle {
            return Err(ConfigError::Invalid("min_polar_angle exceeds max_polar_angle".into()));
        }
        Ok(find_preset(&self.default_preset)?)
    }
}
