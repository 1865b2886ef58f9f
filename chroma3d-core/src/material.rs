/// Color/finish presets and material replacement
use serde::{Deserialize, Serialize};

use crate::error::PresetError;
use crate::scene::SceneRoot;

/// An sRGB color with 8-bit channels, written as `#rrggbb` in config files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn from_u32(hex: u32) -> Self {
        Self::rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// Parse `#rrggbb` (the leading `#` is optional)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self::from_u32)
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear-light channels in 0..=1
    pub fn to_linear(&self) -> [f32; 3] {
        [self.r, self.g, self.b].map(|c| srgb_to_linear(c as f32 / 255.0))
    }

    /// Build a color from linear-light channels
    pub fn from_linear(rgb: [f32; 3]) -> Self {
        let [r, g, b] = rgb.map(|c| (linear_to_srgb(c.clamp(0.0, 1.0)) * 255.0).round() as u8);
        Self::rgb(r, g, b)
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(hex: String) -> Result<Self, Self::Error> {
        Color::from_hex(&hex).ok_or_else(|| format!("invalid color {:?}, expected #rrggbb", hex))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Physically-based surface parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub base_color: Color,
    pub metalness: f32,
    pub roughness: f32,
    /// Name of a base color texture, only ever set by the glTF parser
    pub texture: Option<String>,
    /// Preset this material was built from
    pub preset: Option<&'static str>,
}

impl Material {
    pub fn new(base_color: Color, metalness: f32, roughness: f32) -> Self {
        Self {
            base_color,
            metalness: metalness.clamp(0.0, 1.0),
            roughness: roughness.clamp(0.0, 1.0),
            texture: None,
            preset: None,
        }
    }
}

impl Default for Material {
    /// Neutral light gray used until a preset is applied
    fn default() -> Self {
        Self::new(Color::from_u32(0xcccccc), 0.0, 0.5)
    }
}

impl From<&Preset> for Material {
    fn from(preset: &Preset) -> Self {
        Self {
            preset: Some(preset.key),
            ..Material::new(preset.color, preset.metalness, preset.roughness)
        }
    }
}

/// A named color/finish from the static catalog
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub key: &'static str,
    pub name: &'static str,
    pub color: Color,
    pub metalness: f32,
    pub roughness: f32,
}

impl Preset {
    const fn new(
        key: &'static str,
        name: &'static str,
        hex: u32,
        metalness: f32,
        roughness: f32,
    ) -> Self {
        Self {
            key,
            name,
            color: Color::from_u32(hex),
            metalness,
            roughness,
        }
    }

    pub fn material(&self) -> Material {
        Material::from(self)
    }
}

pub const DEFAULT_PRESET: &str = "chroma-orange";

/// Finishes first, then the filament swatch palette
pub static PRESETS: &[Preset] = &[
    Preset::new("bronze", "Bronze", 0xcd7f32, 1.0, 0.35),
    Preset::new("gunmetal", "Gunmetal", 0x53565b, 0.9, 0.4),
    Preset::new("silver", "Silver", 0xc0c0c0, 1.0, 0.25),
    Preset::new("graphite", "Graphite", 0x2f2f2f, 0.2, 0.6),
    Preset::new("chroma-orange", "Chroma Orange", 0xf97316, 0.1, 0.5),
    Preset::new("soft-white", "Soft White", 0xf5f5f4, 0.0, 0.6),
    Preset::new("neutral-gray", "Neutral Gray", 0x9ca3af, 0.1, 0.55),
    Preset::new("matte-black", "Matte Black", 0x111111, 0.1, 0.5),
    Preset::new("pearl-white", "Pearl White", 0xe5e7eb, 0.1, 0.5),
    Preset::new("signal-red", "Signal Red", 0xef4444, 0.1, 0.5),
    Preset::new("emerald", "Emerald", 0x10b981, 0.1, 0.5),
    Preset::new("sky", "Sky", 0x38bdf8, 0.1, 0.5),
    Preset::new("royal-blue", "Royal Blue", 0x3b82f6, 0.1, 0.5),
    Preset::new("violet", "Violet", 0x8b5cf6, 0.1, 0.5),
];

pub fn find_preset(key: &str) -> Result<&'static Preset, PresetError> {
    PRESETS
        .iter()
        .find(|preset| preset.key.eq_ignore_ascii_case(key))
        .ok_or_else(|| PresetError::Unknown(key.to_string()))
}

pub fn default_preset() -> &'static Preset {
    PRESETS
        .iter()
        .find(|preset| preset.key == DEFAULT_PRESET)
        .unwrap_or(&PRESETS[0])
}

/// Return a copy of `scene` with every surface wearing `preset`.
///
/// Geometry is shared with the input; only materials and shadow flags change.
pub fn apply_preset(scene: &SceneRoot, preset: &Preset) -> SceneRoot {
    let mut styled = scene.clone();
    styled.apply_preset(preset);
    styled
}
