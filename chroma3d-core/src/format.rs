/// Supported model formats and suffix detection
use std::fmt;

use crate::error::IntakeError;

/// A mesh format the previewer can parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFormat {
    Glb,
    Gltf,
    Stl,
    Obj,
}

impl ModelFormat {
    pub const ALL: [ModelFormat; 4] = [
        ModelFormat::Glb,
        ModelFormat::Gltf,
        ModelFormat::Stl,
        ModelFormat::Obj,
    ];

    /// Value for the file picker's `accept` attribute
    pub const ACCEPT: &'static str = ".glb,.gltf,.stl,.obj";

    /// Detect the format from a file name's suffix, ignoring case
    pub fn from_file_name(file_name: &str) -> Result<Self, IntakeError> {
        file_name
            .rsplit_once('.')
            .and_then(|(_, ext)| Self::from_extension(ext))
            .ok_or_else(|| IntakeError::UnsupportedFormat {
                file_name: file_name.to_string(),
            })
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(ext))
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ModelFormat::Glb => "glb",
            ModelFormat::Gltf => "gltf",
            ModelFormat::Stl => "stl",
            ModelFormat::Obj => "obj",
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.extension())
    }
}
