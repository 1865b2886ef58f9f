/// Error types for intake, parsing, presets and configuration
use thiserror::Error;

/// Message shown inline when a file with the wrong suffix is dropped in
pub const UNSUPPORTED_FORMAT_MESSAGE: &str =
    "Unsupported format. Please upload .glb/.gltf, .stl, or .obj";

/// Errors raised while accepting a user-provided file
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("{message} (got {file_name:?})", message = UNSUPPORTED_FORMAT_MESSAGE)]
    UnsupportedFormat { file_name: String },

    /// The platform could not issue a local reference for the file.
    #[error("failed to create a local reference: {0}")]
    Reference(String),
}

impl IntakeError {
    /// Short text suitable for the inline notice under the dropzone
    pub fn user_message(&self) -> &str {
        match self {
            IntakeError::UnsupportedFormat { .. } => UNSUPPORTED_FORMAT_MESSAGE,
            IntakeError::Reference(_) => "Could not open the selected file.",
        }
    }
}

/// Errors raised while turning file bytes into a scene root
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no file has been selected")]
    NothingSelected,

    #[error("invalid STL: {0}")]
    Stl(String),

    #[error("invalid OBJ: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("invalid glTF: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("glTF requires unsupported extension {0:?}")]
    UnsupportedExtension(String),

    #[error("glTF node {0} is listed among its own descendants")]
    NodeCycle(usize),

    #[error("glTF node hierarchy rejected: {0}")]
    Hierarchy(String),

    #[error("the model contains no triangles")]
    Empty,
}

/// Unknown preset key
#[derive(Debug, Error)]
pub enum PresetError {
    #[error("unknown color preset {0:?}")]
    Unknown(String),
}

/// Errors raised while reading a viewer configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Preset(#[from] PresetError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Either half of selecting and loading a file in one step
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Load(#[from] LoadError),
}
