/// Chroma3D Core Library - model preview pipeline
///
/// This library provides the platform-free half of the upload preview:
/// file intake, STL/OBJ/glTF parsing, normalization and framing, color
/// presets, orbit controls, the inspection grid and gizmo, and a software
/// rasterizer. Front ends drive a [`PreviewSession`] and blit its
/// framebuffer.

pub mod asset;
pub mod config;
pub mod error;
pub mod format;
pub mod framing;
pub mod geometry;
pub mod gltf_scene;
pub mod guides;
pub mod intake;
pub mod lighting;
pub mod loader;
pub mod material;
pub mod normalize;
pub mod obj;
pub mod orbit;
pub mod preview;
pub mod projection;
pub mod quote;
pub mod raster;
pub mod scene;
pub mod stl;
pub mod transform;

#[cfg(test)]
mod fixtures;

// Re-export commonly used types
pub use asset::UploadedAsset;
pub use config::{ViewerConfig, ViewportConfig};
pub use error::{ConfigError, IntakeError, LoadError, PresetError, PreviewError};
pub use format::ModelFormat;
pub use geometry::{Aabb, Mesh, Triangle, Vertex};
pub use guides::{AxisGizmo, GridOptions, Guides};
pub use intake::{AssetIntake, InMemoryReferences, LocalRef, LocalReferences};
pub use material::{apply_preset, find_preset, Color, Material, Preset, PRESETS};
pub use normalize::{normalize, NormalizeOptions, Normalization, Outcome};
pub use preview::{PreviewSession, PreviewState, UploadTicket};
pub use projection::Camera;
pub use raster::{Framebuffer, RenderStats};
pub use scene::{GeometryId, SceneNode, SceneRoot, Surface};
pub use transform::{ModelTransform, Transform};
