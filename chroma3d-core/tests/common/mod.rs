//! Model files built in memory for the integration tests

#![allow(dead_code)]

#[path = "../../src/fixtures.rs"]
mod fixtures;

pub use fixtures::*;

use chroma3d_core::UploadedAsset;

pub fn stl_asset(name: &str, min: [f32; 3], max: [f32; 3]) -> UploadedAsset {
    UploadedAsset::new(name, box_stl(min, max))
}
