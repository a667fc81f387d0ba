//! Gradle/Kotlin templates
//!
//! This module provides:
//! - The template manifest (`template.yaml`) with toolchain versions
//! - A store that loads named templates from the template directory
//! - `{{placeholder}}` rendering
//! - Version compatibility checking

pub mod manifest;
pub mod render;
pub mod store;
pub mod version;

pub use manifest::TemplateManifest;
pub use render::{render, RenderContext};
pub use store::{TemplateStore, MANIFEST_FILE};
pub use version::check_compatibility;
