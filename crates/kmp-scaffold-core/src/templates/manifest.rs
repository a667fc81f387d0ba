//! Template manifest types and parsing

use crate::config::Versions;
use serde::{Deserialize, Serialize};

/// Manifest of a template directory (`<template-dir>/template.yaml`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateManifest {
    /// Display name of the template set
    pub name: String,

    /// Description of the layout it produces
    #[serde(default)]
    pub description: String,

    /// Semver version for CLI compatibility checking
    pub version: String,

    /// Toolchain versions; missing entries fall back to built-in defaults
    #[serde(default)]
    pub versions: Versions,
}
