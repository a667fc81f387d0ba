//! Loading named templates from the template directory

use super::manifest::TemplateManifest;
use super::render::{render, RenderContext};
use crate::error::ScaffoldError;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Name of the manifest inside a template directory
pub const MANIFEST_FILE: &str = "template.yaml";

/// A template directory and its parsed manifest
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
    manifest: TemplateManifest,
}

impl TemplateStore {
    /// Open `dir`, failing when it or its manifest is missing
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(ScaffoldError::MissingTemplate {
                name: MANIFEST_FILE.to_string(),
                dir: dir.to_path_buf(),
            }
            .into());
        }

        let manifest_path = dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&manifest_path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ScaffoldError::MissingTemplate {
                name: MANIFEST_FILE.to_string(),
                dir: dir.to_path_buf(),
            },
            _ => ScaffoldError::fs(&manifest_path, e),
        })?;
        let manifest: TemplateManifest = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", manifest_path.display()))?;

        Ok(Self {
            dir: dir.to_path_buf(),
            manifest,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn manifest(&self) -> &TemplateManifest {
        &self.manifest
    }

    /// Raw bytes of a named template
    pub fn load(&self, name: &str) -> Result<Vec<u8>, ScaffoldError> {
        let path = self.dir.join(name);
        std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ScaffoldError::MissingTemplate {
                name: name.to_string(),
                dir: self.dir.clone(),
            },
            _ => ScaffoldError::fs(&path, e),
        })
    }

    /// Load a named template and substitute its placeholders
    pub fn render(&self, name: &str, ctx: &RenderContext) -> Result<String> {
        let bytes = self.load(name)?;
        let text = String::from_utf8(bytes)
            .with_context(|| format!("Template '{}' is not valid UTF-8", name))?;
        render(&text, ctx).with_context(|| format!("Failed to render template '{}'", name))
    }

    /// Names from `names` that are missing, so a run can fail before touching the project
    pub fn missing(&self, names: &[&str]) -> Vec<String> {
        names
            .iter()
            .filter(|name| !self.dir.join(name).is_file())
            .map(|name| name.to_string())
            .collect()
    }
}
