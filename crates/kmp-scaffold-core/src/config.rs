//! Resolved scaffolding configuration
//!
//! Values are layered: built-in defaults, then the template manifest's
//! `versions` table, then environment variables, then CLI flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Overrides the template directory
pub const TEMPLATE_DIR_ENV: &str = "KMP_TEMPLATE_DIR";

/// Overrides the Gradle distribution URL written to gradle-wrapper.properties
pub const DISTRIBUTION_URL_ENV: &str = "KMP_GRADLE_DISTRIBUTION_URL";

/// Overrides where gradle-wrapper.jar is downloaded from
pub const WRAPPER_JAR_URL_ENV: &str = "KMP_GRADLE_WRAPPER_JAR_URL";

/// Template set used when none is configured
const DEFAULT_TEMPLATE_SET: &str = "templates/kmp";

/// Toolchain versions written into the generated Gradle files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Versions {
    pub kotlin: String,
    pub agp: String,
    pub gradle: String,
    pub android_compile_sdk: String,
    pub android_min_sdk: String,
    pub android_target_sdk: String,
}

impl Default for Versions {
    fn default() -> Self {
        Self {
            kotlin: "1.9.22".to_string(),
            agp: "8.2.2".to_string(),
            gradle: "8.5".to_string(),
            android_compile_sdk: "34".to_string(),
            android_min_sdk: "24".to_string(),
            android_target_sdk: "34".to_string(),
        }
    }
}

impl Versions {
    /// `(placeholder, value)` pairs for template rendering
    pub fn placeholders(&self) -> Vec<(String, String)> {
        [
            ("kotlin", &self.kotlin),
            ("agp", &self.agp),
            ("gradle", &self.gradle),
            ("android_compile_sdk", &self.android_compile_sdk),
            ("android_min_sdk", &self.android_min_sdk),
            ("android_target_sdk", &self.android_target_sdk),
        ]
        .into_iter()
        .map(|(name, value)| (format!("versions.{}", name), value.clone()))
        .collect()
    }

    /// Gradle release tag, which always carries a patch component (`8.5` -> `8.5.0`)
    fn gradle_tag(&self) -> String {
        if self.gradle.matches('.').count() == 1 {
            format!("{}.0", self.gradle)
        } else {
            self.gradle.clone()
        }
    }
}

/// Everything the pipeline needs besides the project itself
#[derive(Debug, Clone)]
pub struct ScaffoldConfig {
    pub template_dir: PathBuf,
    pub versions: Versions,
    pub distribution_url: Url,
    pub wrapper_jar_url: Url,
}

impl ScaffoldConfig {
    /// Derive download URLs from the versions, honoring environment overrides
    pub fn new(template_dir: PathBuf, versions: Versions) -> Result<Self> {
        let distribution_url = url_from_env_or(
            DISTRIBUTION_URL_ENV,
            format!(
                "https://services.gradle.org/distributions/gradle-{}-bin.zip",
                versions.gradle
            ),
        )?;
        let wrapper_jar_url = url_from_env_or(
            WRAPPER_JAR_URL_ENV,
            format!(
                "https://raw.githubusercontent.com/gradle/gradle/v{}/gradle/wrapper/gradle-wrapper.jar",
                versions.gradle_tag()
            ),
        )?;

        Ok(Self {
            template_dir,
            versions,
            distribution_url,
            wrapper_jar_url,
        })
    }
}

fn url_from_env_or(env: &str, default: String) -> Result<Url> {
    let raw = std::env::var(env).unwrap_or(default);
    Url::parse(&raw).with_context(|| format!("Invalid URL: {}", raw))
}

/// Pick the template directory: explicit flag, then `KMP_TEMPLATE_DIR`,
/// then `templates/kmp` next to the executable, then under `cwd`
pub fn resolve_template_dir(flag: Option<&Path>, cwd: &Path) -> PathBuf {
    if let Some(dir) = flag {
        return absolutize(dir, cwd);
    }

    if let Ok(dir) = std::env::var(TEMPLATE_DIR_ENV) {
        if !dir.is_empty() {
            return absolutize(Path::new(&dir), cwd);
        }
    }

    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_TEMPLATE_SET)));
    match beside_exe {
        Some(dir) if dir.is_dir() => dir,
        _ => cwd.join(DEFAULT_TEMPLATE_SET),
    }
}

/// Join relative paths onto `base`
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
