//! Project type detection from marker files

use crate::config::absolutize;
use crate::error::ScaffoldError;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Marker files of a Gradle-based Android project
const ANDROID_MARKERS: &[&str] = &[
    "build.gradle",
    "build.gradle.kts",
    "app/build.gradle",
    "app/build.gradle.kts",
];

/// How deep to look for `project.pbxproj`
const PBXPROJ_SEARCH_DEPTH: usize = 4;

/// What the project root already contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectType {
    Android,
    Ios,
    /// Nothing recognizable; the layout is created from scratch
    Fresh,
}

impl ProjectType {
    pub fn display_name(&self) -> &'static str {
        match self {
            ProjectType::Android => "Android",
            ProjectType::Ios => "iOS",
            ProjectType::Fresh => "new project",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Probe `root` for Android, then iOS markers
pub fn detect(root: &Path) -> Option<ProjectType> {
    if is_android(root) {
        Some(ProjectType::Android)
    } else if is_ios(root) {
        Some(ProjectType::Ios)
    } else {
        None
    }
}

fn is_android(root: &Path) -> bool {
    ANDROID_MARKERS.iter().any(|marker| root.join(marker).is_file())
}

fn is_ios(root: &Path) -> bool {
    if root.join("Podfile").is_file() {
        return true;
    }

    let has_xcode_bundle = std::fs::read_dir(root)
        .map(|entries| {
            entries.flatten().any(|entry| {
                let path = entry.path();
                path.is_dir()
                    && path
                        .extension()
                        .is_some_and(|ext| ext == "xcodeproj" || ext == "xcworkspace")
            })
        })
        .unwrap_or(false);
    if has_xcode_bundle {
        return true;
    }

    WalkDir::new(root)
        .max_depth(PBXPROJ_SEARCH_DEPTH)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
        .flatten()
        .any(|entry| entry.file_type().is_file() && entry.file_name() == "project.pbxproj")
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Resolve and check a user-supplied project root
pub fn validate_root(input: &str, cwd: &Path) -> Result<PathBuf, ScaffoldError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ScaffoldError::InputValidation(
            "Project path cannot be empty".to_string(),
        ));
    }

    let path = absolutize(Path::new(trimmed), cwd);
    let metadata = std::fs::metadata(&path).map_err(|e| ScaffoldError::fs(&path, e))?;
    if !metadata.is_dir() {
        return Err(ScaffoldError::InputValidation(format!(
            "{} is not a directory",
            path.display()
        )));
    }
    std::fs::read_dir(&path).map_err(|e| ScaffoldError::fs(&path, e))?;

    Ok(path)
}
