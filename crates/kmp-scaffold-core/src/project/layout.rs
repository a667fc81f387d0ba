//! The KMP directory skeleton

use crate::error::ScaffoldError;
use std::path::{Path, PathBuf};

/// Top-level directories the scaffold owns
pub const SCAFFOLD_DIRS: &[&str] = &["shared", "androidApp", "iosApp", "gradle"];

/// Source sets of the shared module
pub const SOURCE_SETS: &[&str] = &[
    "commonMain",
    "commonTest",
    "androidMain",
    "androidTest",
    "iosMain",
    "iosTest",
];

/// Every directory of the skeleton, relative to the project root
pub fn skeleton_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    for source_set in SOURCE_SETS {
        let base = Path::new("shared").join("src").join(source_set);
        dirs.push(base.join("kotlin"));
        dirs.push(base.join("resources"));
    }
    dirs.push(PathBuf::from("androidApp"));
    dirs.push(PathBuf::from("iosApp"));
    dirs.push(Path::new("gradle").join("wrapper"));
    dirs
}

/// Create the skeleton under `root`. Returns the directories that did not exist before.
pub fn create_layout(root: &Path) -> Result<Vec<PathBuf>, ScaffoldError> {
    let mut created = Vec::new();
    for relative in skeleton_dirs() {
        let path = root.join(&relative);
        if path.is_dir() {
            continue;
        }
        std::fs::create_dir_all(&path).map_err(|e| ScaffoldError::fs(&path, e))?;
        created.push(relative);
    }
    Ok(created)
}
