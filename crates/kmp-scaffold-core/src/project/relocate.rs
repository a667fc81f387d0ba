//! Moving existing application sources into the KMP layout

use super::detect::ProjectType;
use super::layout::SCAFFOLD_DIRS;
use crate::error::ScaffoldError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Top-level Gradle files that stay at the root of an iOS project
const ROOT_GRADLE_FILES: &[&str] = &[
    "build.gradle",
    "build.gradle.kts",
    "settings.gradle",
    "settings.gradle.kts",
    "gradle.properties",
    "local.properties",
    "gradlew",
    "gradlew.bat",
];

/// A single planned `from -> to` move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Outcome of a relocation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MoveReport {
    pub moved: Vec<Move>,
    /// Entries left in place because the destination already existed
    pub skipped: Vec<Move>,
}

/// Entries that would be moved for `project_type`, sorted by name
pub fn plan_moves(root: &Path, project_type: ProjectType) -> Result<Vec<Move>, ScaffoldError> {
    let (source, dest) = match project_type {
        ProjectType::Android => (root.join("app"), root.join("androidApp")),
        ProjectType::Ios => (root.to_path_buf(), root.join("iosApp")),
        ProjectType::Fresh => return Ok(Vec::new()),
    };

    if !source.is_dir() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(&source).map_err(|e| ScaffoldError::fs(&source, e))?;
    let mut names: Vec<_> = entries
        .map(|entry| entry.map(|e| e.file_name()))
        .collect::<Result<_, _>>()
        .map_err(|e| ScaffoldError::fs(&source, e))?;
    names.sort();

    Ok(names
        .into_iter()
        .filter(|name| project_type != ProjectType::Ios || should_move_ios_entry(name))
        .map(|name| Move {
            from: source.join(&name),
            to: dest.join(&name),
        })
        .collect())
}

fn should_move_ios_entry(name: &std::ffi::OsStr) -> bool {
    let lossy = name.to_string_lossy();
    let name: &str = &lossy;
    !name.starts_with('.') && !SCAFFOLD_DIRS.contains(&name) && !ROOT_GRADLE_FILES.contains(&name)
}

/// Move existing sources into `androidApp/` or `iosApp/`.
///
/// Never overwrites: an entry whose destination exists is skipped. An emptied
/// `app/` directory is removed.
pub fn relocate(root: &Path, project_type: ProjectType) -> Result<MoveReport, ScaffoldError> {
    let mut report = MoveReport::default();

    for mv in plan_moves(root, project_type)? {
        if mv.to.exists() {
            warn!(from = %mv.from.display(), to = %mv.to.display(), "destination exists, not moving");
            report.skipped.push(mv);
            continue;
        }
        if let Some(parent) = mv.to.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ScaffoldError::fs(parent, e))?;
        }
        std::fs::rename(&mv.from, &mv.to).map_err(|e| ScaffoldError::fs(&mv.from, e))?;
        debug!(from = %mv.from.display(), to = %mv.to.display(), "moved");
        report.moved.push(mv);
    }

    if project_type == ProjectType::Android {
        let app = root.join("app");
        let is_empty = std::fs::read_dir(&app)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if is_empty {
            std::fs::remove_dir(&app).map_err(|e| ScaffoldError::fs(&app, e))?;
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_android_app_moves_into_android_app() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("app/build.gradle.kts"));
        touch(&root.join("app/src/main/AndroidManifest.xml"));

        let report = relocate(root, ProjectType::Android).unwrap();

        assert_eq!(report.moved.len(), 2);
        assert!(root.join("androidApp/build.gradle.kts").is_file());
        assert!(root.join("androidApp/src/main/AndroidManifest.xml").is_file());
        assert!(!root.join("app").exists());
    }

    #[test]
    fn test_existing_destination_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("app/build.gradle.kts"));
        fs::create_dir_all(root.join("androidApp")).unwrap();
        fs::write(root.join("androidApp/build.gradle.kts"), "keep").unwrap();

        let report = relocate(root, ProjectType::Android).unwrap();

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(
            fs::read_to_string(root.join("androidApp/build.gradle.kts")).unwrap(),
            "keep"
        );
        assert!(root.join("app/build.gradle.kts").is_file());
    }

    #[test]
    fn test_ios_move_excludes_scaffold_and_gradle_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("Podfile"));
        touch(&root.join("Demo.xcodeproj/project.pbxproj"));
        touch(&root.join("Demo/AppDelegate.swift"));
        touch(&root.join(".gitignore"));
        touch(&root.join("settings.gradle.kts"));
        touch(&root.join("shared/src/commonMain/kotlin/.keep"));
        fs::create_dir_all(root.join("iosApp")).unwrap();

        let planned: Vec<String> = plan_moves(root, ProjectType::Ios)
            .unwrap()
            .into_iter()
            .map(|m| m.from.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(planned, vec!["Demo", "Demo.xcodeproj", "Podfile"]);

        relocate(root, ProjectType::Ios).unwrap();
        assert!(root.join("iosApp/Podfile").is_file());
        assert!(root.join("iosApp/Demo.xcodeproj/project.pbxproj").is_file());
        assert!(root.join(".gitignore").is_file());
        assert!(root.join("settings.gradle.kts").is_file());
    }

    #[test]
    fn test_fresh_project_moves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("notes.txt"));
        let report = relocate(dir.path(), ProjectType::Fresh).unwrap();
        assert_eq!(report, MoveReport::default());
    }
}
