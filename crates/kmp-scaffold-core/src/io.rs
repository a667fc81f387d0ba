//! Filesystem helpers

use crate::error::ScaffoldError;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
///
/// The tempfile is removed on drop if anything fails before the rename, so a
/// crash never leaves a half-written document behind. A replaced file keeps
/// its permissions; a new one gets the usual `0644`.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<(), ScaffoldError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| ScaffoldError::fs(dir, e))?;

    let existing = match std::fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(ScaffoldError::fs(path, e)),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ScaffoldError::fs(dir, e))?;
    tmp.write_all(data).map_err(|e| ScaffoldError::fs(path, e))?;
    if let Some(permissions) = existing.or_else(new_file_permissions) {
        tmp.as_file()
            .set_permissions(permissions)
            .map_err(|e| ScaffoldError::fs(path, e))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| ScaffoldError::fs(path, e))?;
    tmp.persist(path)
        .map_err(|e| ScaffoldError::fs(path, e.error))?;
    Ok(())
}

/// Mode for files that did not exist before; tempfiles start out `0600`
#[cfg(unix)]
fn new_file_permissions() -> Option<std::fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<std::fs::Permissions> {
    None
}

/// Read a file, or `None` when it does not exist
pub fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, ScaffoldError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ScaffoldError::fs(path, e)),
    }
}

/// Write a file only if it does not already exist. Returns true if written.
pub fn write_if_missing(path: &Path, data: &[u8]) -> Result<bool, ScaffoldError> {
    if path.exists() {
        return Ok(false);
    }
    atomic_write(path, data)?;
    Ok(true)
}

/// Mark a file executable (`chmod 755`); a no-op off Unix
pub fn set_executable(path: &Path) -> Result<(), ScaffoldError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| ScaffoldError::fs(path, e))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_write_creates_parents_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gradle/libs.versions.toml");

        atomic_write(&path, b"[versions]\n").unwrap();
        atomic_write(&path, b"[plugins]\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[plugins]\n");
        // no tempfiles left behind
        let entries = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_atomic_write_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let mode = |path: &Path| std::fs::metadata(path).unwrap().permissions().mode() & 0o777;

        let properties = dir.path().join("gradle.properties");
        std::fs::write(&properties, "a=1\n").unwrap();
        std::fs::set_permissions(&properties, std::fs::Permissions::from_mode(0o644)).unwrap();
        atomic_write(&properties, b"a=1\nb=2\n").unwrap();
        assert_eq!(mode(&properties), 0o644);

        let gradlew = dir.path().join("gradlew");
        std::fs::write(&gradlew, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&gradlew, std::fs::Permissions::from_mode(0o755)).unwrap();
        atomic_write(&gradlew, b"#!/bin/sh\nexit 0\n").unwrap();
        assert_eq!(mode(&gradlew), 0o755);

        let fresh = dir.path().join("settings.gradle.kts");
        atomic_write(&fresh, b"include(\":shared\")\n").unwrap();
        assert_eq!(mode(&fresh), 0o644);
    }

    #[test]
    fn test_read_optional_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_optional(&dir.path().join("nope")).unwrap().is_none());
    }

    #[test]
    fn test_write_if_missing_keeps_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gradlew");
        assert!(write_if_missing(&path, b"first").unwrap());
        assert!(!write_if_missing(&path, b"second").unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), b"first");
    }

    #[cfg(unix)]
    #[test]
    fn test_set_executable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gradlew");
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        set_executable(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
