//! Kotlin/Android package name validation

use crate::error::ScaffoldError;
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

static PACKAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9_]*(\.[a-z0-9_]+)+$").expect("package name regex")
});

/// A validated package name such as `com.example.app`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageName(String);

impl PackageName {
    /// Lowercase start, lowercase/digit/underscore segments, at least two segments
    pub fn parse(input: &str) -> Result<Self, ScaffoldError> {
        let trimmed = input.trim();
        if PACKAGE_NAME.is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(ScaffoldError::InputValidation(format!(
                "'{}' is not a valid package name (expected e.g. com.example.app)",
                trimmed
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Source directory path for the package (`com.example.app` -> `com/example/app`)
    pub fn to_path(&self) -> PathBuf {
        self.0.split('.').collect()
    }

    /// Last segment, used as the default project name
    pub fn last_segment(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_package_names() {
        for name in ["com.example.app", "io.kmp_demo", "org.a1.b2.c3"] {
            assert!(PackageName::parse(name).is_ok(), "rejected {}", name);
        }
    }

    #[test]
    fn test_invalid_package_names() {
        for name in ["Com.example", "example", "com..app", "1com.example", "com.Example", "", "com.example."] {
            let err = PackageName::parse(name).unwrap_err();
            assert!(matches!(err, ScaffoldError::InputValidation(_)), "accepted {}", name);
        }
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        assert_eq!(
            PackageName::parse("  com.example.app\n").unwrap().as_str(),
            "com.example.app"
        );
    }

    #[test]
    fn test_to_path_and_last_segment() {
        let package = PackageName::parse("com.example.app").unwrap();
        assert_eq!(package.to_path(), PathBuf::from("com/example/app"));
        assert_eq!(package.last_segment(), "app");
    }
}
