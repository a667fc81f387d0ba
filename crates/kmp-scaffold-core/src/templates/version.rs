//! Version comparison for CLI and template compatibility

use semver::Version;

/// Compare CLI version against the version a template set was written for.
/// Returns a warning message if the CLI is older than the templates expect.
pub fn check_compatibility(
    cli_version: &str,
    template_version: &str,
    upgrade_command: &str,
) -> Option<String> {
    // Can't compare, skip warning
    let cli_ver = parse_version(cli_version)?;
    let template_ver = parse_version(template_version)?;

    if cli_ver < template_ver {
        Some(format!(
            "These templates were written for kmp-init {} or newer.\n\
             You are running version {}.\n\
             Consider updating: {}",
            template_version, cli_version, upgrade_command
        ))
    } else {
        None
    }
}

/// Parse a version string, tolerating a leading `v`
pub fn parse_version(version_str: &str) -> Option<Version> {
    let cleaned = version_str.trim();
    let cleaned = cleaned.strip_prefix('v').unwrap_or(cleaned);
    Version::parse(cleaned).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_older_than_templates() {
        let warning = check_compatibility("0.1.0", "0.2.0", "cargo install kmp-tools --force");
        assert!(warning.is_some());
        assert!(warning.unwrap().contains("0.2.0"));
    }

    #[test]
    fn test_cli_same_as_templates() {
        let warning = check_compatibility("0.1.0", "0.1.0", "cargo install kmp-tools --force");
        assert!(warning.is_none());
    }

    #[test]
    fn test_cli_newer_than_templates() {
        let warning = check_compatibility("0.2.0", "v0.1.0", "cargo install kmp-tools --force");
        assert!(warning.is_none());
    }

    #[test]
    fn test_invalid_versions() {
        let warning = check_compatibility("invalid", "0.1.0", "cargo install kmp-tools --force");
        assert!(warning.is_none());
    }

    #[test]
    fn test_leading_v_accepted() {
        assert_eq!(parse_version("v1.2.3"), Some(Version::new(1, 2, 3)));
    }
}
