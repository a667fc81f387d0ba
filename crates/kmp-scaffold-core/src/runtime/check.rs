//! JDK detection for running the generated Gradle build

use std::process::Command;

/// Oldest JDK the Android Gradle plugin 8.x runs on
pub const MIN_JDK_MAJOR: u32 = 17;

/// Where to point users without a suitable JDK
pub const JDK_DOCS_URL: &str = "https://adoptium.net/temurin/releases/";

/// Runtime detection result
#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    pub name: &'static str,
    pub version: Option<String>,
    pub available: bool,
}

/// Check if a JDK is available (`java -version`, which reports on stderr)
pub fn check_java() -> RuntimeInfo {
    let output = Command::new("java").arg("-version").output();

    match output {
        Ok(out) if out.status.success() => {
            let stderr = String::from_utf8_lossy(&out.stderr);
            let stdout = String::from_utf8_lossy(&out.stdout);
            RuntimeInfo {
                name: "JDK",
                version: parse_java_version(&stderr).or_else(|| parse_java_version(&stdout)),
                available: true,
            }
        }
        _ => RuntimeInfo {
            name: "JDK",
            version: None,
            available: false,
        },
    }
}

/// Version string from `java -version` output (`openjdk version "17.0.2" ...` -> `17.0.2`)
pub fn parse_java_version(output: &str) -> Option<String> {
    let first = output.lines().next()?;
    let start = first.find('"')? + 1;
    let len = first[start..].find('"')?;
    Some(first[start..start + len].to_string())
}

/// Major release of a Java version string (`1.8.0_292` -> 8, `17.0.2` -> 17)
pub fn java_major(version: &str) -> Option<u32> {
    let mut parts = version.split(['.', '_', '-', '+']);
    let first: u32 = parts.next()?.parse().ok()?;
    if first == 1 {
        parts.next()?.parse().ok()
    } else {
        Some(first)
    }
}

/// Warning to show when the JDK is missing or too old; `None` when it is fine
pub fn jdk_advisory(info: &RuntimeInfo) -> Option<String> {
    if !info.available {
        return Some(format!(
            "No JDK found on PATH. Gradle needs JDK {} or newer to build this project.",
            MIN_JDK_MAJOR
        ));
    }

    let version = info.version.as_deref()?;
    match java_major(version) {
        Some(major) if major < MIN_JDK_MAJOR => Some(format!(
            "JDK {} found; the Android Gradle plugin needs JDK {} or newer.",
            version, MIN_JDK_MAJOR
        )),
        _ => None,
    }
}
