//! Required declarations for each generated Gradle file
//!
//! Order matters within a table: a fact may anchor on a line inserted by an
//! earlier one. Across tables, build scripts reference catalog aliases, so the
//! catalog must be merged first.

use super::fact::{Anchor, Fact, Matcher};
use crate::config::Versions;
use regex::Regex;
use std::sync::LazyLock;

/// Settings line that every other settings fact is placed after
const FEATURE_PREVIEW: &str = r#"enableFeaturePreview("TYPESAFE_PROJECT_ACCESSORS")"#;

fn pattern(src: &str) -> Regex {
    Regex::new(src).expect("fact table pattern")
}

static FEATURE_PREVIEW_LINE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^\s*enableFeaturePreview\s*\("));

/// A catalog plugin: catalog key, plugin id, version reference
struct CatalogPlugin {
    key: &'static str,
    id: &'static str,
    version_ref: &'static str,
    kotlin_shorthand: Option<&'static str>,
}

const KOTLIN_MULTIPLATFORM: CatalogPlugin = CatalogPlugin {
    key: "kotlin-multiplatform",
    id: "org.jetbrains.kotlin.multiplatform",
    version_ref: "kotlin",
    kotlin_shorthand: Some("multiplatform"),
};

const KOTLIN_ANDROID: CatalogPlugin = CatalogPlugin {
    key: "kotlin-android",
    id: "org.jetbrains.kotlin.android",
    version_ref: "kotlin",
    kotlin_shorthand: Some("android"),
};

const ANDROID_APPLICATION: CatalogPlugin = CatalogPlugin {
    key: "android-application",
    id: "com.android.application",
    version_ref: "agp",
    kotlin_shorthand: None,
};

const ANDROID_LIBRARY: CatalogPlugin = CatalogPlugin {
    key: "android-library",
    id: "com.android.library",
    version_ref: "agp",
    kotlin_shorthand: None,
};

const ALL_PLUGINS: [&CatalogPlugin; 4] = [
    &KOTLIN_MULTIPLATFORM,
    &KOTLIN_ANDROID,
    &ANDROID_APPLICATION,
    &ANDROID_LIBRARY,
];

impl CatalogPlugin {
    fn catalog_fact(&self) -> Fact {
        Fact::catalog_entry(
            "plugins",
            self.key,
            &format!(
                "{{ id = \"{}\", version.ref = \"{}\" }}",
                self.id, self.version_ref
            ),
        )
    }

    fn script_fact(&self, suffix: &str) -> Fact {
        let fact = Fact::plugin_alias(self.key, self.id, suffix);
        match self.kotlin_shorthand {
            Some(name) => fact.with_aliases([
                format!("kotlin(\"{}\")", name),
                format!("org.jetbrains.kotlin.{}", name),
            ]),
            None => fact,
        }
    }
}

/// `gradle/libs.versions.toml`
pub fn version_catalog(versions: &Versions) -> Vec<Fact> {
    let quoted = |v: &str| format!("\"{}\"", v);

    let mut facts = vec![
        Fact::catalog_entry("versions", "kotlin", &quoted(&versions.kotlin)),
        Fact::catalog_entry("versions", "agp", &quoted(&versions.agp)),
        Fact::catalog_entry(
            "versions",
            "android-compileSdk",
            &quoted(&versions.android_compile_sdk),
        ),
        Fact::catalog_entry(
            "versions",
            "android-minSdk",
            &quoted(&versions.android_min_sdk),
        ),
        Fact::catalog_entry(
            "versions",
            "android-targetSdk",
            &quoted(&versions.android_target_sdk),
        ),
        Fact::catalog_entry(
            "libraries",
            "kotlin-test",
            "{ module = \"org.jetbrains.kotlin:kotlin-test\", version.ref = \"kotlin\" }",
        ),
    ];
    facts.extend(ALL_PLUGINS.iter().map(|p| p.catalog_fact()));
    facts
}

/// `settings.gradle.kts`
pub fn settings_script() -> Vec<Fact> {
    vec![
        Fact::new(
            "feature-preview",
            Anchor::Top,
            Matcher::Pattern(FEATURE_PREVIEW_LINE.clone()),
            [FEATURE_PREVIEW],
        ),
        Fact::new(
            "plugin-management",
            Anchor::AfterLine(FEATURE_PREVIEW_LINE.clone()),
            Matcher::Pattern(pattern(r"^pluginManagement\s*\{")),
            [
                "",
                "pluginManagement {",
                "    repositories {",
                "        google()",
                "        gradlePluginPortal()",
                "        mavenCentral()",
                "    }",
                "}",
            ],
        ),
        Fact::new(
            "dependency-resolution",
            Anchor::End,
            Matcher::Pattern(pattern(r"^dependencyResolutionManagement\s*\{")),
            [
                "",
                "dependencyResolutionManagement {",
                "    repositories {",
                "        google()",
                "        mavenCentral()",
                "    }",
                "}",
            ],
        ),
        include_module("androidApp"),
        include_module("shared"),
    ]
}

fn include_module(module: &str) -> Fact {
    Fact::new(
        format!("include-{}", module),
        Anchor::End,
        Matcher::Pattern(pattern(&format!(
            r#"^\s*include\s*\(?[^)]*["']:{}["']"#,
            regex::escape(module)
        ))),
        [format!("include(\":{}\")", module)],
    )
}

/// Root `build.gradle.kts`: every plugin declared once, applied nowhere
pub fn root_build_script() -> Vec<Fact> {
    ALL_PLUGINS
        .iter()
        .map(|p| p.script_fact(" apply false"))
        .collect()
}

/// `shared/build.gradle.kts`
pub fn shared_build_script() -> Vec<Fact> {
    vec![
        KOTLIN_MULTIPLATFORM.script_fact(""),
        ANDROID_LIBRARY.script_fact(""),
    ]
}

/// `androidApp/build.gradle(.kts)`
pub fn android_app_build_script() -> Vec<Fact> {
    vec![
        ANDROID_APPLICATION.script_fact(""),
        KOTLIN_ANDROID.script_fact(""),
        Fact::new(
            "shared-dependency",
            Anchor::block("dependencies"),
            Matcher::Pattern(pattern(r#"project\s*\(\s*["']:shared["']\s*\)"#)),
            ["    implementation(project(\":shared\"))"],
        ),
    ]
}

/// `gradle.properties`
pub fn gradle_properties() -> Vec<Fact> {
    vec![
        Fact::property("kotlin.code.style", "official"),
        Fact::property("android.useAndroidX", "true"),
        Fact::property("android.nonTransitiveRClass", "true"),
        Fact::property("org.gradle.jvmargs", "-Xmx2048M -Dfile.encoding=UTF-8"),
    ]
}
