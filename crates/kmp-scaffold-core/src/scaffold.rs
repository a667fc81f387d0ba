//! The scaffolding pipeline
//!
//! Steps run in a fixed order because later documents reference aliases that
//! earlier ones declare: layout, relocation, version catalog, settings, root
//! build script, gradle.properties, module build scripts, wrapper. Every path
//! is derived from the explicit project root; the working directory is never
//! changed.

use crate::config::{ScaffoldConfig, Versions};
use crate::error::ScaffoldError;
use crate::gradle::{self, WrapperReport};
use crate::io::{atomic_write, read_optional};
use crate::merge::{merge, merge_bytes, tables, DocumentKind, Fact};
use crate::project::{create_layout, relocate, MoveReport, PackageName, ProjectType};
use crate::templates::{RenderContext, TemplateStore};
use anyhow::Result;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{info, warn};

/// Quoted project path inside an `include` statement (`":app"`, `':feature:login'`)
static INCLUDED_PROJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']:([A-Za-z0-9_.\-:]+)["']"#).expect("include pattern"));

/// Everything decided before the project is touched
#[derive(Debug, Clone)]
pub struct ScaffoldPlan {
    pub root: PathBuf,
    pub package: PackageName,
    pub project_type: ProjectType,
    pub project_name: String,
    /// Move `app/` (Android) or top-level iOS files into the new layout
    pub relocate: bool,
    pub install_wrapper: bool,
}

impl ScaffoldPlan {
    pub fn new(root: PathBuf, package: PackageName, project_type: ProjectType) -> Self {
        let project_name = default_project_name(&root, &package);
        Self {
            root,
            package,
            project_type,
            project_name,
            relocate: project_type != ProjectType::Fresh,
            install_wrapper: true,
        }
    }

    /// Placeholders available to every template
    pub fn render_context(&self, versions: &Versions) -> RenderContext {
        RenderContext::new()
            .with("package", self.package.as_str())
            .with(
                "package_path",
                self.package.to_path().to_string_lossy().replace('\\', "/"),
            )
            .with("project_name", self.project_name.as_str())
            .extend(versions.placeholders())
    }
}

/// The root directory's name, falling back to the package's last segment
fn default_project_name(root: &Path, package: &PackageName) -> String {
    root.canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(root)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty() && name != ".")
        .unwrap_or_else(|| package.last_segment().to_string())
}

/// A Gradle file the pipeline creates or merges into
#[derive(Debug, Clone)]
pub struct ManagedDocument {
    /// Path relative to the project root
    pub path: PathBuf,
    pub kind: DocumentKind,
    /// Template rendered when the file does not exist yet
    pub template: &'static str,
    pub facts: Vec<Fact>,
}

/// Managed documents in processing order
pub fn managed_documents(root: &Path, versions: &Versions) -> Vec<ManagedDocument> {
    vec![
        ManagedDocument {
            path: PathBuf::from("gradle/libs.versions.toml"),
            kind: DocumentKind::VersionCatalog,
            template: "gradle/libs.versions.toml",
            facts: tables::version_catalog(versions),
        },
        ManagedDocument {
            path: gradle_script(root, "settings.gradle"),
            kind: DocumentKind::SettingsScript,
            template: "settings.gradle.kts",
            facts: tables::settings_script(),
        },
        ManagedDocument {
            path: gradle_script(root, "build.gradle"),
            kind: DocumentKind::BuildScript,
            template: "build.gradle.kts",
            facts: tables::root_build_script(),
        },
        ManagedDocument {
            path: PathBuf::from("gradle.properties"),
            kind: DocumentKind::Properties,
            template: "gradle.properties",
            facts: tables::gradle_properties(),
        },
        ManagedDocument {
            path: gradle_script(root, "shared/build.gradle"),
            kind: DocumentKind::BuildScript,
            template: "shared/build.gradle.kts",
            facts: tables::shared_build_script(),
        },
        ManagedDocument {
            path: gradle_script(root, "androidApp/build.gradle"),
            kind: DocumentKind::BuildScript,
            template: "androidApp/build.gradle.kts",
            facts: tables::android_app_build_script(),
        },
    ]
}

/// The Kotlin DSL script, unless only a Groovy one exists
fn gradle_script(root: &Path, stem: &str) -> PathBuf {
    let kts = PathBuf::from(format!("{}.kts", stem));
    let groovy = PathBuf::from(stem);
    if !root.join(&kts).exists() && root.join(&groovy).is_file() {
        groovy
    } else {
        kts
    }
}

/// Every template a run needs
pub fn required_templates(install_wrapper: bool) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = managed_documents(Path::new(""), &Versions::default())
        .into_iter()
        .map(|doc| doc.template)
        .collect();
    if install_wrapper {
        names.extend(gradle::wrapper::LAUNCHERS);
    }
    names
}

/// What happened to one managed document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentStatus {
    Created,
    /// Keys of the facts that were inserted
    Updated(Vec<String>),
    Unchanged,
}

/// Summary of a full run
#[derive(Debug, Default)]
pub struct ScaffoldReport {
    pub created_dirs: Vec<PathBuf>,
    pub moves: MoveReport,
    pub documents: Vec<(PathBuf, DocumentStatus)>,
    /// Included projects whose directory no longer exists
    pub stale_includes: Vec<String>,
    pub wrapper: Option<WrapperReport>,
}

/// Fail before touching the project if any template is missing
pub fn preflight(plan: &ScaffoldPlan, store: &TemplateStore) -> Result<(), ScaffoldError> {
    match store.missing(&required_templates(plan.install_wrapper)).into_iter().next() {
        Some(name) => Err(ScaffoldError::MissingTemplate {
            name,
            dir: store.dir().to_path_buf(),
        }),
        None => Ok(()),
    }
}

/// Create the skeleton plus the package directory in `commonMain`
pub fn create_directories(plan: &ScaffoldPlan) -> Result<Vec<PathBuf>, ScaffoldError> {
    let mut created = create_layout(&plan.root)?;

    let package_dir = Path::new("shared/src/commonMain/kotlin").join(plan.package.to_path());
    let full = plan.root.join(&package_dir);
    if !full.is_dir() {
        std::fs::create_dir_all(&full).map_err(|e| ScaffoldError::fs(&full, e))?;
        created.push(package_dir);
    }

    Ok(created)
}

/// Move existing sources if the plan asks for it
pub fn relocate_sources(plan: &ScaffoldPlan) -> Result<MoveReport, ScaffoldError> {
    if !plan.relocate {
        return Ok(MoveReport::default());
    }
    relocate(&plan.root, plan.project_type)
}

/// Create or merge one document.
///
/// A missing file is rendered from its template, then merged so the facts are
/// guaranteed even if the template lacks some. An existing file is merged in
/// place and only rewritten when something was inserted.
pub fn apply_document(
    root: &Path,
    doc: &ManagedDocument,
    store: &TemplateStore,
    ctx: &RenderContext,
) -> Result<DocumentStatus> {
    let path = root.join(&doc.path);
    let malformed = |source| ScaffoldError::MalformedDocument {
        path: doc.path.clone(),
        source,
    };

    match read_optional(&path)? {
        Some(bytes) => {
            let outcome = merge_bytes(&bytes, doc.kind, &doc.facts).map_err(malformed)?;
            if !outcome.changed() {
                return Ok(DocumentStatus::Unchanged);
            }
            atomic_write(&path, outcome.text.as_bytes())?;
            info!(path = %doc.path.display(), inserted = ?outcome.inserted, "merged");
            Ok(DocumentStatus::Updated(outcome.inserted))
        }
        None => {
            let rendered = store.render(doc.template, ctx)?;
            let outcome = merge(&rendered, doc.kind, &doc.facts).map_err(malformed)?;
            atomic_write(&path, outcome.text.as_bytes())?;
            info!(path = %doc.path.display(), "created from template");
            Ok(DocumentStatus::Created)
        }
    }
}

/// Create or merge every managed document, in order.
///
/// Stops at the first failure; documents already written stay written, which
/// is safe because a rerun skips everything already present.
pub fn apply_documents(
    plan: &ScaffoldPlan,
    config: &ScaffoldConfig,
    store: &TemplateStore,
) -> Result<Vec<(PathBuf, DocumentStatus)>> {
    let ctx = plan.render_context(&config.versions);
    managed_documents(&plan.root, &config.versions)
        .iter()
        .map(|doc| -> Result<(PathBuf, DocumentStatus)> {
            Ok((doc.path.clone(), apply_document(&plan.root, doc, store, &ctx)?))
        })
        .collect()
}

/// Run the whole pipeline without any prompting
pub async fn scaffold(
    plan: &ScaffoldPlan,
    config: &ScaffoldConfig,
    store: &TemplateStore,
) -> Result<ScaffoldReport> {
    preflight(plan, store)?;

    let created_dirs = create_directories(plan)?;
    let moves = relocate_sources(plan)?;
    let documents = apply_documents(plan, config, store)?;
    let stale_includes = stale_includes(&plan.root)?;
    for project in &stale_includes {
        warn!(project = %project, "settings include points at a missing directory");
    }

    let wrapper = if plan.install_wrapper {
        let client = http_client();
        Some(gradle::materialize(&plan.root, config, store, &client).await?)
    } else {
        None
    };

    Ok(ScaffoldReport {
        created_dirs,
        moves,
        documents,
        stale_includes,
        wrapper,
    })
}

/// Projects the settings script includes but whose directory is gone,
/// typically `:app` once its sources moved into `androidApp/`
pub fn stale_includes(root: &Path) -> Result<Vec<String>, ScaffoldError> {
    let settings = root.join(gradle_script(root, "settings.gradle"));
    let Some(bytes) = read_optional(&settings)? else {
        return Ok(Vec::new());
    };
    let text = String::from_utf8_lossy(&bytes);

    let mut stale = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        if !trimmed.starts_with("include") || trimmed.starts_with("includeBuild") {
            continue;
        }
        for caps in INCLUDED_PROJECT.captures_iter(trimmed) {
            let project = &caps[1];
            if !root.join(project.replace(':', "/")).is_dir() {
                stale.push(format!(":{}", project));
            }
        }
    }
    Ok(stale)
}

/// HTTP client used for downloads
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("kmp-init/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// State of one managed document, without writing anything
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// The file does not exist and would be created from its template
    Absent,
    /// The file exists but lacks these facts
    Pending(Vec<String>),
    UpToDate,
}

/// Report which documents under `root` a run would create or change
pub fn check(root: &Path, versions: &Versions) -> Result<Vec<(PathBuf, CheckStatus)>> {
    managed_documents(root, versions)
        .into_iter()
        .map(|doc| -> Result<(PathBuf, CheckStatus)> {
            let status = match read_optional(&root.join(&doc.path))? {
                None => CheckStatus::Absent,
                Some(bytes) => {
                    let outcome = merge_bytes(&bytes, doc.kind, &doc.facts).map_err(|source| {
                        ScaffoldError::MalformedDocument {
                            path: doc.path.clone(),
                            source,
                        }
                    })?;
                    if outcome.changed() {
                        CheckStatus::Pending(outcome.inserted)
                    } else {
                        CheckStatus::UpToDate
                    }
                }
            };
            Ok((doc.path, status))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TEMPLATES: &[(&str, &str)] = &[
        ("gradle/libs.versions.toml", "[versions]\nkotlin = \"{{versions.kotlin}}\"\n"),
        (
            "settings.gradle.kts",
            "rootProject.name = \"{{project_name}}\"\n",
        ),
        ("build.gradle.kts", "plugins {\n}\n"),
        ("gradle.properties", "kotlin.code.style=official\n"),
        (
            "shared/build.gradle.kts",
            "plugins {\n}\n\nandroid {\n    namespace = \"{{package}}.shared\"\n}\n",
        ),
        (
            "androidApp/build.gradle.kts",
            "plugins {\n}\n\nandroid {\n    namespace = \"{{package}}\"\n}\n",
        ),
        ("gradlew", "#!/bin/sh\n"),
        ("gradlew.bat", "@echo off\r\n"),
    ];

    fn template_store() -> (tempfile::TempDir, TemplateStore) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("template.yaml"), "name: KMP\nversion: 0.1.0\n").unwrap();
        for (name, content) in TEMPLATES {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let store = TemplateStore::open(dir.path()).unwrap();
        (dir, store)
    }

    fn plan_for(root: &Path, project_type: ProjectType) -> ScaffoldPlan {
        let mut plan = ScaffoldPlan::new(
            root.to_path_buf(),
            PackageName::parse("com.example.app").unwrap(),
            project_type,
        );
        plan.install_wrapper = false;
        plan.project_name = "Demo".to_string();
        plan
    }

    fn snapshot(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
        let mut files: Vec<_> = walkdir::WalkDir::new(root)
            .into_iter()
            .flatten()
            .filter(|e| e.file_type().is_file())
            .map(|e| (e.path().to_path_buf(), fs::read(e.path()).unwrap()))
            .collect();
        files.sort();
        files
    }

    #[tokio::test]
    async fn test_fresh_project_then_rerun_is_noop() {
        let (_templates, store) = template_store();
        let project = tempfile::tempdir().unwrap();
        let plan = plan_for(project.path(), ProjectType::Fresh);
        let config = ScaffoldConfig::new(store.dir().to_path_buf(), Versions::default()).unwrap();

        let report = scaffold(&plan, &config, &store).await.unwrap();
        assert!(report
            .documents
            .iter()
            .all(|(_, status)| *status == DocumentStatus::Created));
        assert!(project
            .path()
            .join("shared/src/commonMain/kotlin/com/example/app")
            .is_dir());

        let settings = fs::read_to_string(project.path().join("settings.gradle.kts")).unwrap();
        assert!(settings.starts_with("enableFeaturePreview(\"TYPESAFE_PROJECT_ACCESSORS\")\n"));
        assert!(settings.contains("rootProject.name = \"Demo\""));
        assert!(settings.contains("include(\":shared\")"));

        let android = fs::read_to_string(project.path().join("androidApp/build.gradle.kts")).unwrap();
        assert!(android.contains("namespace = \"com.example.app\""));
        assert!(android.contains("implementation(project(\":shared\"))"));

        let before = snapshot(project.path());
        let again = scaffold(&plan, &config, &store).await.unwrap();
        assert!(again
            .documents
            .iter()
            .all(|(_, status)| *status == DocumentStatus::Unchanged));
        assert!(again.created_dirs.is_empty());
        assert!(again.stale_includes.is_empty());
        assert_eq!(snapshot(project.path()), before);
    }

    #[tokio::test]
    async fn test_android_project_is_merged_not_replaced() {
        let (_templates, store) = template_store();
        let project = tempfile::tempdir().unwrap();
        let root = project.path();
        fs::write(
            root.join("settings.gradle.kts"),
            "rootProject.name = \"Legacy\"\ninclude(\":app\")\n",
        )
        .unwrap();
        fs::create_dir_all(root.join("app")).unwrap();
        fs::write(
            root.join("app/build.gradle.kts"),
            "plugins {\n    id(\"com.android.application\")\n    id(\"org.jetbrains.kotlin.android\")\n}\n",
        )
        .unwrap();

        let plan = plan_for(root, ProjectType::Android);
        let config = ScaffoldConfig::new(store.dir().to_path_buf(), Versions::default()).unwrap();
        let report = scaffold(&plan, &config, &store).await.unwrap();

        assert_eq!(report.moves.moved.len(), 1);
        assert!(!root.join("app").exists());
        assert_eq!(report.stale_includes, vec![":app".to_string()]);
        let statuses: std::collections::HashMap<_, _> = report.documents.into_iter().collect();
        assert!(matches!(
            statuses[Path::new("settings.gradle.kts")],
            DocumentStatus::Updated(_)
        ));
        assert_eq!(
            statuses[Path::new("androidApp/build.gradle.kts")],
            DocumentStatus::Updated(vec!["shared-dependency".to_string()])
        );

        let settings = fs::read_to_string(root.join("settings.gradle.kts")).unwrap();
        assert!(settings.contains("rootProject.name = \"Legacy\"\ninclude(\":app\")\n"));
    }

    #[tokio::test]
    async fn test_malformed_document_reports_path() {
        let (_templates, store) = template_store();
        let project = tempfile::tempdir().unwrap();
        fs::create_dir_all(project.path().join("gradle")).unwrap();
        fs::write(
            project.path().join("gradle/libs.versions.toml"),
            "[plugins]\n[plugins]\n",
        )
        .unwrap();

        let plan = plan_for(project.path(), ProjectType::Fresh);
        let config = ScaffoldConfig::new(store.dir().to_path_buf(), Versions::default()).unwrap();
        let err = scaffold(&plan, &config, &store).await.unwrap_err();

        match err.downcast_ref::<ScaffoldError>() {
            Some(ScaffoldError::MalformedDocument { path, .. }) => {
                assert_eq!(path, Path::new("gradle/libs.versions.toml"))
            }
            other => panic!("unexpected error: {:?}", other),
        }
        // nothing after the catalog was written
        assert!(!project.path().join("settings.gradle.kts").exists());
    }

    #[test]
    fn test_shipped_templates_already_hold_every_fact() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates/kmp");
        let store = TemplateStore::open(&dir).unwrap();
        assert!(store.missing(&required_templates(true)).is_empty());

        let versions = store.manifest().versions.clone();
        let plan = plan_for(Path::new("/unused"), ProjectType::Fresh);
        let ctx = plan.render_context(&versions);
        for doc in managed_documents(Path::new("/unused"), &versions) {
            let rendered = store.render(doc.template, &ctx).unwrap();
            let outcome = merge(&rendered, doc.kind, &doc.facts).unwrap();
            assert!(outcome.inserted.is_empty(), "{}: {:?}", doc.template, outcome.inserted);
        }
    }

    #[test]
    fn test_preflight_reports_missing_template() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("template.yaml"), "name: KMP\nversion: 0.1.0\n").unwrap();
        let store = TemplateStore::open(dir.path()).unwrap();
        let plan = plan_for(Path::new("/unused"), ProjectType::Fresh);
        assert!(matches!(
            preflight(&plan, &store),
            Err(ScaffoldError::MissingTemplate { .. })
        ));
    }

    #[test]
    fn test_stale_includes_ignore_existing_projects() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("shared")).unwrap();
        fs::create_dir_all(dir.path().join("feature/login")).unwrap();
        fs::write(
            dir.path().join("settings.gradle"),
            "includeBuild(':build-logic')\ninclude ':app', ':shared'\ninclude(\":feature:login\")\n",
        )
        .unwrap();
        assert_eq!(stale_includes(dir.path()).unwrap(), vec![":app".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_merged_document_keeps_mode() {
        use std::os::unix::fs::PermissionsExt;
        let (_templates, store) = template_store();
        let project = tempfile::tempdir().unwrap();
        let path = project.path().join("gradle.properties");
        fs::write(&path, "kotlin.code.style=official\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let doc = managed_documents(project.path(), &Versions::default())
            .into_iter()
            .find(|doc| doc.path == Path::new("gradle.properties"))
            .unwrap();
        let status = apply_document(project.path(), &doc, &store, &RenderContext::new()).unwrap();

        assert!(matches!(status, DocumentStatus::Updated(_)));
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o644);
    }

    #[test]
    fn test_groovy_scripts_preferred_when_only_they_exist() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("settings.gradle"), "include ':app'\n").unwrap();
        let docs = managed_documents(dir.path(), &Versions::default());
        assert_eq!(docs[1].path, PathBuf::from("settings.gradle"));
        assert_eq!(docs[2].path, PathBuf::from("build.gradle.kts"));
    }

    #[test]
    fn test_check_reports_pending_facts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("gradle.properties"),
            "kotlin.code.style=official\nandroid.useAndroidX=true\n",
        )
        .unwrap();

        let results = check(dir.path(), &Versions::default()).unwrap();
        let props = results
            .iter()
            .find(|(path, _)| path == Path::new("gradle.properties"))
            .unwrap();
        assert_eq!(
            props.1,
            CheckStatus::Pending(vec![
                "android.nonTransitiveRClass".to_string(),
                "org.gradle.jvmargs".to_string()
            ])
        );
        assert!(results
            .iter()
            .any(|(path, status)| path == Path::new("settings.gradle.kts")
                && *status == CheckStatus::Absent));
        // check never writes
        assert!(!dir.path().join("settings.gradle.kts").exists());
    }
}
