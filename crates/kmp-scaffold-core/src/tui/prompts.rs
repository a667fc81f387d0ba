//! Charm-style CLI prompts using cliclack

use crate::config::{absolutize, resolve_template_dir, ScaffoldConfig};
use crate::error::ScaffoldError;
use crate::gradle;
use crate::project::{detect, plan_moves, validate_root, PackageName, ProjectType};
use crate::runtime::{check_java, jdk_advisory, JDK_DOCS_URL};
use crate::scaffold::{self, DocumentStatus, ScaffoldPlan};
use crate::templates::{version, TemplateStore};
use anyhow::{Context, Result};
use console::style;
use std::path::{Path, PathBuf};

/// Suggested when the user has no package in mind
const PACKAGE_PLACEHOLDER: &str = "com.example.app";

/// CLI arguments for the init command
#[derive(Debug, Clone, Default)]
pub struct CreateArgs {
    /// Existing project root (prompted when absent)
    pub directory: Option<PathBuf>,

    /// Base package for the shared module (prompted when absent)
    pub package: Option<String>,

    /// Local template directory overriding the default lookup
    pub template_dir: Option<PathBuf>,

    /// Relocate existing sources without asking (`Some(false)` never relocates)
    pub move_sources: Option<bool>,

    /// Do not install the Gradle wrapper
    pub skip_wrapper: bool,

    /// Auto-confirm all prompts (non-interactive mode)
    pub yes: bool,
}

/// Run the CLI with interactive prompts
pub async fn run(args: CreateArgs, cli_version: &str) -> Result<()> {
    cliclack::intro("KMP Scaffold")?;

    let cwd = std::env::current_dir().context("Failed to read the current directory")?;

    // Step 1: Open the template set before asking anything else
    let store = open_templates(&args, &cwd)?;

    if let Some(warning) = version::check_compatibility(
        cli_version,
        &store.manifest().version,
        "cargo install kmp-tools --force",
    ) {
        cliclack::log::warning(format!(
            "Version warning: {}",
            warning.lines().next().unwrap_or(&warning)
        ))?;
    }

    // Step 2: Project root and type
    let (root, project_type) = select_project(&args, &cwd)?;

    // Step 3: Package name
    let package = select_package(&args)?;

    // Step 4: Relocation of existing sources
    let relocate = confirm_relocation(&args, &root, project_type)?;

    // Step 5: JDK (advisory)
    check_jdk(&args)?;

    // Step 6: Scaffold
    let config = ScaffoldConfig::new(
        store.dir().to_path_buf(),
        store.manifest().versions.clone(),
    )?;
    let mut plan = ScaffoldPlan::new(root, package, project_type);
    plan.relocate = relocate;
    plan.install_wrapper = !args.skip_wrapper;

    create_project(&plan, &config, &store).await?;

    // Step 7: Show next steps
    print_next_steps(&plan, &cwd)?;

    Ok(())
}

fn open_templates(args: &CreateArgs, cwd: &Path) -> Result<TemplateStore> {
    let dir = resolve_template_dir(args.template_dir.as_deref(), cwd);
    let store = TemplateStore::open(&dir)?;
    cliclack::log::info(format!(
        "Using templates from {} ({})",
        dir.display(),
        store.manifest().name
    ))?;
    Ok(store)
}

fn select_project(args: &CreateArgs, cwd: &Path) -> Result<(PathBuf, ProjectType)> {
    // Use --directory flag if provided
    if let Some(dir) = &args.directory {
        let root = validate_root(&dir.to_string_lossy(), cwd)?;
        cliclack::log::info(format!("Using directory: {}", root.display()))?;
        let project_type = match detect(&root) {
            Some(detected) => detected,
            None if args.yes => ProjectType::Fresh,
            None => match choose_on_undetected(&root)? {
                Some(project_type) => project_type,
                None => return select_project_interactive(cwd),
            },
        };
        report_project_type(project_type)?;
        return Ok((root, project_type));
    }

    if args.yes {
        let root = validate_root(".", cwd)?;
        let project_type = detect(&root).unwrap_or(ProjectType::Fresh);
        report_project_type(project_type)?;
        return Ok((root, project_type));
    }

    select_project_interactive(cwd)
}

fn select_project_interactive(cwd: &Path) -> Result<(PathBuf, ProjectType)> {
    loop {
        let base = cwd.to_path_buf();
        let input: String = cliclack::input("Project root")
            .placeholder(".")
            .default_input(".")
            .validate(move |input: &String| {
                validate_root(input, &base).map(|_| ()).map_err(|e| e.to_string())
            })
            .interact()?;
        let root = validate_root(&input, cwd)?;

        if let Some(project_type) = detect(&root) {
            report_project_type(project_type)?;
            return Ok((root, project_type));
        }
        if let Some(project_type) = choose_on_undetected(&root)? {
            report_project_type(project_type)?;
            return Ok((root, project_type));
        }
    }
}

/// `None` means the user wants to pick another path
fn choose_on_undetected(root: &Path) -> Result<Option<ProjectType>> {
    cliclack::log::warning(format!(
        "No Android or iOS project found in {}",
        root.display()
    ))?;

    let action: &str = cliclack::select("What would you like to do?")
        .item("fresh", "Start from scratch here", "")
        .item("other", "Choose another path", "")
        .interact()?;

    Ok(match action {
        "fresh" => Some(ProjectType::Fresh),
        _ => None,
    })
}

fn report_project_type(project_type: ProjectType) -> Result<()> {
    cliclack::log::success(format!("Project type: {}", project_type.display_name()))?;
    Ok(())
}

fn select_package(args: &CreateArgs) -> Result<PackageName> {
    if let Some(raw) = &args.package {
        let package = PackageName::parse(raw)?;
        cliclack::log::info(format!("Using package: {}", package))?;
        return Ok(package);
    }

    if args.yes {
        return Err(ScaffoldError::InputValidation(
            "--package is required with --yes".to_string(),
        )
        .into());
    }

    let input: String = cliclack::input("Package name")
        .placeholder(PACKAGE_PLACEHOLDER)
        .validate(|input: &String| {
            PackageName::parse(input)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact()?;

    Ok(PackageName::parse(&input)?)
}

fn confirm_relocation(args: &CreateArgs, root: &Path, project_type: ProjectType) -> Result<bool> {
    let moves = plan_moves(root, project_type)?;
    if moves.is_empty() || args.move_sources == Some(false) {
        return Ok(false);
    }

    let destination = match project_type {
        ProjectType::Ios => "iosApp/",
        _ => "androidApp/",
    };

    // Auto-confirm with --yes flag
    if args.move_sources == Some(true) || args.yes {
        cliclack::log::info(format!(
            "Moving {} entries into {}",
            moves.len(),
            destination
        ))?;
        return Ok(true);
    }

    let confirm: bool = cliclack::confirm(format!(
        "Move {} existing entries into {}?",
        moves.len(),
        destination
    ))
    .initial_value(true)
    .interact()?;

    Ok(confirm)
}

fn check_jdk(args: &CreateArgs) -> Result<()> {
    let spinner = cliclack::spinner();
    spinner.start("Checking for a JDK...");

    let info = check_java();
    let Some(advisory) = jdk_advisory(&info) else {
        spinner.stop(format!(
            "{} ({})",
            info.name,
            info.version.as_deref().unwrap_or("unknown")
        ));
        return Ok(());
    };

    spinner.stop("JDK check finished");
    cliclack::log::warning(&advisory)?;

    // In non-interactive mode, just continue
    if args.yes {
        cliclack::log::info("Continuing without a suitable JDK (--yes mode)")?;
        return Ok(());
    }

    let action: &str = cliclack::select("What would you like to do?")
        .item("continue", "Continue anyway", "the project is still generated")
        .item("docs", format!("Open JDK downloads ({})", JDK_DOCS_URL), "")
        .item("cancel", "Cancel", "")
        .interact()?;

    match action {
        "docs" => {
            open::that(JDK_DOCS_URL)?;
            cliclack::log::info("Continuing. Install a JDK before running Gradle.")?;
        }
        "cancel" => anyhow::bail!("Setup cancelled."),
        _ => {}
    }

    Ok(())
}

async fn create_project(
    plan: &ScaffoldPlan,
    config: &ScaffoldConfig,
    store: &TemplateStore,
) -> Result<()> {
    scaffold::preflight(plan, store)?;

    let spinner = cliclack::spinner();
    spinner.start("Creating directories...");
    let created = scaffold::create_directories(plan)?;
    spinner.stop(format!("Created {} directories", created.len()));

    if plan.relocate {
        let spinner = cliclack::spinner();
        spinner.start("Moving existing sources...");
        let moves = scaffold::relocate_sources(plan)?;
        spinner.stop(format!("Moved {} entries", moves.moved.len()));
        for skipped in &moves.skipped {
            cliclack::log::warning(format!(
                "Kept {} in place: {} already exists",
                relative(&plan.root, &skipped.from),
                relative(&plan.root, &skipped.to)
            ))?;
        }
    }

    let spinner = cliclack::spinner();
    spinner.start("Updating Gradle files...");
    let documents = match scaffold::apply_documents(plan, config, store) {
        Ok(documents) => documents,
        Err(e) => {
            spinner.stop("Failed to update Gradle files");
            return Err(e);
        }
    };
    let changed = documents
        .iter()
        .filter(|(_, status)| *status != DocumentStatus::Unchanged)
        .count();
    spinner.stop(format!("Updated {} of {} Gradle files", changed, documents.len()));

    for (path, status) in &documents {
        let line = match status {
            DocumentStatus::Created => format!("{} created", path.display()),
            DocumentStatus::Updated(keys) => {
                format!("{} updated: {}", path.display(), keys.join(", "))
            }
            DocumentStatus::Unchanged => format!("{} already up to date", path.display()),
        };
        cliclack::log::remark(line)?;
    }

    for project in scaffold::stale_includes(&plan.root)? {
        cliclack::log::warning(format!(
            "settings includes {} but its directory no longer exists; remove that include",
            project
        ))?;
    }

    if plan.install_wrapper {
        let spinner = cliclack::spinner();
        spinner.start("Installing Gradle wrapper...");
        let client = scaffold::http_client();
        match gradle::materialize(&plan.root, config, store, &client).await {
            Ok(report) if report.written.is_empty() => {
                spinner.stop("Gradle wrapper already present")
            }
            Ok(report) => spinner.stop(format!(
                "Gradle wrapper installed ({} files)",
                report.written.len()
            )),
            Err(e) => {
                spinner.stop("Failed to install Gradle wrapper");
                return Err(e.into());
            }
        }
    } else {
        cliclack::log::info("Skipping Gradle wrapper")?;
    }

    Ok(())
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

fn print_next_steps(plan: &ScaffoldPlan, cwd: &Path) -> Result<()> {
    let mut steps = Vec::new();
    if absolutize(&plan.root, cwd).as_path() != cwd {
        steps.push(format!("cd {}", plan.root.display()));
    }
    steps.push("./gradlew :shared:build".to_string());
    match plan.project_type {
        ProjectType::Ios => {
            steps.push("Open iosApp in Xcode and link the shared framework".to_string())
        }
        _ => steps.push("./gradlew :androidApp:assembleDebug".to_string()),
    }
    steps.push(format!(
        "Add common code under shared/src/commonMain/kotlin/{}",
        plan.package.to_path().display()
    ));

    println!();
    println!("  {}", style("Next steps").bold());
    println!();

    for (i, step) in steps.iter().enumerate() {
        println!("  {}.  {}", style(i + 1).cyan(), step);
    }

    cliclack::outro("Happy coding!")?;

    Ok(())
}
