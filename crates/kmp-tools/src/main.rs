//! kmp-init - Add a Kotlin Multiplatform layout to Android and iOS projects

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use kmp_scaffold_core::config::resolve_template_dir;
use kmp_scaffold_core::tui::CreateArgs;
use kmp_scaffold_core::{CheckStatus, TemplateStore, Versions};
use std::path::PathBuf;

/// CLI version
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter variable
const LOG_ENV: &str = "KMP_LOG";

#[derive(Parser, Debug)]
#[command(name = "kmp-init")]
#[command(about = "Add a Kotlin Multiplatform layout to Android and iOS projects")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scaffold the KMP layout into a project (default)
    Init(CliInitArgs),
    /// Report which Gradle files a run would create or change, without writing
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
pub struct CliInitArgs {
    /// Project root to scaffold into
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Base package of the shared module (e.g. com.example.app)
    #[arg(short, long)]
    pub package: Option<String>,

    /// Local directory to use for templates (for development use)
    #[arg(long = "template-dir")]
    pub template_dir: Option<PathBuf>,

    /// Move existing sources into androidApp/ or iosApp/ without asking
    #[arg(long = "move-sources", overrides_with = "no_move_sources")]
    pub move_sources: bool,

    /// Leave existing sources where they are
    #[arg(long = "no-move-sources", overrides_with = "move_sources")]
    pub no_move_sources: bool,

    /// Do not install the Gradle wrapper
    #[arg(long = "skip-wrapper")]
    pub skip_wrapper: bool,

    /// Auto-confirm all prompts (non-interactive mode)
    #[arg(short, long)]
    pub yes: bool,
}

impl From<CliInitArgs> for CreateArgs {
    fn from(args: CliInitArgs) -> Self {
        let move_sources = match (args.move_sources, args.no_move_sources) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        CreateArgs {
            directory: args.directory,
            package: args.package,
            template_dir: args.template_dir,
            move_sources,
            skip_wrapper: args.skip_wrapper,
            yes: args.yes,
        }
    }
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Project root to inspect
    #[arg(short, long, default_value = ".")]
    pub directory: PathBuf,

    /// Local directory to use for templates (for development use)
    #[arg(long = "template-dir")]
    pub template_dir: Option<PathBuf>,
}

/// Print what `init` would do; returns true when anything is pending
fn run_check(args: CheckArgs) -> Result<bool> {
    let cwd = std::env::current_dir()?;
    let root = kmp_scaffold_core::project::validate_root(&args.directory.to_string_lossy(), &cwd)?;

    // Versions only affect rendered text, never presence, so defaults do when no templates exist
    let template_dir = resolve_template_dir(args.template_dir.as_deref(), &cwd);
    let versions = match TemplateStore::open(&template_dir) {
        Ok(store) => store.manifest().versions.clone(),
        Err(e) => {
            tracing::debug!(error = %e, "no template manifest, using default versions");
            Versions::default()
        }
    };

    let mut pending = false;
    for (path, status) in kmp_scaffold_core::scaffold::check(&root, &versions)? {
        match status {
            CheckStatus::UpToDate => {
                println!("{} {}", "ok".green(), path.display());
            }
            CheckStatus::Absent => {
                pending = true;
                println!("{} {}", "create".yellow(), path.display());
            }
            CheckStatus::Pending(keys) => {
                pending = true;
                println!("{} {}: {}", "update".yellow(), path.display(), keys.join(", "));
            }
        }
    }

    if pending {
        println!("\n{}", "Run `kmp-init` to apply these changes.".bold());
    } else {
        println!("\n{}", "Everything is up to date.".green().bold());
    }
    Ok(pending)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();

    // Handle subcommands
    match args.command {
        Some(Command::Check(check_args)) => {
            if run_check(check_args)? {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Init(init_args)) => {
            let result = kmp_scaffold_core::run(init_args.into(), CLI_VERSION).await;

            // Ensure cursor is visible on normal exit
            let _ = console::Term::stderr().show_cursor();

            result
        }
        None => {
            // No subcommand provided, default to init behavior (interactive mode)
            let result = kmp_scaffold_core::run(CreateArgs::default(), CLI_VERSION).await;

            // Ensure cursor is visible on normal exit
            let _ = console::Term::stderr().show_cursor();

            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_init() {
        let args = Args::try_parse_from(["kmp-init"]).unwrap();
        assert!(args.command.is_none());
    }

    #[test]
    fn test_move_sources_flags() {
        let parse = |extra: &[&str]| {
            let mut argv = vec!["kmp-init", "init"];
            argv.extend_from_slice(extra);
            match Args::try_parse_from(argv).unwrap().command {
                Some(Command::Init(init)) => CreateArgs::from(init).move_sources,
                other => panic!("unexpected command: {:?}", other),
            }
        };
        assert_eq!(parse(&[]), None);
        assert_eq!(parse(&["--move-sources"]), Some(true));
        assert_eq!(parse(&["--no-move-sources"]), Some(false));
        assert_eq!(parse(&["--move-sources", "--no-move-sources"]), Some(false));
    }

    #[test]
    fn test_init_flags_map_to_create_args() {
        let args = Args::try_parse_from([
            "kmp-init",
            "init",
            "--directory",
            "app",
            "--package",
            "com.example.app",
            "--skip-wrapper",
            "--yes",
        ])
        .unwrap();
        let Some(Command::Init(init)) = args.command else {
            panic!("expected init");
        };
        let create = CreateArgs::from(init);
        assert_eq!(create.directory, Some(PathBuf::from("app")));
        assert_eq!(create.package.as_deref(), Some("com.example.app"));
        assert!(create.skip_wrapper);
        assert!(create.yes);
    }
}
