//! KMP Scaffold Core - Turning Android, iOS, or empty directories into Kotlin Multiplatform projects
//!
//! The heart of the library is [`merge`]: Gradle files are never overwritten,
//! required declarations are merged into whatever the user already has, and a
//! second run over the same project changes nothing.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Core Operations** - Declaration merging, project detection, source
//!   relocation, template rendering, wrapper installation, JDK detection
//! - **Layer 2: Workflow Orchestration** - [`scaffold`], which runs every step in
//!   order from an explicit [`ScaffoldPlan`] without prompting
//! - **Layer 3: CLI/TUI Interface** - Optional cliclack-based prompts (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based TUI prompts module
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use kmp_scaffold_core::{merge, ScaffoldConfig, ScaffoldPlan, TemplateStore};
//!
//! // Merge declarations into a catalog you already have
//! let facts = merge::tables::version_catalog(&Default::default());
//! let outcome = merge::merge(&existing, merge::DocumentKind::VersionCatalog, &facts)?;
//!
//! // Or run the full pipeline
//! let store = TemplateStore::open(&template_dir)?;
//! let config = ScaffoldConfig::new(template_dir, store.manifest().versions.clone())?;
//! let report = kmp_scaffold_core::scaffold::scaffold(&plan, &config, &store).await?;
//! ```

pub mod config;
pub mod error;
pub mod gradle;
pub mod io;
pub mod merge;
pub mod project;
pub mod runtime;
pub mod scaffold;
pub mod templates;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use config::{ScaffoldConfig, Versions};
pub use error::ScaffoldError;
pub use merge::{Fact, MergeError, MergeOutcome};
pub use project::{PackageName, ProjectType};
pub use runtime::{check_java, RuntimeInfo};
pub use scaffold::{CheckStatus, DocumentStatus, ScaffoldPlan, ScaffoldReport};
pub use templates::{TemplateManifest, TemplateStore};

#[cfg(feature = "tui")]
pub use tui::run;

/// CLI version - used for template compatibility checking
/// Each binary should define its own version, but this provides a fallback
pub const DEFAULT_CLI_VERSION: &str = "0.1.0";
