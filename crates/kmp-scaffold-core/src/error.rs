//! Error taxonomy for a scaffolding run

use crate::merge::MergeError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScaffoldError {
    /// Bad user input. Reprompted interactively; fatal only with `--yes`.
    #[error("{0}")]
    InputValidation(String),

    #[error("Cannot access {}: {source}", path.display())]
    FilesystemAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template '{name}' not found in {}", dir.display())]
    MissingTemplate { name: String, dir: PathBuf },

    #[error("Cannot update {}: {source}", path.display())]
    MalformedDocument {
        path: PathBuf,
        #[source]
        source: MergeError,
    },

    #[error("{message}\nHint: {hint}")]
    ExternalTool { message: String, hint: String },
}

impl ScaffoldError {
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScaffoldError::FilesystemAccess {
            path: path.into(),
            source,
        }
    }
}
