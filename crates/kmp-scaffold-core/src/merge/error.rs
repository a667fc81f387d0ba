//! Errors raised while merging facts into a document

use super::document::DocumentKind;
use thiserror::Error;

/// A document could not be merged without risking a corrupted configuration.
///
/// Every variant means the same thing to the caller: the document's
/// structure is not recognizable, so nothing was written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("{kind} is not a text document: {reason}")]
    Binary { kind: DocumentKind, reason: String },

    #[error("{kind} declares `{anchor}` {count} times; cannot pick one to extend")]
    DuplicateAnchor {
        kind: DocumentKind,
        anchor: String,
        count: usize,
    },

    #[error("{kind} opens and closes `{anchor}` on line {line}; cannot insert into it")]
    InlineBlock {
        kind: DocumentKind,
        anchor: String,
        line: usize,
    },

    #[error("{kind} has no line matching `{anchor}` required by `{fact}`")]
    MissingAnchor {
        kind: DocumentKind,
        fact: String,
        anchor: String,
    },

    #[error("`{fact}` uses a {anchor} anchor, which {kind} does not support")]
    UnsupportedAnchor {
        kind: DocumentKind,
        fact: String,
        anchor: &'static str,
    },
}

impl MergeError {
    /// The anchor (section, block or pattern) the failure is about, if any
    pub fn anchor(&self) -> Option<&str> {
        match self {
            MergeError::Binary { .. } => None,
            MergeError::DuplicateAnchor { anchor, .. }
            | MergeError::InlineBlock { anchor, .. }
            | MergeError::MissingAnchor { anchor, .. } => Some(anchor.as_str()),
            MergeError::UnsupportedAnchor { anchor, .. } => Some(*anchor),
        }
    }
}
