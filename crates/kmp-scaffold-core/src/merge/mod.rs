//! Idempotent merging of required declarations into Gradle configuration files
//!
//! A [`Fact`] is a declaration that must exist in a document: a catalog entry,
//! a plugin alias, a settings statement. [`merge`] inserts each missing fact at
//! its [`Anchor`], leaves present facts alone, and never removes or reorders
//! existing lines, so running it twice changes nothing the second time.
//!
//! Fact tables for the files this tool manages live in [`tables`].

pub mod document;
pub mod error;
pub mod fact;
pub mod merger;
pub mod tables;

pub use document::{Document, DocumentKind, LineEnding};
pub use error::MergeError;
pub use fact::{accessor_path, normalize_key, Anchor, Fact, Matcher};
pub use merger::{merge, merge_bytes, missing_facts, MergeOutcome};
