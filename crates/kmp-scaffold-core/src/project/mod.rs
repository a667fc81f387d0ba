//! Project inspection and filesystem layout
//!
//! - Project type detection from marker files
//! - Package name validation
//! - Directory skeleton creation
//! - Relocation of existing Android/iOS sources

pub mod detect;
pub mod layout;
pub mod package;
pub mod relocate;

pub use detect::{detect, validate_root, ProjectType};
pub use layout::{create_layout, skeleton_dirs};
pub use package::PackageName;
pub use relocate::{plan_moves, relocate, Move, MoveReport};
