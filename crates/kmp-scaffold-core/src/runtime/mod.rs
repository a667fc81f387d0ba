//! Runtime detection
//!
//! The generated project builds with Gradle, which needs a JDK. The check is
//! advisory: scaffolding works without one.

pub mod check;

pub use check::{check_java, jdk_advisory, RuntimeInfo, JDK_DOCS_URL, MIN_JDK_MAJOR};
