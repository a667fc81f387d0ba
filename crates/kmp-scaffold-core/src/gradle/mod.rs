//! Gradle tooling that is installed rather than merged

pub mod wrapper;

pub use wrapper::{materialize, verify_wrapper_jar, wrapper_properties, WrapperReport};
