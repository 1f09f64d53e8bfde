//! Configuration module
//!
//! Loads and validates `phaselight` controller configuration files.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLoader, LoadResult, LoadWarning, LoaderOptions, resolve};
pub use schema::{ControllerConfig, CycleConfig};
pub use validation::{ValidationResult, Validator};
