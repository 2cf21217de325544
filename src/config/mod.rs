//! Configuration module
//!
//! Handles session settings: runtime, idle breaks and stroke shape.

pub mod settings;

pub use settings::{ConfigError, RunConfig};
