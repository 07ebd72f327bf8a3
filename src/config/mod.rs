//! Configuration management for Satchel.
//!
//! Supports configuration from:
//! - Command-line arguments (highest priority)
//! - Environment variables
//! - Built-in defaults (lowest priority)

mod settings;

pub use settings::{Config, DEFAULT_DEBOUNCE_SECS, DEFAULT_PULL_INTERVAL_SECS};
