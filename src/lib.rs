//! Satchel
//!
//! Personal knowledge repository with an incremental, content-hash-based
//! sync engine. Files under watched sources are discovered, deduplicated
//! by blake3 digest, ingested through pluggable collaborators, and kept
//! consistent across machines through an ordinary git remote.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod ingest;
pub mod observability;
pub mod storage;
pub mod sync;
pub mod watcher;

pub use config::Config;
pub use error::{Error, Result};
