//! Incremental sync engine.
//!
//! Content hashing, source discovery, the orchestrated sync run, version
//! control for the data repo, and the daemon status surface. Documents
//! are identified by the hash of their bytes; the path index and
//! blocklist in storage carry that identity across runs, moves, and
//! machines.

mod discovery;
mod git;
mod hash;
mod orchestrator;
mod status;

pub use discovery::{
    discover, discover_async, DiscoveredFile, DiscoveryOutcome, DiscoveryStats, MovedFile,
};
pub use git::{GitCli, VersionControl};
pub use hash::{hash_bytes, hash_file};
pub use orchestrator::{Orchestrator, ProcessingStats, SyncOptions, SyncResult};
pub use status::{read_status, render_status, write_status, DaemonStatus};
