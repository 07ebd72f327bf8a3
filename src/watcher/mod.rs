//! Filesystem watching and debounced sync scheduling.
//!
//! The notify-backed [`FileWatcher`] turns raw filesystem events into
//! [`ChangeBatch`]es on a channel; the [`Scheduler`] consumes them,
//! debounces bursts into single sync runs, and keeps a slow periodic
//! pull going, all under single-flight discipline.

mod events;
mod scheduler;
mod watcher;

pub use events::ChangeBatch;
pub use scheduler::{RunDirective, Scheduler, SchedulerState, SourceFilter};
pub use watcher::FileWatcher;
