//! Filesystem watcher bridging notify into the scheduler's event loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind, Debouncer};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::events::ChangeBatch;
use crate::error::WatcherError;
use crate::Result;

/// OS-level debounce for raw notify events. Much shorter than the
/// scheduler's quiet period; it only smooths editors that write files
/// in several operations.
const OS_DEBOUNCE: Duration = Duration::from_millis(500);

/// Watches source directories and forwards change batches over a channel.
///
/// The watcher runs on notify's own thread; [`ChangeBatch`]es cross into
/// async code through the returned mpsc receiver. Dropping the watcher
/// stops the notify thread and closes the channel, so shutdown is just
/// letting it go out of scope.
pub struct FileWatcher {
    debouncer: Debouncer<RecommendedWatcher>,
    watched_dirs: Arc<Mutex<Vec<PathBuf>>>,
}

impl FileWatcher {
    /// Create a watcher and the channel its change batches arrive on.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying notify watcher cannot be
    /// created.
    pub fn new() -> Result<(Self, mpsc::Receiver<ChangeBatch>)> {
        let (batch_tx, batch_rx) = mpsc::channel(100);
        let watched_dirs = Arc::new(Mutex::new(Vec::new()));
        let watched_dirs_cb = Arc::clone(&watched_dirs);

        let debouncer = new_debouncer(
            OS_DEBOUNCE,
            move |result: std::result::Result<
                Vec<notify_debouncer_mini::DebouncedEvent>,
                notify::Error,
            >| {
                match result {
                    Ok(events) => {
                        let mut batch = ChangeBatch::new();
                        {
                            let dirs = watched_dirs_cb.lock();
                            for event in events {
                                if matches!(event.kind, DebouncedEventKind::Any)
                                    && is_under_watched(&dirs, &event.path)
                                {
                                    batch.add(event.path);
                                }
                            }
                        }

                        if !batch.is_empty() {
                            // Receiver gone means we are shutting down
                            let _ = batch_tx.blocking_send(batch);
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Watch error");
                    }
                }
            },
        )
        .map_err(|e| WatcherError::WatchFailed {
            path: "init".to_string(),
            reason: e.to_string(),
        })?;

        let watcher = Self {
            debouncer,
            watched_dirs,
        };

        Ok((watcher, batch_rx))
    }

    /// Start watching a directory recursively.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory does not exist or cannot be
    /// watched.
    pub fn watch(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref().to_path_buf();

        if !path.is_dir() {
            return Err(WatcherError::WatchFailed {
                path: path.display().to_string(),
                reason: "directory does not exist".to_string(),
            }
            .into());
        }

        self.debouncer
            .watcher()
            .watch(&path, RecursiveMode::Recursive)
            .map_err(|e| WatcherError::WatchFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        self.watched_dirs.lock().push(path.clone());
        tracing::info!(path = %path.display(), "Watching directory");

        Ok(())
    }

    /// Stop watching a directory.
    ///
    /// # Errors
    ///
    /// Returns an error if unwatching fails.
    pub fn unwatch(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        self.debouncer
            .watcher()
            .unwatch(path)
            .map_err(|e| WatcherError::WatchFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        self.watched_dirs.lock().retain(|p| p != path);
        tracing::info!(path = %path.display(), "Stopped watching directory");

        Ok(())
    }

    /// Directories currently being watched.
    #[must_use]
    pub fn watched_dirs(&self) -> Vec<PathBuf> {
        self.watched_dirs.lock().clone()
    }
}

fn is_under_watched(dirs: &[PathBuf], path: &Path) -> bool {
    dirs.iter().any(|dir| path.starts_with(dir))
}
