//! Debounced sync scheduling.
//!
//! Two timers drive the daemon: a quiet-period debounce that turns a
//! burst of filesystem changes into one sync run, and a slow periodic
//! pull that picks up remote edits. Both feed a single state machine
//! that enforces single-flight: at most one orchestrator run exists at
//! any time, and changes arriving mid-run are retained for the next one.
//!
//! The state machine is pure (no clocks, no I/O; `now` is a parameter),
//! so every transition is unit-testable. [`Scheduler::run`] is the thin
//! driver that feeds it real events and spawns the runs it directs.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use globset::{Glob, GlobMatcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::events::ChangeBatch;
use crate::storage::SyncSource;
use crate::sync::{Orchestrator, SyncOptions};

/// What a state transition tells the driver to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunDirective {
    /// Options for the orchestrator run to start.
    pub options: SyncOptions,
    /// After a pull run that surfaced new files, run a second
    /// process-and-push pass in the same task.
    pub follow_up_push: bool,
}

impl RunDirective {
    /// Local changes quieted down: process and push, no pull.
    const LOCAL: Self = Self {
        options: SyncOptions {
            pull: false,
            push: true,
            dry_run: false,
        },
        follow_up_push: false,
    };

    /// Periodic remote check: pull, then push only via the follow-up.
    const PULL: Self = Self {
        options: SyncOptions {
            pull: true,
            push: false,
            dry_run: false,
        },
        follow_up_push: true,
    };
}

/// The scheduler's single-flight state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Nothing queued, nothing running.
    Idle,
    /// Changes queued; a run starts when the deadline passes quietly.
    Pending { deadline: Instant },
    /// An orchestrator run is in flight. `dirty` records changes that
    /// arrived mid-run and must be processed afterwards.
    Syncing { dirty: bool },
}

impl SchedulerState {
    /// A relevant filesystem change arrived.
    ///
    /// Re-arms the debounce timer unless a run is in flight, in which
    /// case the change is retained for the next run.
    #[must_use]
    pub fn on_change(self, now: Instant, quiet: Duration) -> Self {
        match self {
            Self::Idle | Self::Pending { .. } => Self::Pending {
                deadline: now + quiet,
            },
            Self::Syncing { .. } => Self::Syncing { dirty: true },
        }
    }

    /// The debounce deadline passed.
    #[must_use]
    pub fn on_deadline(self, now: Instant) -> (Self, Option<RunDirective>) {
        match self {
            Self::Pending { deadline } if deadline <= now => {
                (Self::Syncing { dirty: false }, Some(RunDirective::LOCAL))
            }
            other => (other, None),
        }
    }

    /// The periodic pull timer ticked. Skipped while a run is in flight;
    /// queued local changes survive in `dirty`.
    #[must_use]
    pub fn on_pull_tick(self) -> (Self, Option<RunDirective>) {
        match self {
            Self::Idle => (Self::Syncing { dirty: false }, Some(RunDirective::PULL)),
            Self::Pending { .. } => (Self::Syncing { dirty: true }, Some(RunDirective::PULL)),
            syncing @ Self::Syncing { .. } => (syncing, None),
        }
    }

    /// The in-flight run finished. Changes that arrived mid-run re-arm
    /// the debounce timer.
    #[must_use]
    pub fn on_finished(self, now: Instant, quiet: Duration) -> Self {
        match self {
            Self::Syncing { dirty: true } => Self::Pending {
                deadline: now + quiet,
            },
            Self::Idle | Self::Pending { .. } | Self::Syncing { dirty: false } => Self::Idle,
        }
    }

    /// The armed debounce deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        match self {
            Self::Pending { deadline } => Some(*deadline),
            Self::Idle | Self::Syncing { .. } => None,
        }
    }
}

/// Relevance filter for raw watcher events: a path matters only if it
/// falls under an enabled source's root and matches its glob.
#[derive(Debug, Default)]
pub struct SourceFilter {
    matchers: Vec<(PathBuf, GlobMatcher)>,
}

impl SourceFilter {
    /// Build a filter from the enabled sources. Invalid glob patterns
    /// are skipped here; discovery reports them as source errors.
    #[must_use]
    pub fn from_sources(sources: &[SyncSource]) -> Self {
        let matchers = sources
            .iter()
            .filter(|s| s.enabled)
            .filter_map(|s| {
                let glob = Glob::new(&s.glob_pattern).ok()?;
                Some((PathBuf::from(&s.root_path), glob.compile_matcher()))
            })
            .collect();
        Self { matchers }
    }

    /// Whether a changed path belongs to any watched source.
    #[must_use]
    pub fn is_relevant(&self, path: &Path) -> bool {
        self.matchers.iter().any(|(root, matcher)| {
            path.strip_prefix(root)
                .is_ok_and(|relative| matcher.is_match(relative))
        })
    }
}

/// Drives the state machine against real events and timers.
pub struct Scheduler {
    orchestrator: Arc<Orchestrator>,
    events: mpsc::Receiver<ChangeBatch>,
    filter: SourceFilter,
    quiet: Duration,
    pull_interval: Duration,
    shutdown: CancellationToken,
}

impl Scheduler {
    /// Wire a scheduler to its orchestrator and event channel.
    #[must_use]
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        events: mpsc::Receiver<ChangeBatch>,
        filter: SourceFilter,
        quiet: Duration,
        pull_interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            orchestrator,
            events,
            filter,
            quiet,
            pull_interval,
            shutdown,
        }
    }

    /// Run the event loop until the shutdown token is cancelled or the
    /// event channel closes. An in-flight run is awaited before return,
    /// so timers and the run task are released deterministically.
    pub async fn run(mut self) {
        let mut state = SchedulerState::Idle;
        let mut in_flight: Option<JoinHandle<()>> = None;
        // The first pull waits a full interval; startup does its own sync
        let mut pull_timer =
            tokio::time::interval_at(Instant::now() + self.pull_interval, self.pull_interval);
        pull_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(
            quiet_secs = self.quiet.as_secs(),
            pull_interval_secs = self.pull_interval.as_secs(),
            "Scheduler running"
        );

        loop {
            let deadline = state.deadline();

            tokio::select! {
                () = self.shutdown.cancelled() => {
                    tracing::info!("Shutdown requested");
                    break;
                }

                maybe_batch = self.events.recv() => {
                    let Some(batch) = maybe_batch else {
                        tracing::warn!("Watcher channel closed, stopping scheduler");
                        break;
                    };
                    if batch.any_path(|p| self.filter.is_relevant(p)) {
                        tracing::debug!(changes = batch.len(), "Relevant changes queued");
                        state = state.on_change(Instant::now(), self.quiet);
                    }
                }

                () = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)),
                        if deadline.is_some() => {
                    let (next, directive) = state.on_deadline(Instant::now());
                    state = next;
                    if let Some(directive) = directive {
                        tracing::info!("Quiet period elapsed, starting sync");
                        in_flight = Some(self.spawn_run(directive));
                    }
                }

                _ = pull_timer.tick() => {
                    let (next, directive) = state.on_pull_tick();
                    state = next;
                    if let Some(directive) = directive {
                        tracing::info!("Periodic pull tick, starting sync");
                        in_flight = Some(self.spawn_run(directive));
                    } else {
                        tracing::debug!("Pull tick skipped, sync in flight");
                    }
                }

                () = join_run(&mut in_flight), if in_flight.is_some() => {
                    state = state.on_finished(Instant::now(), self.quiet);
                }
            }
        }

        // Let an in-flight run finish; it is not cancellable mid-file
        if in_flight.is_some() {
            tracing::info!("Waiting for in-flight sync to finish");
            join_run(&mut in_flight).await;
        }
        tracing::info!("Scheduler stopped");
    }

    /// Spawn one orchestrator run as a task. The state machine decides
    /// when this is called, so runs never overlap.
    fn spawn_run(&self, directive: RunDirective) -> JoinHandle<()> {
        let orchestrator = Arc::clone(&self.orchestrator);
        tokio::spawn(async move {
            match orchestrator.sync(directive.options).await {
                Ok(result) => {
                    if directive.follow_up_push && result.discovery.new_files > 0 {
                        tracing::info!(
                            new = result.discovery.new_files,
                            "Pull surfaced new files, running follow-up"
                        );
                        if let Err(e) = orchestrator
                            .sync(SyncOptions {
                                pull: false,
                                push: true,
                                dry_run: false,
                            })
                            .await
                        {
                            tracing::error!(error = %e, "Follow-up sync failed");
                        }
                    }
                }
                Err(e) => tracing::error!(error = %e, "Sync run failed"),
            }
        })
    }
}

/// Await the in-flight run and clear the slot. Resolves immediately when
/// no run is in flight; the select arm guards on `is_some`.
async fn join_run(in_flight: &mut Option<JoinHandle<()>>) {
    if let Some(handle) = in_flight.as_mut() {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Sync task panicked");
        }
    }
    *in_flight = None;
}
