//! # Sync State Management
//!
//! Per-resource synchronization state, owned by a single actor task.
//!
//! Every mutation is a command sent over an `mpsc` channel; the owner task
//! applies commands in arrival order and publishes the result on a
//! per-resource `watch` channel. Views read state through those watch
//! receivers, so reads never contend with writes.
//!
//! ## Invariants
//!
//! - State for a resource is created on first reference, starts `Idle`,
//!   and lives as long as the store.
//! - At most one attempt per resource is in flight. `try_begin` hands out an
//!   `AttemptToken`; completing or failing requires the current token.
//! - A failure never touches `last_synced`; a success never moves it back.
//! - `reset_all` bumps every generation, so results of attempts started
//!   before the reset are dropped.

use crate::shared::error::SyncError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot, watch};

/// Sync lifecycle of one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SyncPhase {
    #[default]
    Idle,
    Syncing,
    Failed,
    Synced,
}

/// Last known sync status of a resource
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SyncState {
    pub phase: SyncPhase,
    pub last_synced: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub has_pending_changes: bool,
}

impl SyncState {
    pub fn is_syncing(&self) -> bool {
        self.phase == SyncPhase::Syncing
    }

    pub fn sync_failed(&self) -> bool {
        self.phase == SyncPhase::Failed
    }
}

/// Proof that the holder owns the in-flight attempt for a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptToken {
    table: String,
    generation: u64,
}

impl AttemptToken {
    pub fn table(&self) -> &str {
        &self.table
    }
}

enum Command {
    Subscribe {
        table: String,
        reply: oneshot::Sender<watch::Receiver<SyncState>>,
    },
    TryBegin {
        table: String,
        reply: oneshot::Sender<Option<AttemptToken>>,
    },
    Complete {
        token: AttemptToken,
        at: DateTime<Utc>,
    },
    Fail {
        token: AttemptToken,
        error: String,
    },
    MarkPending {
        table: String,
    },
    ClearFailure {
        table: String,
    },
    ResetAll,
    Tables {
        reply: oneshot::Sender<Vec<String>>,
    },
}

struct Entry {
    state: watch::Sender<SyncState>,
    generation: u64,
    in_flight: Option<u64>,
    /// Changes flagged while an attempt was in flight
    dirty: bool,
}

impl Entry {
    fn new() -> Self {
        let (state, _) = watch::channel(SyncState::default());
        Self {
            state,
            generation: 0,
            in_flight: None,
            dirty: false,
        }
    }

    /// The token matches the attempt currently in flight
    fn owns(&self, token: &AttemptToken) -> bool {
        self.in_flight == Some(token.generation)
    }
}

/// Handle to the sync state actor
///
/// Cheap to clone. The actor stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct SyncStateStore {
    tx: mpsc::UnboundedSender<Command>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Subscribe { table, .. } => write!(f, "Subscribe({})", table),
            Command::TryBegin { table, .. } => write!(f, "TryBegin({})", table),
            Command::Complete { token, .. } => write!(f, "Complete({})", token.table),
            Command::Fail { token, .. } => write!(f, "Fail({})", token.table),
            Command::MarkPending { table } => write!(f, "MarkPending({})", table),
            Command::ClearFailure { table } => write!(f, "ClearFailure({})", table),
            Command::ResetAll => write!(f, "ResetAll"),
            Command::Tables { .. } => write!(f, "Tables"),
        }
    }
}

impl SyncStateStore {
    /// Spawn the owner task on the current tokio runtime
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(Self::run(rx));
        Self { tx }
    }

    async fn run(mut rx: mpsc::UnboundedReceiver<Command>) {
        let mut entries: HashMap<String, Entry> = HashMap::new();

        while let Some(command) = rx.recv().await {
            tracing::trace!("[SyncState] {:?}", command);
            match command {
                Command::Subscribe { table, reply } => {
                    let entry = entries.entry(table).or_insert_with(Entry::new);
                    let _ = reply.send(entry.state.subscribe());
                }
                Command::TryBegin { table, reply } => {
                    let entry = entries.entry(table.clone()).or_insert_with(Entry::new);
                    if entry.in_flight.is_some() {
                        let _ = reply.send(None);
                        continue;
                    }
                    entry.generation += 1;
                    entry.in_flight = Some(entry.generation);
                    entry.dirty = false;
                    entry.state.send_modify(|state| state.phase = SyncPhase::Syncing);
                    let _ = reply.send(Some(AttemptToken {
                        table,
                        generation: entry.generation,
                    }));
                }
                Command::Complete { token, at } => {
                    let Some(entry) = entries.get_mut(&token.table) else {
                        continue;
                    };
                    if !entry.owns(&token) {
                        tracing::debug!("[SyncState] Dropping stale result for {}", token.table);
                        continue;
                    }
                    entry.in_flight = None;
                    let pending = std::mem::take(&mut entry.dirty);
                    entry.state.send_modify(|state| {
                        state.phase = SyncPhase::Synced;
                        state.error_message = None;
                        state.has_pending_changes = pending;
                        state.last_synced = Some(match state.last_synced {
                            Some(previous) if previous > at => previous,
                            _ => at,
                        });
                    });
                }
                Command::Fail { token, error } => {
                    let Some(entry) = entries.get_mut(&token.table) else {
                        continue;
                    };
                    if !entry.owns(&token) {
                        tracing::debug!("[SyncState] Dropping stale failure for {}", token.table);
                        continue;
                    }
                    entry.in_flight = None;
                    entry.state.send_modify(|state| {
                        state.phase = SyncPhase::Failed;
                        state.error_message = Some(error);
                    });
                }
                Command::MarkPending { table } => {
                    let entry = entries.entry(table).or_insert_with(Entry::new);
                    if entry.in_flight.is_some() {
                        entry.dirty = true;
                    }
                    entry.state.send_if_modified(|state| {
                        let changed = !state.has_pending_changes;
                        state.has_pending_changes = true;
                        changed
                    });
                }
                Command::ClearFailure { table } => {
                    let entry = entries.entry(table).or_insert_with(Entry::new);
                    entry.state.send_if_modified(|state| {
                        if state.phase != SyncPhase::Failed {
                            return false;
                        }
                        state.phase = if state.last_synced.is_some() {
                            SyncPhase::Synced
                        } else {
                            SyncPhase::Idle
                        };
                        state.error_message = None;
                        true
                    });
                }
                Command::ResetAll => {
                    for entry in entries.values_mut() {
                        entry.generation += 1;
                        entry.in_flight = None;
                        entry.dirty = false;
                        entry.state.send_if_modified(|state| {
                            if state.phase != SyncPhase::Syncing {
                                return false;
                            }
                            state.phase = if state.last_synced.is_some() {
                                SyncPhase::Synced
                            } else {
                                SyncPhase::Idle
                            };
                            true
                        });
                    }
                }
                Command::Tables { reply } => {
                    let mut tables: Vec<String> = entries.keys().cloned().collect();
                    tables.sort();
                    let _ = reply.send(tables);
                }
            }
        }

        tracing::debug!("[SyncState] Store closed");
    }

    fn send(&self, command: Command) -> Result<(), SyncError> {
        self.tx.send(command).map_err(|_| SyncError::StoreClosed)
    }

    /// Watch the state of `table`, creating it if needed
    pub async fn subscribe(&self, table: &str) -> Result<watch::Receiver<SyncState>, SyncError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Subscribe {
            table: table.to_string(),
            reply,
        })?;
        rx.await.map_err(|_| SyncError::StoreClosed)
    }

    /// Current state of `table`
    pub async fn snapshot(&self, table: &str) -> Result<SyncState, SyncError> {
        let receiver = self.subscribe(table).await?;
        let state = receiver.borrow().clone();
        Ok(state)
    }

    /// Claim the in-flight slot for `table`
    ///
    /// Returns `None` when another attempt is already running.
    pub async fn try_begin(&self, table: &str) -> Result<Option<AttemptToken>, SyncError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::TryBegin {
            table: table.to_string(),
            reply,
        })?;
        rx.await.map_err(|_| SyncError::StoreClosed)
    }

    /// Record a successful attempt
    pub fn complete(&self, token: AttemptToken, at: DateTime<Utc>) -> Result<(), SyncError> {
        self.send(Command::Complete { token, at })
    }

    /// Record a failed attempt
    pub fn fail(&self, token: AttemptToken, error: impl Into<String>) -> Result<(), SyncError> {
        self.send(Command::Fail {
            token,
            error: error.into(),
        })
    }

    /// Flag local changes that have not reached the server yet
    pub fn mark_pending(&self, table: &str) -> Result<(), SyncError> {
        self.send(Command::MarkPending {
            table: table.to_string(),
        })
    }

    /// Leave the failed state so periodic sync can resume
    pub fn clear_failure(&self, table: &str) -> Result<(), SyncError> {
        self.send(Command::ClearFailure {
            table: table.to_string(),
        })
    }

    /// Drop every in-flight attempt
    pub fn reset_all(&self) -> Result<(), SyncError> {
        self.send(Command::ResetAll)
    }

    /// Resources seen so far, sorted
    pub async fn tables(&self) -> Result<Vec<String>, SyncError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Tables { reply })?;
        rx.await.map_err(|_| SyncError::StoreClosed)
    }
}
