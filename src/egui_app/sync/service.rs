//! # Sync Service
//!
//! Wraps the sync operation of one logical resource (a table name).
//!
//! The service never touches sync state directly: it asks the
//! [`SyncStateStore`] for the in-flight slot, runs the caller's callback,
//! and reports the result with the attempt token it was given. A manual
//! sync and a periodic tick for the same resource therefore never overlap.

use super::metrics::SyncMetrics;
use super::periodic::SkipReason;
use super::sync_state::{SyncState, SyncStateStore};
use crate::shared::error::SyncError;
use crate::shared::event::{AppEvent, EventBus, SyncTrigger};
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

/// Async sync operation shared between the service, its timer and the UI
pub type SyncCallback = Arc<dyn Fn() -> BoxFuture<'static, Result<(), SyncError>> + Send + Sync>;

/// Build a [`SyncCallback`] from an async closure
pub fn sync_callback<F, Fut>(f: F) -> SyncCallback
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), SyncError>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// Result of one sync attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Synced { at: DateTime<Utc> },
    Failed { error: String },
    /// Another attempt for the resource was in flight
    AlreadySyncing,
    /// The periodic policy blocked the attempt; the callback was not invoked
    Skipped(SkipReason),
}

impl SyncOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncOutcome::Synced { .. })
    }
}

/// Sync operations for one resource
#[derive(Debug, Clone)]
pub struct SyncService {
    table: Arc<str>,
    store: SyncStateStore,
    events: EventBus,
    metrics: Arc<Mutex<SyncMetrics>>,
}

impl SyncService {
    pub fn new(table: impl Into<String>, store: SyncStateStore, events: EventBus) -> Self {
        let table: String = table.into();
        Self {
            table: Arc::from(table),
            store,
            events,
            metrics: Arc::new(Mutex::new(SyncMetrics::new())),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub async fn state(&self) -> Result<SyncState, SyncError> {
        self.store.snapshot(&self.table).await
    }

    pub async fn is_syncing(&self) -> Result<bool, SyncError> {
        Ok(self.state().await?.is_syncing())
    }

    pub async fn sync_failed(&self) -> Result<bool, SyncError> {
        Ok(self.state().await?.sync_failed())
    }

    pub async fn last_synced(&self) -> Result<Option<DateTime<Utc>>, SyncError> {
        Ok(self.state().await?.last_synced)
    }

    pub async fn subscribe(&self) -> Result<watch::Receiver<SyncState>, SyncError> {
        self.store.subscribe(&self.table).await
    }

    pub fn mark_pending_changes(&self) -> Result<(), SyncError> {
        self.store.mark_pending(&self.table)
    }

    pub fn clear_failure(&self) -> Result<(), SyncError> {
        self.store.clear_failure(&self.table)
    }

    pub fn metrics(&self) -> SyncMetrics {
        self.with_metrics(|metrics| metrics.clone())
    }

    fn with_metrics<T>(&self, f: impl FnOnce(&mut SyncMetrics) -> T) -> T {
        match self.metrics.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    /// Run one sync attempt
    ///
    /// Callback failures are reported through the outcome and the state
    /// store; only a closed store is an error.
    pub async fn run(
        &self,
        callback: &SyncCallback,
        trigger: SyncTrigger,
    ) -> Result<SyncOutcome, SyncError> {
        let Some(token) = self.store.try_begin(&self.table).await? else {
            tracing::debug!("[Sync] {} already syncing, {:?} attempt dropped", self.table, trigger);
            self.with_metrics(|metrics| metrics.record_sync_rejected());
            return Ok(SyncOutcome::AlreadySyncing);
        };

        let operation_id = Uuid::new_v4();
        self.events
            .publish(AppEvent::sync_started(&self.table, operation_id, trigger));
        self.with_metrics(|metrics| metrics.record_sync_start());
        let started = Instant::now();

        match callback().await {
            Ok(()) => {
                let at = Utc::now();
                self.store.complete(token, at)?;
                self.with_metrics(|metrics| metrics.record_sync_success(started.elapsed()));
                self.events
                    .publish(AppEvent::sync_completed(&self.table, operation_id));
                tracing::info!("[Sync] {} synced ({:?})", self.table, trigger);
                Ok(SyncOutcome::Synced { at })
            }
            Err(e) => {
                let error = e.to_string();
                self.store.fail(token, error.clone())?;
                self.with_metrics(|metrics| metrics.record_sync_failure(started.elapsed()));
                self.events
                    .publish(AppEvent::sync_failed(&self.table, operation_id, error.clone()));
                tracing::warn!("[Sync] {} sync failed: {}", self.table, error);
                Ok(SyncOutcome::Failed { error })
            }
        }
    }

    /// Run `callback` every `interval_seconds`
    ///
    /// The first tick fires one interval after arming. Each tick runs as its
    /// own task, so cancelling the handle never aborts an attempt in flight.
    pub fn setup_periodic_sync(
        &self,
        callback: SyncCallback,
        interval_seconds: u64,
    ) -> Result<PeriodicSyncHandle, SyncError> {
        self.spawn_timer(interval_seconds, move |service| {
            let callback = callback.clone();
            async move {
                service
                    .run(&callback, SyncTrigger::Periodic)
                    .await
                    .map(|_| ())
            }
            .boxed()
        })
    }

    /// Spawn a timer calling `tick` every `interval_seconds`
    pub(crate) fn spawn_timer<F>(
        &self,
        interval_seconds: u64,
        tick: F,
    ) -> Result<PeriodicSyncHandle, SyncError>
    where
        F: Fn(SyncService) -> BoxFuture<'static, Result<(), SyncError>> + Send + Sync + 'static,
    {
        if interval_seconds == 0 {
            return Err(SyncError::InvalidInterval(interval_seconds));
        }
        let period = Duration::from_secs(interval_seconds);
        let service = self.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let table = service.table.clone();
                let attempt = tick(service.clone());
                tokio::spawn(async move {
                    if let Err(e) = attempt.await {
                        tracing::error!("[Sync] Periodic sync of {} aborted: {}", table, e);
                    }
                });
            }
        });

        tracing::debug!("[Sync] Periodic sync armed for {} every {}s", self.table, interval_seconds);
        Ok(PeriodicSyncHandle {
            table: self.table.clone(),
            task,
        })
    }
}

/// Cancellation handle for a periodic sync timer
///
/// Dropping the handle stops the timer.
#[derive(Debug)]
pub struct PeriodicSyncHandle {
    table: Arc<str>,
    task: JoinHandle<()>,
}

impl PeriodicSyncHandle {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn cancel(self) {
        tracing::debug!("[Sync] Periodic sync cancelled for {}", self.table);
    }
}

impl Drop for PeriodicSyncHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
