//! # Periodic Sync Hook
//!
//! Binds a resource's periodic sync timer to the conditions it depends on:
//! the signed-in user, network status, the number of local records and the
//! resource's own sync state. Whenever one of them changes the policy is
//! re-evaluated and the timer is armed or disarmed.
//!
//! A sync is only scheduled when the client is online, a user is present,
//! the resource is neither syncing nor failed, and there is at least one
//! record. A blocked evaluation is a no-op, never an error.

use super::network_monitor::NetworkStatus;
use super::service::{PeriodicSyncHandle, SyncCallback, SyncOutcome, SyncService};
use super::sync_state::SyncState;
use crate::shared::error::SyncError;
use crate::shared::event::SyncTrigger;
use crate::shared::identity::UserId;
use futures_util::FutureExt;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Why a periodic sync was not scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    Offline,
    NoUser,
    AlreadySyncing,
    PreviouslyFailed,
    NoRecords,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SkipReason::Offline => "offline",
            SkipReason::NoUser => "no user signed in",
            SkipReason::AlreadySyncing => "already syncing",
            SkipReason::PreviouslyFailed => "previous sync failed",
            SkipReason::NoRecords => "nothing to sync",
        };
        f.write_str(text)
    }
}

/// Inputs of the periodic sync policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConditions {
    pub user_id: Option<UserId>,
    pub is_online: bool,
    pub is_syncing: bool,
    pub sync_failed: bool,
    pub record_count: usize,
}

impl SyncConditions {
    /// First condition preventing a sync, if any
    pub fn blocker(&self) -> Option<SkipReason> {
        if !self.is_online {
            Some(SkipReason::Offline)
        } else if self.user_id.is_none() {
            Some(SkipReason::NoUser)
        } else if self.is_syncing {
            Some(SkipReason::AlreadySyncing)
        } else if self.sync_failed {
            Some(SkipReason::PreviouslyFailed)
        } else if self.record_count == 0 {
            Some(SkipReason::NoRecords)
        } else {
            None
        }
    }

    pub fn should_sync(&self) -> bool {
        self.blocker().is_none()
    }
}

/// Observable inputs a hook re-evaluates on
#[derive(Debug, Clone)]
pub struct SyncDependencies {
    pub user: watch::Receiver<Option<UserId>>,
    pub network: watch::Receiver<NetworkStatus>,
    pub records: watch::Receiver<usize>,
}

impl SyncDependencies {
    fn conditions(&self, state: &SyncState) -> SyncConditions {
        SyncConditions {
            user_id: self.user.borrow().clone(),
            is_online: self.network.borrow().is_online(),
            is_syncing: state.is_syncing(),
            sync_failed: state.sync_failed(),
            record_count: *self.records.borrow(),
        }
    }
}

/// Run one attempt unless the policy blocks it
///
/// Only periodic attempts honour the failure flag; any other trigger is a
/// retry.
pub async fn sync_if_allowed(
    service: &SyncService,
    deps: &SyncDependencies,
    callback: &SyncCallback,
    trigger: SyncTrigger,
) -> Result<SyncOutcome, SyncError> {
    let state = service.state().await?;
    let mut conditions = deps.conditions(&state);
    if trigger != SyncTrigger::Periodic {
        conditions.sync_failed = false;
    }
    if let Some(reason) = conditions.blocker() {
        tracing::debug!("[Sync] {} not synced: {}", service.table(), reason);
        return Ok(SyncOutcome::Skipped(reason));
    }
    service.run(callback, trigger).await
}

struct Binding {
    service: SyncService,
    callback: SyncCallback,
    interval_seconds: u64,
    deps: SyncDependencies,
    state: watch::Receiver<SyncState>,
    timer: Option<PeriodicSyncHandle>,
    armed: watch::Sender<bool>,
}

impl Binding {
    fn gather(&mut self) -> SyncConditions {
        self.deps.user.mark_unchanged();
        self.deps.network.mark_unchanged();
        self.deps.records.mark_unchanged();
        let state = self.state.borrow_and_update().clone();
        self.deps.conditions(&state)
    }

    fn reconcile(&mut self) -> Result<(), SyncError> {
        let conditions = self.gather();
        match (conditions.blocker(), self.timer.is_some()) {
            (None, false) => {
                // Conditions may change between arming and a tick
                let deps = self.deps.clone();
                let callback = self.callback.clone();
                self.timer = Some(self.service.spawn_timer(self.interval_seconds, move |service| {
                    let deps = deps.clone();
                    let callback = callback.clone();
                    async move {
                        sync_if_allowed(&service, &deps, &callback, SyncTrigger::Periodic)
                            .await
                            .map(|_| ())
                    }
                    .boxed()
                })?);
                self.armed.send_replace(true);
            }
            (Some(reason), true) => {
                tracing::debug!("[Sync] Periodic sync of {} paused: {}", self.service.table(), reason);
                self.timer = None;
                self.armed.send_replace(false);
            }
            _ => {}
        }
        Ok(())
    }

    /// Wait for any dependency to change; `false` once one is gone
    async fn changed(&mut self) -> bool {
        let result = tokio::select! {
            r = self.deps.user.changed() => r,
            r = self.deps.network.changed() => r,
            r = self.deps.records.changed() => r,
            r = self.state.changed() => r,
        };
        result.is_ok()
    }

    async fn run(mut self) {
        while self.changed().await {
            if let Err(e) = self.reconcile() {
                tracing::error!("[Sync] Cannot arm periodic sync of {}: {}", self.service.table(), e);
                break;
            }
        }
        self.timer = None;
        self.armed.send_replace(false);
        tracing::debug!("[Sync] Periodic hook for {} stopped", self.service.table());
    }
}

/// Live binding between a resource and its periodic timer
pub struct PeriodicSyncHook {
    service: SyncService,
    callback: SyncCallback,
    deps: SyncDependencies,
    armed: watch::Receiver<bool>,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for PeriodicSyncHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodicSyncHook")
            .field("table", &self.service.table())
            .field("armed", &*self.armed.borrow())
            .finish()
    }
}

impl PeriodicSyncHook {
    /// Evaluate the policy now and keep re-evaluating on every change
    pub async fn bind(
        service: SyncService,
        deps: SyncDependencies,
        handle_sync_with_server: SyncCallback,
        interval_seconds: u64,
    ) -> Result<Self, SyncError> {
        if interval_seconds == 0 {
            return Err(SyncError::InvalidInterval(interval_seconds));
        }

        let (armed_tx, armed) = watch::channel(false);
        let mut binding = Binding {
            service: service.clone(),
            callback: handle_sync_with_server.clone(),
            interval_seconds,
            deps: deps.clone(),
            state: service.subscribe().await?,
            timer: None,
            armed: armed_tx,
        };
        binding.reconcile()?;
        let task = tokio::spawn(binding.run());

        Ok(Self {
            service,
            callback: handle_sync_with_server,
            deps,
            armed,
            task,
        })
    }

    pub fn service(&self) -> &SyncService {
        &self.service
    }

    pub fn is_armed(&self) -> bool {
        *self.armed.borrow()
    }

    pub fn watch_armed(&self) -> watch::Receiver<bool> {
        self.armed.clone()
    }

    /// Current policy inputs
    pub async fn conditions(&self) -> Result<SyncConditions, SyncError> {
        let state = self.service.state().await?;
        Ok(self.deps.conditions(&state))
    }

    /// Sync once if the policy allows it
    pub async fn sync_now(&self, trigger: SyncTrigger) -> Result<SyncOutcome, SyncError> {
        sync_if_allowed(&self.service, &self.deps, &self.callback, trigger).await
    }

    pub fn unbind(self) {
        tracing::debug!("[Sync] Unbinding periodic hook for {}", self.service.table());
    }
}

impl Drop for PeriodicSyncHook {
    fn drop(&mut self) {
        self.task.abort();
    }
}
