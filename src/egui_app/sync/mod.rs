//! # Sync
//!
//! Reconciles local record collections with the Qualiflow API.
//!
//! ## Architecture
//!
//! - **Sync State**: single-owner store of per-resource status
//! - **Sync Service**: one attempt, or a periodic timer, for one resource
//! - **Periodic Hook**: arms the timer only while syncing makes sense
//! - **Table Sync**: the server round-trip for a record type
//! - **Network Monitor**: online/offline detection
//! - **Global Manager**: lifecycle of every tracked resource
//!
//! ## Usage
//!
//! ```rust,no_run
//! use qualiflow::egui_app::sync::{
//!     sync_callback, GlobalSyncManager, NetworkMonitor, SyncConfig, SyncStateStore,
//! };
//! use qualiflow::shared::{EventBus, UserId};
//! use tokio::sync::watch;
//!
//! # async fn example() -> Result<(), qualiflow::shared::SyncError> {
//! let events = EventBus::default();
//! let network = NetworkMonitor::new(events.clone());
//! let (_user_tx, user_rx) = watch::channel(UserId::parse("p71x6d_richard"));
//! let (_count_tx, count_rx) = watch::channel(3usize);
//!
//! let manager = GlobalSyncManager::new(
//!     SyncConfig::default(),
//!     SyncStateStore::spawn(),
//!     events,
//!     user_rx,
//!     network.subscribe(),
//! );
//! manager
//!     .register("documents", sync_callback(|| async { Ok(()) }), count_rx)
//!     .await?;
//! manager.start().await?;
//!
//! let status = manager.status().await?;
//! println!("syncing: {}", status.syncing);
//!
//! manager.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod metrics;
pub mod network_monitor;
pub mod periodic;
pub mod service;
pub mod sync_state;
pub mod table_sync;

pub use metrics::SyncMetrics;
pub use network_monitor::{NetworkMonitor, NetworkStatus};
pub use periodic::{sync_if_allowed, PeriodicSyncHook, SkipReason, SyncConditions, SyncDependencies};
pub use service::{sync_callback, PeriodicSyncHandle, SyncCallback, SyncOutcome, SyncService};
pub use sync_state::{AttemptToken, SyncPhase, SyncState, SyncStateStore};
pub use table_sync::{RecordCollection, TableSync};

use crate::egui_app::api_client::ApiClient;
use crate::egui_app::config::Config;
use crate::shared::error::SyncError;
use crate::shared::event::{AppEvent, EventBus, EventType, SyncTrigger};
use crate::shared::identity::UserId;
use crate::shared::records::SyncRecord;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;

/// Configuration for the sync manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Arm periodic timers on start
    pub auto_sync: bool,
    /// Periodic sync interval in seconds
    pub sync_interval_seconds: u64,
    /// Resources synced periodically and on reconnect
    pub tracked_tables: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync: true,
            sync_interval_seconds: 30,
            tracked_tables: vec!["documents".to_string()],
        }
    }
}

impl From<&Config> for SyncConfig {
    fn from(config: &Config) -> Self {
        Self {
            auto_sync: config.auto_sync(),
            sync_interval_seconds: config.sync_interval_seconds(),
            tracked_tables: config.tracked_tables().to_vec(),
        }
    }
}

impl SyncConfig {
    pub fn is_tracked(&self, table: &str) -> bool {
        self.tracked_tables.iter().any(|t| t == table)
    }
}

/// Sync status of one resource, as shown in the UI
#[derive(Debug, Clone, Serialize)]
pub struct TableStatus {
    pub table: String,
    pub state: SyncState,
    /// Periodic timer is live
    pub armed: bool,
}

/// Aggregate status across tracked resources
#[derive(Debug, Clone, Serialize)]
pub struct GlobalSyncStatus {
    pub running: bool,
    pub syncing: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub tables: Vec<TableStatus>,
}

struct Registration {
    service: SyncService,
    callback: SyncCallback,
    records: watch::Receiver<usize>,
}

struct Running {
    hooks: HashMap<String, PeriodicSyncHook>,
    listener: JoinHandle<()>,
}

impl Drop for Running {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

#[derive(Default)]
struct Inner {
    registrations: BTreeMap<String, Registration>,
    running: Option<Running>,
}

struct Shared {
    config: SyncConfig,
    store: SyncStateStore,
    events: EventBus,
    user: watch::Receiver<Option<UserId>>,
    network: watch::Receiver<NetworkStatus>,
    inner: Mutex<Inner>,
}

/// Coordinates sync of every registered resource
///
/// Constructed once at startup and shared by cloning.
#[derive(Clone)]
pub struct GlobalSyncManager {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for GlobalSyncManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalSyncManager")
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

impl GlobalSyncManager {
    pub fn new(
        config: SyncConfig,
        store: SyncStateStore,
        events: EventBus,
        user: watch::Receiver<Option<UserId>>,
        network: watch::Receiver<NetworkStatus>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                store,
                events,
                user,
                network,
                inner: Mutex::new(Inner::default()),
            }),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.shared.config
    }

    pub fn store(&self) -> &SyncStateStore {
        &self.shared.store
    }

    fn dependencies(&self, records: watch::Receiver<usize>) -> SyncDependencies {
        SyncDependencies {
            user: self.shared.user.clone(),
            network: self.shared.network.clone(),
            records,
        }
    }

    /// Declare a resource and how to sync it
    ///
    /// Registering while running binds the resource right away if tracked.
    pub async fn register(
        &self,
        table: impl Into<String>,
        callback: SyncCallback,
        records: watch::Receiver<usize>,
    ) -> Result<SyncService, SyncError> {
        let service = SyncService::new(
            table,
            self.shared.store.clone(),
            self.shared.events.clone(),
        );
        self.insert(service.clone(), callback, records).await?;
        Ok(service)
    }

    /// Register a record collection synced through the API
    pub async fn register_table<R: SyncRecord>(
        &self,
        api: ApiClient,
        records: RecordCollection<R>,
    ) -> Result<TableSync<R>, SyncError> {
        let service = SyncService::new(
            R::TABLE,
            self.shared.store.clone(),
            self.shared.events.clone(),
        );
        let count = records.watch_count();
        let table = TableSync::new(api, records, service.clone());
        self.insert(service, table.callback(self.shared.user.clone()), count)
            .await?;
        Ok(table)
    }

    async fn insert(
        &self,
        service: SyncService,
        callback: SyncCallback,
        records: watch::Receiver<usize>,
    ) -> Result<(), SyncError> {
        let table = service.table().to_string();
        let mut inner = self.shared.inner.lock().await;

        if let Some(running) = inner.running.as_mut() {
            if self.shared.config.auto_sync && self.shared.config.is_tracked(&table) {
                let hook = PeriodicSyncHook::bind(
                    service.clone(),
                    self.dependencies(records.clone()),
                    callback.clone(),
                    self.shared.config.sync_interval_seconds,
                )
                .await?;
                running.hooks.insert(table.clone(), hook);
            }
        }

        tracing::debug!("[SyncManager] Registered {}", table);
        inner.registrations.insert(
            table,
            Registration {
                service,
                callback,
                records,
            },
        );
        Ok(())
    }

    pub async fn service(&self, table: &str) -> Option<SyncService> {
        let inner = self.shared.inner.lock().await;
        inner.registrations.get(table).map(|r| r.service.clone())
    }

    pub async fn registered_tables(&self) -> Vec<String> {
        let inner = self.shared.inner.lock().await;
        inner.registrations.keys().cloned().collect()
    }

    /// Begin tracking configured resources
    ///
    /// Returns `false` if already running.
    pub async fn start(&self) -> Result<bool, SyncError> {
        let mut inner = self.shared.inner.lock().await;
        if inner.running.is_some() {
            return Ok(false);
        }

        let config = &self.shared.config;
        let mut hooks = HashMap::new();
        if config.auto_sync {
            for table in &config.tracked_tables {
                let Some(registration) = inner.registrations.get(table) else {
                    tracing::warn!("[SyncManager] Tracked table {} has no sync registered", table);
                    continue;
                };
                let hook = PeriodicSyncHook::bind(
                    registration.service.clone(),
                    self.dependencies(registration.records.clone()),
                    registration.callback.clone(),
                    config.sync_interval_seconds,
                )
                .await?;
                hooks.insert(table.clone(), hook);
            }
        }

        let events = self.shared.events.subscribe();
        let listener = tokio::spawn(Self::listen(Arc::downgrade(&self.shared), events));
        inner.running = Some(Running { hooks, listener });

        tracing::info!(
            "[SyncManager] Started: {} periodic, every {}s",
            inner.running.as_ref().map_or(0, |r| r.hooks.len()),
            config.sync_interval_seconds
        );
        Ok(true)
    }

    /// Cancel every timer and drop in-flight results
    ///
    /// Returns `false` if not running.
    pub async fn stop(&self) -> bool {
        let mut inner = self.shared.inner.lock().await;
        let Some(running) = inner.running.take() else {
            return false;
        };
        drop(running);

        if let Err(e) = self.shared.store.reset_all() {
            tracing::warn!("[SyncManager] Could not reset sync state: {}", e);
        }
        tracing::info!("[SyncManager] Stopped");
        true
    }

    pub async fn is_running(&self) -> bool {
        self.shared.inner.lock().await.running.is_some()
    }

    /// Whether the periodic timer of `table` is live
    pub async fn is_armed(&self, table: &str) -> bool {
        let inner = self.shared.inner.lock().await;
        inner
            .running
            .as_ref()
            .and_then(|r| r.hooks.get(table))
            .is_some_and(|hook| hook.is_armed())
    }

    /// Sync one registered resource now, subject to the sync policy
    pub async fn sync_table(
        &self,
        table: &str,
        trigger: SyncTrigger,
    ) -> Result<SyncOutcome, SyncError> {
        let (service, callback, deps) = {
            let inner = self.shared.inner.lock().await;
            let registration = inner
                .registrations
                .get(table)
                .ok_or_else(|| SyncError::UnknownResource(table.to_string()))?;
            (
                registration.service.clone(),
                registration.callback.clone(),
                self.dependencies(registration.records.clone()),
            )
        };
        sync_if_allowed(&service, &deps, &callback, trigger).await
    }

    /// Sync every tracked resource concurrently
    pub async fn sync_all(
        &self,
        trigger: SyncTrigger,
    ) -> Result<Vec<(String, SyncOutcome)>, SyncError> {
        let tables: Vec<String> = {
            let inner = self.shared.inner.lock().await;
            self.shared
                .config
                .tracked_tables
                .iter()
                .filter(|t| inner.registrations.contains_key(t.as_str()))
                .cloned()
                .collect()
        };

        let outcomes = join_all(tables.iter().map(|table| self.sync_table(table, trigger))).await;
        tables
            .into_iter()
            .zip(outcomes)
            .map(|(table, outcome)| outcome.map(|outcome| (table, outcome)))
            .collect()
    }

    /// Any tracked resource has an attempt in flight
    pub async fn is_global_syncing(&self) -> Result<bool, SyncError> {
        for table in &self.shared.config.tracked_tables {
            if self.shared.store.snapshot(table).await?.is_syncing() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Most recent successful sync across tracked resources
    pub async fn last_global_sync(&self) -> Result<Option<DateTime<Utc>>, SyncError> {
        let mut latest = None;
        for table in &self.shared.config.tracked_tables {
            let synced = self.shared.store.snapshot(table).await?.last_synced;
            latest = latest.max(synced);
        }
        Ok(latest)
    }

    pub async fn status(&self) -> Result<GlobalSyncStatus, SyncError> {
        let (running, armed): (bool, HashMap<String, bool>) = {
            let inner = self.shared.inner.lock().await;
            match inner.running.as_ref() {
                Some(r) => (
                    true,
                    r.hooks
                        .iter()
                        .map(|(table, hook)| (table.clone(), hook.is_armed()))
                        .collect(),
                ),
                None => (false, HashMap::new()),
            }
        };

        let mut tables = Vec::with_capacity(self.shared.config.tracked_tables.len());
        for table in &self.shared.config.tracked_tables {
            let state = self.shared.store.snapshot(table).await?;
            tables.push(TableStatus {
                table: table.clone(),
                armed: armed.get(table).copied().unwrap_or(false),
                state,
            });
        }

        Ok(GlobalSyncStatus {
            running,
            syncing: tables.iter().any(|t| t.state.is_syncing()),
            last_sync: tables.iter().filter_map(|t| t.state.last_synced).max(),
            tables,
        })
    }

    async fn listen(shared: Weak<Shared>, mut events: broadcast::Receiver<AppEvent>) {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("[SyncManager] Missed {} events", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            let Some(shared) = shared.upgrade() else {
                break;
            };
            let manager = GlobalSyncManager { shared };

            match event.event_type {
                EventType::ForceSyncRequired => {
                    let Some(table) = event.table_name().map(str::to_string) else {
                        continue;
                    };
                    tokio::spawn(async move {
                        if let Err(e) = manager.sync_table(&table, SyncTrigger::Forced).await {
                            tracing::warn!("[SyncManager] Forced sync of {} failed: {}", table, e);
                        }
                    });
                }
                EventType::ConnectivityRestored => {
                    tokio::spawn(async move {
                        if let Err(e) = manager.sync_all(SyncTrigger::ConnectivityRestored).await {
                            tracing::warn!("[SyncManager] Reconnect sync failed: {}", e);
                        }
                    });
                }
                _ => {}
            }
        }
    }
}
