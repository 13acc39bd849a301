use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::runtime::Runtime;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::egui_app::api_client::ApiClient;
use crate::egui_app::auth::{AuthGate, AuthStatus, Route, RouteDecision};
use crate::egui_app::config::Config;
use crate::egui_app::local_db::{keys, LocalStorage, StorageError};
use crate::egui_app::sync::{
    GlobalSyncManager, NetworkMonitor, NetworkStatus, RecordCollection, SyncConfig, SyncOutcome,
    SyncState, SyncStateStore, TableSync,
};
use crate::egui_app::views::sync_indicator::relative_label;
use crate::shared::config::ConfigError;
use crate::shared::error::{ApiError, SyncError};
use crate::shared::event::{EventBus, SyncTrigger};
use crate::shared::identity::UserId;
use crate::shared::records::{Document, Exigence, Member, SyncRecord};

/// How often the API is pinged to detect connectivity
pub const NETWORK_PROBE_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("local storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("API client error: {0}")]
    Api(#[from] ApiError),
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Central application state shared across egui views.
pub struct AppState {
    runtime: Runtime,
    pub config: Config,
    storage: LocalStorage,
    gate: AuthGate,
    network: NetworkMonitor,
    manager: GlobalSyncManager,
    probe: JoinHandle<()>,

    pub documents: TableSync<Document>,
    pub exigences: TableSync<Exigence>,
    pub membres: TableSync<Member>,
    sync_states: HashMap<String, watch::Receiver<SyncState>>,

    pub route: Route,
    pub email_input: String,
    pub password_input: String,
    pub login_error: Option<String>,
    pub login_pending: bool,
    login_result: Option<Receiver<Result<(), String>>>,
    loaded_for: Option<UserId>,
}

/// Long-lived services created at startup
struct Services {
    storage: LocalStorage,
    gate: AuthGate,
    network: NetworkMonitor,
    manager: GlobalSyncManager,
    probe: JoinHandle<()>,
    documents: TableSync<Document>,
    exigences: TableSync<Exigence>,
    membres: TableSync<Member>,
    sync_states: HashMap<String, watch::Receiver<SyncState>>,
}

impl Services {
    async fn bootstrap(config: &Config) -> Result<Self, StartupError> {
        let storage = LocalStorage::open(&config.storage_path()).await?;
        let events = EventBus::default();
        let api = ApiClient::new(config.clone())?;

        let gate = AuthGate::new(storage.clone(), events.clone(), config.auth_recheck_interval())
            .with_api_client(api.clone());
        gate.refresh().await;
        gate.start();

        let network = NetworkMonitor::new(events.clone());
        let probe = network.spawn_probe(api.clone(), NETWORK_PROBE_INTERVAL);

        let store = SyncStateStore::spawn();
        let manager = GlobalSyncManager::new(
            SyncConfig::from(config),
            store.clone(),
            events,
            gate.watch_user_id(),
            network.subscribe(),
        );
        let documents = manager
            .register_table(api.clone(), RecordCollection::<Document>::new())
            .await?;
        let exigences = manager
            .register_table(api.clone(), RecordCollection::<Exigence>::new())
            .await?;
        let membres = manager
            .register_table(api, RecordCollection::<Member>::new())
            .await?;

        // Cached members are shown before the first sync completes
        if let Some(cached) = storage.get_json::<Vec<Member>>(keys::MEMBRES).await {
            membres.records().replace(cached);
        }
        storage
            .set_json(keys::USER_TABLES, &config.tracked_tables())
            .await?;

        let mut sync_states = HashMap::new();
        for table in manager.registered_tables().await {
            let rx = store.subscribe(&table).await?;
            sync_states.insert(table, rx);
        }

        manager.start().await?;

        Ok(Self {
            storage,
            gate,
            network,
            manager,
            probe,
            documents,
            exigences,
            membres,
            sync_states,
        })
    }
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, StartupError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("qualiflow-worker")
            .build()?;

        let services = runtime.block_on(Services::bootstrap(&config))?;

        tracing::info!("AppState initialized");
        Ok(Self {
            runtime,
            config,
            storage: services.storage,
            gate: services.gate,
            network: services.network,
            manager: services.manager,
            probe: services.probe,
            documents: services.documents,
            exigences: services.exigences,
            membres: services.membres,
            sync_states: services.sync_states,
            route: Route::Login,
            email_input: String::new(),
            password_input: String::new(),
            login_error: None,
            login_pending: false,
            login_result: None,
            loaded_for: None,
        })
    }

    pub fn auth_status(&self) -> AuthStatus {
        self.gate.status()
    }

    pub fn is_online(&self) -> bool {
        self.network.status() == NetworkStatus::Online
    }

    pub fn tracked_tables(&self) -> &[String] {
        self.config.tracked_tables()
    }

    pub fn registered_tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = self.sync_states.keys().cloned().collect();
        tables.sort();
        tables
    }

    pub fn table_state(&self, table: &str) -> SyncState {
        self.sync_states
            .get(table)
            .map(|rx| rx.borrow().clone())
            .unwrap_or_default()
    }

    pub fn record_count(&self, table: &str) -> usize {
        if table == Document::TABLE {
            self.documents.records().len()
        } else if table == Exigence::TABLE {
            self.exigences.records().len()
        } else if table == Member::TABLE {
            self.membres.records().len()
        } else {
            0
        }
    }

    /// One-line summary across tracked tables
    pub fn global_status_line(&self, now: DateTime<Utc>) -> String {
        let states: Vec<SyncState> = self
            .tracked_tables()
            .iter()
            .map(|table| self.table_state(table))
            .collect();

        if states.iter().any(SyncState::is_syncing) {
            return "Syncing…".to_string();
        }
        let last = states.iter().filter_map(|s| s.last_synced).max();
        let failed = states.iter().filter(|s| s.sync_failed()).count();
        if failed > 0 {
            format!("{} table(s) failed to sync, last sync {}", failed, relative_label(last, now))
        } else {
            format!("Last sync {}", relative_label(last, now))
        }
    }

    /// Per-frame housekeeping: login results, route guard, first load
    pub fn poll(&mut self) {
        self.check_login_result();

        match self.gate.guard(self.route) {
            RouteDecision::RedirectToLogin => self.route = Route::Login,
            RouteDecision::RedirectToHome => self.route = Route::Dashboard,
            RouteDecision::ShowLoading | RouteDecision::Render => {}
        }

        let user_id = self.gate.status().user_id().cloned();
        if user_id != self.loaded_for {
            if let Some(ref user_id) = user_id {
                self.load_records(user_id.clone());
            }
            self.loaded_for = user_id;
        }
    }

    fn load_records(&self, user_id: UserId) {
        let documents = self.documents.clone();
        let exigences = self.exigences.clone();
        let membres = self.membres.clone();
        let storage = self.storage.clone();

        self.runtime.spawn(async move {
            if let Err(e) = documents.load(&user_id).await {
                tracing::warn!("Failed to load documents: {}", e);
            }
            if let Err(e) = exigences.load(&user_id).await {
                tracing::warn!("Failed to load exigences: {}", e);
            }
            match membres.load(&user_id).await {
                Ok(_) => {
                    if let Err(e) = storage.set_json(keys::MEMBRES, &membres.records().snapshot()).await {
                        tracing::warn!("Failed to cache membres: {}", e);
                    }
                }
                Err(e) => tracing::warn!("Failed to load membres: {}", e),
            }
        });
    }

    fn check_login_result(&mut self) {
        if let Some(ref rx) = self.login_result {
            if let Ok(result) = rx.try_recv() {
                self.login_result = None;
                self.login_pending = false;

                match result {
                    Ok(()) => {
                        self.login_error = None;
                        self.password_input.clear();
                        self.route = Route::Dashboard;
                    }
                    Err(e) => {
                        tracing::warn!("Login failed: {}", e);
                        self.login_error = Some(e);
                    }
                }
            }
        }
    }

    pub fn handle_login(&mut self) {
        if self.email_input.trim().is_empty() || self.password_input.is_empty() {
            self.login_error = Some("Email and password are required".to_string());
            return;
        }

        self.login_pending = true;
        self.login_error = None;

        let gate = self.gate.clone();
        let email = self.email_input.trim().to_string();
        let password = self.password_input.clone();

        let (tx, rx) = channel();
        self.runtime.spawn(async move {
            let result = gate
                .sign_in(&email, &password)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string());
            let _ = tx.send(result);
        });

        self.login_result = Some(rx);
    }

    pub fn logout(&mut self) {
        let gate = self.gate.clone();
        let documents = self.documents.clone();
        let exigences = self.exigences.clone();
        let membres = self.membres.clone();
        self.runtime.spawn(async move {
            if let Err(e) = gate.logout().await {
                tracing::error!("Logout failed: {}", e);
            }
            documents.records().replace(Vec::new());
            exigences.records().replace(Vec::new());
            membres.records().replace(Vec::new());
        });
        self.route = Route::Login;
        self.email_input.clear();
        self.password_input.clear();
    }

    /// Manual sync from the UI
    pub fn sync_now(&self, table: &str) {
        let manager = self.manager.clone();
        let table = table.to_string();
        self.runtime.spawn(async move {
            match manager.sync_table(&table, SyncTrigger::Manual).await {
                Ok(SyncOutcome::Skipped(reason)) => {
                    tracing::info!("Sync of {} skipped: {}", table, reason)
                }
                Ok(_) => {}
                Err(e) => tracing::error!("Sync of {} failed: {}", table, e),
            }
        });
    }

    pub fn sync_all_now(&self) {
        let manager = self.manager.clone();
        self.runtime.spawn(async move {
            if let Err(e) = manager.sync_all(SyncTrigger::Manual).await {
                tracing::error!("Sync failed: {}", e);
            }
        });
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        self.probe.abort();
        self.gate.stop();
        self.runtime.block_on(self.manager.stop());
    }
}
