//! # Network Monitor
//!
//! Online/offline status, published on a watch channel.
//!
//! The client assumes it is online until a probe says otherwise. Coming back
//! online publishes `connectivity-restored`, which the sync manager answers
//! with a sync of every tracked table.

use crate::egui_app::api_client::ApiClient;
use crate::shared::event::{AppEvent, EventBus};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkStatus {
    #[default]
    Online,
    Offline,
}

impl NetworkStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, NetworkStatus::Online)
    }
}

#[derive(Debug, Clone)]
pub struct NetworkMonitor {
    status: watch::Sender<NetworkStatus>,
    events: EventBus,
}

impl NetworkMonitor {
    pub fn new(events: EventBus) -> Self {
        let (status, _) = watch::channel(NetworkStatus::Online);
        Self { status, events }
    }

    pub fn status(&self) -> NetworkStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<NetworkStatus> {
        self.status.subscribe()
    }

    /// Record a new status
    ///
    /// Subscribers are only woken on an actual change.
    pub fn set_status(&self, status: NetworkStatus) {
        let changed = self.status.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
        if !changed {
            return;
        }

        match status {
            NetworkStatus::Online => {
                tracing::info!("[Network] Connectivity restored");
                self.events.publish(AppEvent::connectivity_restored());
            }
            NetworkStatus::Offline => tracing::warn!("[Network] Server unreachable, going offline"),
        }
    }

    /// Ping the API once and record the result
    pub async fn probe(&self, api: &ApiClient) -> NetworkStatus {
        let status = match api.ping().await {
            Ok(()) => NetworkStatus::Online,
            Err(e) => {
                tracing::debug!("[Network] Probe failed: {}", e);
                NetworkStatus::Offline
            }
        };
        self.set_status(status);
        status
    }

    /// Probe every `interval` until the returned task is aborted
    pub fn spawn_probe(&self, api: ApiClient, interval: Duration) -> JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                monitor.probe(&api).await;
            }
        })
    }
}
