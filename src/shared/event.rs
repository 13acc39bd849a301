/**
 * Application Event System
 *
 * Cross-component notifications: session changes, sync lifecycle and
 * connectivity. Events carry an optional detail payload
 * `{tableName, operationId, trigger, error}` and are fanned out to every
 * subscriber through `EventBus`, a thin wrapper over
 * `tokio::sync::broadcast`.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Default number of events buffered per subscriber
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Type of application event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EventType {
    /// The persisted session changed (login, logout)
    #[serde(rename = "auth-changed")]
    AuthChanged,
    #[serde(rename = "syncStarted")]
    SyncStarted,
    #[serde(rename = "syncCompleted")]
    SyncCompleted,
    #[serde(rename = "syncFailed")]
    SyncFailed,
    /// Ask the sync layer to sync a resource right away
    #[serde(rename = "force-sync-required")]
    ForceSyncRequired,
    /// The network came back after being offline
    #[serde(rename = "connectivity-restored")]
    ConnectivityRestored,
}

impl EventType {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            EventType::AuthChanged => "auth-changed",
            EventType::SyncStarted => "syncStarted",
            EventType::SyncCompleted => "syncCompleted",
            EventType::SyncFailed => "syncFailed",
            EventType::ForceSyncRequired => "force-sync-required",
            EventType::ConnectivityRestored => "connectivity-restored",
        }
    }
}

/// What caused a sync attempt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SyncTrigger {
    Manual,
    Periodic,
    Startup,
    Forced,
    ConnectivityRestored,
}

/// Optional event payload
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<SyncTrigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Application event delivered to every subscriber
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppEvent {
    pub event_type: EventType,
    #[serde(default)]
    pub detail: EventDetail,
    pub timestamp: DateTime<Utc>,
}

impl AppEvent {
    pub fn new(event_type: EventType, detail: EventDetail) -> Self {
        Self {
            event_type,
            detail,
            timestamp: Utc::now(),
        }
    }

    pub fn auth_changed() -> Self {
        Self::new(EventType::AuthChanged, EventDetail::default())
    }

    pub fn sync_started(table: &str, operation_id: Uuid, trigger: SyncTrigger) -> Self {
        Self::new(
            EventType::SyncStarted,
            EventDetail {
                table_name: Some(table.to_string()),
                operation_id: Some(operation_id),
                trigger: Some(trigger),
                error: None,
            },
        )
    }

    pub fn sync_completed(table: &str, operation_id: Uuid) -> Self {
        Self::new(
            EventType::SyncCompleted,
            EventDetail {
                table_name: Some(table.to_string()),
                operation_id: Some(operation_id),
                ..Default::default()
            },
        )
    }

    pub fn sync_failed(table: &str, operation_id: Uuid, error: impl Into<String>) -> Self {
        Self::new(
            EventType::SyncFailed,
            EventDetail {
                table_name: Some(table.to_string()),
                operation_id: Some(operation_id),
                error: Some(error.into()),
                ..Default::default()
            },
        )
    }

    pub fn force_sync_required(table: &str) -> Self {
        Self::new(
            EventType::ForceSyncRequired,
            EventDetail {
                table_name: Some(table.to_string()),
                trigger: Some(SyncTrigger::Forced),
                ..Default::default()
            },
        )
    }

    pub fn connectivity_restored() -> Self {
        Self::new(
            EventType::ConnectivityRestored,
            EventDetail {
                trigger: Some(SyncTrigger::ConnectivityRestored),
                ..Default::default()
            },
        )
    }

    /// Resource the event refers to, if any
    pub fn table_name(&self) -> Option<&str> {
        self.detail.table_name.as_deref()
    }
}

/// In-process event bus
///
/// Cloning the bus shares the underlying channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all current subscribers
    ///
    /// Returns the number of subscribers that received it (0 if none).
    pub fn publish(&self, event: AppEvent) -> usize {
        let event_name = event.event_type.name();
        match self.tx.send(event) {
            Ok(subscriber_count) => {
                tracing::debug!("[Events] {} delivered to {} subscribers", event_name, subscriber_count);
                subscriber_count
            }
            Err(_) => {
                tracing::trace!("[Events] No subscribers for {}", event_name);
                0
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_names() {
        let json = serde_json::to_string(&EventType::ForceSyncRequired).unwrap();
        assert_eq!(json, "\"force-sync-required\"");
        let json = serde_json::to_string(&EventType::SyncStarted).unwrap();
        assert_eq!(json, "\"syncStarted\"");
        assert_eq!(EventType::AuthChanged.name(), "auth-changed");
    }

    #[test]
    fn test_detail_uses_camel_case() {
        let operation_id = Uuid::new_v4();
        let event = AppEvent::sync_started("documents", operation_id, SyncTrigger::Periodic);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["detail"]["tableName"], "documents");
        assert_eq!(json["detail"]["operationId"], operation_id.to_string());
        assert_eq!(json["detail"]["trigger"], "periodic");
        assert!(json["detail"].get("error").is_none());
    }

    #[test]
    fn test_sync_failed_carries_error() {
        let event = AppEvent::sync_failed("exigences", Uuid::new_v4(), "HTTP 500");
        assert_eq!(event.event_type, EventType::SyncFailed);
        assert_eq!(event.table_name(), Some("exigences"));
        assert_eq!(event.detail.error.as_deref(), Some("HTTP 500"));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(AppEvent::auth_changed()), 0);
    }

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let bus = EventBus::new(16);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        assert_eq!(bus.publish(AppEvent::connectivity_restored()), 2);

        assert_eq!(first.recv().await.unwrap().event_type, EventType::ConnectivityRestored);
        assert_eq!(second.recv().await.unwrap().event_type, EventType::ConnectivityRestored);
    }
}
