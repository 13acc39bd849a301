//! End-to-end sync scenarios: global manager, periodic hook and table sync
//! driving the mock server in real time with a one second interval.

use crate::common::mock_api::{envelope_ack, envelope_error, envelope_ok};
use crate::common::{documents_for, MockApi, RICHARD};
use crate::assert_ok;
use pretty_assertions::assert_eq;
use qualiflow::egui_app::sync::{
    GlobalSyncManager, NetworkStatus, RecordCollection, SkipReason, SyncConfig, SyncOutcome,
    SyncPhase, SyncState, SyncStateStore, TableSync,
};
use qualiflow::shared::{Document, EventBus, SyncTrigger, UserId};
use serde_json::json;
use std::time::Duration;
use tokio::sync::watch;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(5);

struct Harness {
    manager: GlobalSyncManager,
    documents: TableSync<Document>,
    user: watch::Sender<Option<UserId>>,
    network: watch::Sender<NetworkStatus>,
    state: watch::Receiver<SyncState>,
}

async fn harness(api: &MockApi, status: NetworkStatus) -> Harness {
    let (user, user_rx) = watch::channel(UserId::parse(RICHARD));
    let (network, network_rx) = watch::channel(status);
    let store = SyncStateStore::spawn();
    let manager = GlobalSyncManager::new(
        SyncConfig {
            auto_sync: true,
            sync_interval_seconds: 1,
            tracked_tables: vec!["documents".to_string()],
        },
        store.clone(),
        EventBus::default(),
        user_rx,
        network_rx,
    );

    let documents = assert_ok!(
        manager
            .register_table(api.client_for("token-1", RICHARD), RecordCollection::new())
            .await
    );
    documents.records().replace(documents_for(RICHARD, 3));
    let state = assert_ok!(store.subscribe("documents").await);

    Harness {
        manager,
        documents,
        user,
        network,
        state,
    }
}

async fn wait_until(state: &mut watch::Receiver<SyncState>, f: impl FnMut(&SyncState) -> bool) -> bool {
    tokio::time::timeout(WAIT, state.wait_for(f))
        .await
        .is_ok_and(|r| r.is_ok())
}

#[tokio::test]
async fn test_periodic_sync_updates_last_synced() {
    let api = MockApi::start().await;
    Mock::given(method("POST"))
        .and(path("/api/documents/sync"))
        .and(header("Authorization", "Bearer token-1"))
        .and(body_partial_json(json!({ "userId": RICHARD })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope_ack()))
        .expect(1..)
        .mount(&api.server)
        .await;

    let mut h = harness(&api, NetworkStatus::Online).await;
    assert!(assert_ok!(h.manager.start().await));
    assert!(h.manager.is_armed("documents").await);

    assert!(wait_until(&mut h.state, |s| s.phase == SyncPhase::Synced).await);

    let state = h.state.borrow().clone();
    assert!(state.last_synced.is_some());
    assert!(!state.sync_failed());
    assert_eq!(state.error_message, None);
    // An acknowledgement leaves the local records in place
    assert_eq!(h.documents.records().len(), 3);

    assert!(h.manager.stop().await);
}

#[tokio::test]
async fn test_offline_never_schedules() {
    let api = MockApi::start().await;
    Mock::given(method("POST"))
        .and(path("/api/documents/sync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope_ack()))
        .expect(0)
        .mount(&api.server)
        .await;

    let h = harness(&api, NetworkStatus::Offline).await;
    assert_ok!(h.manager.start().await);
    assert!(!h.manager.is_armed("documents").await);

    tokio::time::sleep(Duration::from_millis(2500)).await;
    let state = h.state.borrow().clone();
    assert_eq!(state.phase, SyncPhase::Idle);
    assert_eq!(state.last_synced, None);

    h.manager.stop().await;
}

#[tokio::test]
async fn test_reconnect_arms_and_syncs() {
    let api = MockApi::start().await;
    Mock::given(method("POST"))
        .and(path("/api/documents/sync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope_ack()))
        .mount(&api.server)
        .await;

    let mut h = harness(&api, NetworkStatus::Offline).await;
    assert_ok!(h.manager.start().await);
    assert!(!h.manager.is_armed("documents").await);

    h.network.send_replace(NetworkStatus::Online);
    assert!(wait_until(&mut h.state, |s| s.phase == SyncPhase::Synced).await);
    // The hook re-arms once it sees the attempt finish
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(h.manager.is_armed("documents").await);

    h.manager.stop().await;
}

#[tokio::test]
async fn test_failure_keeps_last_synced_and_disarms() {
    let api = MockApi::start().await;
    Mock::given(method("POST"))
        .and(path("/api/documents/sync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope_ack()))
        .up_to_n_times(1)
        .mount(&api.server)
        .await;

    let mut h = harness(&api, NetworkStatus::Online).await;
    assert_ok!(h.manager.start().await);
    assert!(wait_until(&mut h.state, |s| s.phase == SyncPhase::Synced).await);
    let first = h.state.borrow().last_synced;

    // From now on the server is down
    Mock::given(method("POST"))
        .and(path("/api/documents/sync"))
        .respond_with(ResponseTemplate::new(500).set_body_json(envelope_error("Database unavailable")))
        .mount(&api.server)
        .await;

    assert!(wait_until(&mut h.state, SyncState::sync_failed).await);
    let state = h.state.borrow().clone();
    assert_eq!(state.last_synced, first);
    assert_eq!(
        state.error_message.as_deref(),
        Some("HTTP 500: Database unavailable")
    );

    // The failure flag holds periodic sync back until a manual retry
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!h.manager.is_armed("documents").await);
    assert_eq!(
        assert_ok!(h.manager.sync_table("documents", SyncTrigger::Periodic).await),
        SyncOutcome::Skipped(SkipReason::PreviouslyFailed)
    );

    h.manager.stop().await;
}

#[tokio::test]
async fn test_manual_retry_recovers() {
    let api = MockApi::start().await;
    Mock::given(method("POST"))
        .and(path("/api/documents/sync"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&api.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/documents/sync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope_ack()))
        .mount(&api.server)
        .await;

    let h = harness(&api, NetworkStatus::Online).await;

    let failed = assert_ok!(h.manager.sync_table("documents", SyncTrigger::Manual).await);
    assert!(!failed.is_synced());
    let state = assert_ok!(h.manager.store().snapshot("documents").await);
    assert!(state.sync_failed());
    assert_eq!(state.last_synced, None);

    let retried = assert_ok!(h.manager.sync_table("documents", SyncTrigger::Manual).await);
    assert!(retried.is_synced());
    let state = assert_ok!(h.manager.store().snapshot("documents").await);
    assert!(!state.sync_failed());
    assert!(state.last_synced.is_some());
}

#[tokio::test]
async fn test_canonical_list_replaces_owned_records() {
    let api = MockApi::start().await;
    let mut canonical = documents_for(RICHARD, 2);
    canonical.extend(documents_for("someone_else", 1));
    Mock::given(method("POST"))
        .and(path("/api/documents/sync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope_ok(canonical)))
        .mount(&api.server)
        .await;

    let h = harness(&api, NetworkStatus::Online).await;
    let outcome = assert_ok!(h.manager.sync_table("documents", SyncTrigger::Manual).await);
    assert!(outcome.is_synced());

    let records = h.documents.records().snapshot();
    assert_eq!(records, documents_for(RICHARD, 2));
}

#[tokio::test]
async fn test_no_user_skips_without_request() {
    let api = MockApi::start().await;
    Mock::given(method("POST"))
        .and(path("/api/documents/sync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope_ack()))
        .expect(0)
        .mount(&api.server)
        .await;

    let h = harness(&api, NetworkStatus::Online).await;
    h.user.send_replace(None);

    assert_eq!(
        assert_ok!(h.manager.sync_table("documents", SyncTrigger::Manual).await),
        SyncOutcome::Skipped(SkipReason::NoUser)
    );
}

#[tokio::test]
async fn test_concurrent_manual_sync_is_rejected() {
    let api = MockApi::start().await;
    Mock::given(method("POST"))
        .and(path("/api/documents/sync"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope_ack())
                .set_delay(Duration::from_millis(500)),
        )
        .expect(1)
        .mount(&api.server)
        .await;

    let h = harness(&api, NetworkStatus::Online).await;
    let manager = h.manager.clone();
    let first = tokio::spawn(async move { manager.sync_table("documents", SyncTrigger::Manual).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(assert_ok!(h.manager.is_global_syncing().await));
    assert_eq!(
        assert_ok!(h.manager.sync_table("documents", SyncTrigger::Manual).await),
        SyncOutcome::Skipped(SkipReason::AlreadySyncing)
    );

    assert!(assert_ok!(first.await.unwrap()).is_synced());
    assert!(!assert_ok!(h.manager.is_global_syncing().await));
    assert!(assert_ok!(h.manager.last_global_sync().await).is_some());
}
