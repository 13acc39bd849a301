//! Auth gate over file-backed storage and the mock login endpoint

use crate::common::mock_api::{envelope_error, envelope_ok};
use crate::common::{richard, temp_storage, MockApi, RICHARD};
use crate::assert_ok;
use assert_matches::assert_matches;
use qualiflow::egui_app::auth::AuthError;
use qualiflow::egui_app::local_db::keys;
use qualiflow::egui_app::{AuthGate, AuthStatus, LocalStorage, Route, RouteDecision};
use qualiflow::shared::{ApiError, EventBus};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

const RECHECK: Duration = Duration::from_secs(60);

#[tokio::test]
async fn test_malformed_current_user_is_unauthenticated() {
    let (_dir, storage) = temp_storage().await;
    assert_ok!(storage.set_item(keys::AUTH_TOKEN, "token-1").await);
    assert_ok!(storage.set_item(keys::CURRENT_USER, "{\"id\": \"p71x6d").await);

    let gate = AuthGate::new(storage, EventBus::default(), RECHECK);
    let status = gate.refresh().await;

    assert_eq!(status, AuthStatus::Unauthenticated);
    assert_eq!(gate.guard(Route::Documents), RouteDecision::RedirectToLogin);
    assert!(gate.watch_user_id().borrow().is_none());
}

#[tokio::test]
async fn test_sign_in_persists_session_across_restart() {
    let api = MockApi::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope_ok(json!({ "token": "token-1", "user": richard() }))),
        )
        .mount(&api.server)
        .await;

    let (dir, storage) = temp_storage().await;
    let client = api.client();
    let gate = AuthGate::new(storage, EventBus::default(), RECHECK).with_api_client(client.clone());

    let status = assert_ok!(gate.sign_in("richard@formacert.fr", "secret").await);
    assert_eq!(status.user_id().map(|id| id.as_str()), Some(RICHARD));
    assert_eq!(gate.guard(Route::Login), RouteDecision::RedirectToHome);

    let credentials = client.credentials().unwrap();
    assert_eq!(credentials.token, "token-1");
    assert_eq!(credentials.user_id.unwrap().as_str(), RICHARD);

    // A fresh process reads the same file
    let reopened = assert_ok!(LocalStorage::open(&dir.path().join("qualiflow.db")).await);
    let gate = AuthGate::new(reopened, EventBus::default(), RECHECK);
    let status = gate.refresh().await;
    let session = status.session().unwrap();
    assert_eq!(session.token, "token-1");
    assert_eq!(session.user, richard());
    assert_eq!(session.role.as_deref(), Some("admin"));
}

#[tokio::test]
async fn test_rejected_sign_in_keeps_signed_out() {
    let api = MockApi::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(envelope_error("Identifiants invalides")))
        .mount(&api.server)
        .await;

    let (_dir, storage) = temp_storage().await;
    let gate = AuthGate::new(storage, EventBus::default(), RECHECK).with_api_client(api.client());
    gate.refresh().await;

    let result = gate.sign_in("richard@formacert.fr", "wrong").await;
    assert_matches!(
        result,
        Err(AuthError::Api(ApiError::Http { status: 401, .. }))
    );
    assert_eq!(gate.status(), AuthStatus::Unauthenticated);
}
