//! API client against the mock server: headers, envelopes, error mapping

use crate::common::mock_api::{envelope_ack, envelope_error, envelope_ok};
use crate::common::{documents_for, richard, MockApi, RICHARD};
use crate::{assert_contains, assert_err, assert_ok};
use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use qualiflow::egui_app::api_client::USER_ID_HEADER;
use qualiflow::egui_app::{ApiClient, Config};
use qualiflow::shared::{ApiError, AppConfig, Document, UserId};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn richard_id() -> UserId {
    UserId::parse(RICHARD).unwrap()
}

#[tokio::test]
async fn test_fetch_records_sends_session_headers() {
    let api = MockApi::start().await;
    Mock::given(method("GET"))
        .and(path("/api/documents"))
        .and(query_param("userId", RICHARD))
        .and(header("Authorization", "Bearer token-1"))
        .and(header(USER_ID_HEADER, RICHARD))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope_ok(documents_for(RICHARD, 2))))
        .expect(1)
        .mount(&api.server)
        .await;

    let client = api.client_for("token-1", RICHARD);
    let docs: Vec<Document> = assert_ok!(client.fetch_records(&richard_id()).await);

    assert_eq!(docs, documents_for(RICHARD, 2));
}

#[tokio::test]
async fn test_fetch_without_data_is_empty() {
    let api = MockApi::start().await;
    Mock::given(method("GET"))
        .and(path("/api/documents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope_ack()))
        .mount(&api.server)
        .await;

    let client = api.client_for("token-1", RICHARD);
    let docs: Vec<Document> = assert_ok!(client.fetch_records(&richard_id()).await);
    assert!(docs.is_empty());
}

#[tokio::test]
async fn test_push_records_posts_user_and_records() {
    let api = MockApi::start().await;
    Mock::given(method("POST"))
        .and(path("/api/documents/sync"))
        .and(body_partial_json(json!({
            "userId": RICHARD,
            "records": [{ "id": "p71x6d_richard-1", "userId": RICHARD }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope_ack()))
        .expect(1)
        .mount(&api.server)
        .await;

    let client = api.client_for("token-1", RICHARD);
    let canonical = assert_ok!(
        client
            .push_records(&richard_id(), &documents_for(RICHARD, 1))
            .await
    );

    // An acknowledgement carries no list
    assert_eq!(canonical, None);
}

#[tokio::test]
async fn test_push_requires_credentials() {
    let api = MockApi::start().await;
    let client = api.client();

    assert_err!(
        client
            .push_records(&richard_id(), &documents_for(RICHARD, 1))
            .await,
        ApiError::NotAuthenticated
    );
}

#[tokio::test]
async fn test_http_error_uses_envelope_message() {
    let api = MockApi::start().await;
    Mock::given(method("GET"))
        .and(path("/api/exigences"))
        .respond_with(ResponseTemplate::new(500).set_body_json(envelope_error("Database unavailable")))
        .mount(&api.server)
        .await;

    let client = api.client_for("token-1", RICHARD);
    let result = client
        .fetch_records::<qualiflow::shared::Exigence>(&richard_id())
        .await;

    assert_eq!(
        result,
        Err(ApiError::Http {
            status: 500,
            message: "Database unavailable".to_string()
        })
    );
}

#[tokio::test]
async fn test_unauthorized_is_an_auth_error() {
    let api = MockApi::start().await;
    Mock::given(method("GET"))
        .and(path("/api/documents"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&api.server)
        .await;

    let client = api.client_for("expired", RICHARD);
    let err = client
        .fetch_records::<Document>(&richard_id())
        .await
        .unwrap_err();

    assert!(err.is_auth_error());
}

#[tokio::test]
async fn test_rejected_envelope() {
    let api = MockApi::start().await;
    Mock::given(method("POST"))
        .and(path("/api/documents/sync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope_error("Quota exceeded")))
        .mount(&api.server)
        .await;

    let client = api.client_for("token-1", RICHARD);
    let err = client
        .push_records(&richard_id(), &documents_for(RICHARD, 1))
        .await
        .unwrap_err();

    assert_matches!(err, ApiError::Rejected { status: None, .. });
    assert_contains!(err.to_string(), "Quota exceeded");
}

#[tokio::test]
async fn test_malformed_body_is_a_parse_error() {
    let api = MockApi::start().await;
    Mock::given(method("GET"))
        .and(path("/api/documents"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&api.server)
        .await;

    let client = api.client_for("token-1", RICHARD);
    assert_err!(
        client.fetch_records::<Document>(&richard_id()).await,
        ApiError::Parse(_)
    );
}

#[tokio::test]
async fn test_login_returns_token_and_user() {
    let api = MockApi::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_partial_json(json!({
            "email": "richard@formacert.fr",
            "password": "secret"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope_ok(json!({ "token": "token-1", "user": richard() }))),
        )
        .expect(1)
        .mount(&api.server)
        .await;

    let response = assert_ok!(api.client().login("richard@formacert.fr", "secret").await);
    assert_eq!(response.token, "token-1");
    assert_eq!(response.user, richard());
}

#[tokio::test]
async fn test_unreachable_server_is_a_network_error() {
    let config = Config::with_builder(
        AppConfig::builder()
            .server_url("http://127.0.0.1:9")
            .request_timeout_seconds(2),
    )
    .unwrap();
    let client = ApiClient::new(config).unwrap();

    assert_err!(client.ping().await, ApiError::Network(_));
}
