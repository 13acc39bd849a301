//! Mock PHP API built on wiremock

use qualiflow::egui_app::api_client::Credentials;
use qualiflow::egui_app::{ApiClient, Config};
use qualiflow::shared::{AppConfig, UserId};
use serde::Serialize;
use serde_json::{json, Value};
use wiremock::MockServer;

/// A running mock server plus a matching client configuration
pub struct MockApi {
    pub server: MockServer,
}

impl MockApi {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Configuration pointing at the mock server
    pub fn config(&self, sync_interval_seconds: u64) -> Config {
        Config::with_builder(
            AppConfig::builder()
                .server_url(self.uri())
                .sync_interval_seconds(sync_interval_seconds)
                .request_timeout_seconds(5),
        )
        .expect("valid mock config")
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.config(30)).expect("build api client")
    }

    /// Client already carrying a bearer token and user id
    pub fn client_for(&self, token: &str, user_id: &str) -> ApiClient {
        let client = self.client();
        client.set_credentials(Some(Credentials {
            token: token.to_string(),
            user_id: UserId::parse(user_id),
        }));
        client
    }
}

/// `{ "success": true, "data": ... }`
pub fn envelope_ok(data: impl Serialize) -> Value {
    json!({ "success": true, "data": data })
}

/// `{ "success": true }` with no data
pub fn envelope_ack() -> Value {
    json!({ "success": true })
}

/// `{ "success": false, "message": ... }`
pub fn envelope_error(message: &str) -> Value {
    json!({ "success": false, "message": message })
}
