//! HTTP API Client
//!
//! Async client for the PHP backend. Every response is wrapped in an
//! `ApiEnvelope`; this module unwraps it and maps failures onto `ApiError`.
//!
//! Authenticated requests carry `Authorization: Bearer <token>` and an
//! `X-User-ID` header derived from the stored user.

use crate::egui_app::config::Config;
use crate::egui_app::local_db::{keys, LocalStorage};
use crate::shared::api::ApiEnvelope;
use crate::shared::error::ApiError;
use crate::shared::identity::{extract_user_id, UserId};
use crate::shared::records::{SyncRecord, User};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// Header carrying the current user id
pub const USER_ID_HEADER: &str = "X-User-ID";

/// Session credentials attached to requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub user_id: Option<UserId>,
}

/// Body of `POST /api/auth/login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `data` of a successful login
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Body of `POST /api/{table}/sync`
#[derive(Debug, Clone, Serialize)]
pub struct SyncPayload<'a, R> {
    #[serde(rename = "userId")]
    pub user_id: &'a str,
    pub records: &'a [R],
}

/// Qualiflow API client
///
/// Cloning is cheap and clones share credentials.
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: Config,
    client: Client,
    credentials: Arc<RwLock<Option<Credentials>>>,
}

impl ApiClient {
    pub fn new(config: Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            credentials: Arc::new(RwLock::new(None)),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_credentials(&self, credentials: Option<Credentials>) {
        match self.credentials.write() {
            Ok(mut guard) => *guard = credentials,
            Err(poisoned) => *poisoned.into_inner() = credentials,
        }
    }

    pub fn credentials(&self) -> Option<Credentials> {
        match self.credentials.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Load credentials from local storage (`authToken`, `currentUser`)
    ///
    /// Returns whether a token was found.
    pub async fn load_credentials(&self, storage: &LocalStorage) -> bool {
        let token = match storage.get_item(keys::AUTH_TOKEN).await {
            Ok(Some(token)) if !token.trim().is_empty() => token,
            Ok(_) => {
                self.set_credentials(None);
                return false;
            }
            Err(e) => {
                tracing::warn!("Failed to read auth token: {}", e);
                self.set_credentials(None);
                return false;
            }
        };

        let user: Option<User> = storage.get_json(keys::CURRENT_USER).await;
        self.set_credentials(Some(Credentials {
            token,
            user_id: extract_user_id(user),
        }));
        true
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials() {
            Some(credentials) => {
                let request = request.bearer_auth(&credentials.token);
                match credentials.user_id {
                    Some(user_id) => request.header(USER_ID_HEADER, user_id.as_str()),
                    None => request,
                }
            }
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>, ApiError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // The backend usually explains itself in the envelope
            let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|envelope| envelope.message)
                .unwrap_or_else(|| {
                    if body.trim().is_empty() {
                        status.to_string()
                    } else {
                        body.clone()
                    }
                });
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: ApiEnvelope<T> =
            serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))?;
        envelope.into_result()
    }

    /// `GET` an endpoint and unwrap its envelope
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, ApiError> {
        let url = self.config.api_url(path);
        tracing::debug!("GET {}", url);
        self.send(self.client.get(&url).query(query)).await
    }

    /// `POST` a JSON body and unwrap the envelope
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<T>, ApiError> {
        let url = self.config.api_url(path);
        tracing::debug!("POST {}", url);
        self.send(self.client.post(&url).json(body)).await
    }

    /// Fetch every record of `R::TABLE` owned by `user_id`
    pub async fn fetch_records<R: SyncRecord>(&self, user_id: &UserId) -> Result<Vec<R>, ApiError> {
        let path = format!("/api/{}", R::TABLE);
        let records: Option<Vec<R>> = self.get(&path, &[("userId", user_id.as_str())]).await?;
        Ok(records.unwrap_or_default())
    }

    /// Push local records and receive the server's canonical list
    ///
    /// `None` when the server acknowledges without sending records back.
    pub async fn push_records<R: SyncRecord>(
        &self,
        user_id: &UserId,
        records: &[R],
    ) -> Result<Option<Vec<R>>, ApiError> {
        if self.credentials().is_none() {
            return Err(ApiError::NotAuthenticated);
        }
        let path = format!("/api/{}/sync", R::TABLE);
        let payload = SyncPayload {
            user_id: user_id.as_str(),
            records,
        };
        self.post(&path, &payload).await
    }

    /// Exchange credentials for a session token
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: Option<LoginResponse> = self.post("/api/auth/login", &request).await?;
        response.ok_or_else(|| ApiError::Parse("login response has no data".to_string()))
    }

    /// Reachability check used by the network monitor
    pub async fn ping(&self) -> Result<(), ApiError> {
        let _: Option<serde_json::Value> = self.get("/api/health", &[]).await?;
        Ok(())
    }
}
