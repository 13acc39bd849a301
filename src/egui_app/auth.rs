//! Authentication Module
//!
//! Session state derived from local storage, and the route guard built on
//! it. The gate starts in `Loading`, settles on `Authenticated` or
//! `Unauthenticated` after the first read, and re-reads storage whenever
//! an `auth-changed` event is published or the re-check interval elapses.
//!
//! Unreadable session data never surfaces as an error: it is logged and
//! treated as "no user".

use crate::egui_app::api_client::{ApiClient, Credentials};
use crate::egui_app::local_db::{keys, LocalStorage, StorageError};
use crate::shared::error::ApiError;
use crate::shared::event::{AppEvent, EventBus, EventType};
use crate::shared::identity::{extract_user_id, UserId};
use crate::shared::records::User;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Signed-in user
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub user_id: UserId,
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthStatus {
    #[default]
    Loading,
    Authenticated(Session),
    Unauthenticated,
}

impl AuthStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthStatus::Authenticated(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthStatus::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.session().map(|s| &s.user_id)
    }
}

/// Application screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    Documents,
    Exigences,
    Membres,
    Users,
}

impl Route {
    pub const AUTHENTICATED: [Route; 5] = [
        Route::Dashboard,
        Route::Documents,
        Route::Exigences,
        Route::Membres,
        Route::Users,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Connexion",
            Route::Dashboard => "Tableau de bord",
            Route::Documents => "Documents",
            Route::Exigences => "Exigences",
            Route::Membres => "Membres",
            Route::Users => "Utilisateurs",
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login)
    }

    /// Table synced on this screen, if any
    pub fn table(&self) -> Option<&'static str> {
        match self {
            Route::Documents => Some("documents"),
            Route::Exigences => Some("exigences"),
            Route::Membres => Some("membres"),
            _ => None,
        }
    }
}

/// What to show for a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    ShowLoading,
    Render,
    RedirectToLogin,
    RedirectToHome,
}

pub fn decide(status: &AuthStatus, route: Route) -> RouteDecision {
    match (status, route.requires_auth()) {
        (AuthStatus::Loading, _) => RouteDecision::ShowLoading,
        (AuthStatus::Authenticated(_), true) => RouteDecision::Render,
        (AuthStatus::Authenticated(_), false) => RouteDecision::RedirectToHome,
        (AuthStatus::Unauthenticated, true) => RouteDecision::RedirectToLogin,
        (AuthStatus::Unauthenticated, false) => RouteDecision::Render,
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The server accepted the login but sent an unusable user
    #[error("login response has no user identifier")]
    MissingUserId,
}

/// Session state and route guard
#[derive(Debug, Clone)]
pub struct AuthGate {
    storage: LocalStorage,
    events: EventBus,
    api: Option<ApiClient>,
    status: watch::Sender<AuthStatus>,
    user_id: watch::Sender<Option<UserId>>,
    recheck: Duration,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl AuthGate {
    pub fn new(storage: LocalStorage, events: EventBus, recheck: Duration) -> Self {
        let (status, _) = watch::channel(AuthStatus::Loading);
        let (user_id, _) = watch::channel(None);
        Self {
            storage,
            events,
            api: None,
            status,
            user_id,
            recheck,
            task: Arc::new(Mutex::new(None)),
        }
    }

    /// Keep the client's credentials in step with the session
    pub fn with_api_client(mut self, api: ApiClient) -> Self {
        self.api = Some(api);
        self
    }

    pub fn status(&self) -> AuthStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.status.subscribe()
    }

    pub fn watch_user_id(&self) -> watch::Receiver<Option<UserId>> {
        self.user_id.subscribe()
    }

    pub fn guard(&self, route: Route) -> RouteDecision {
        decide(&self.status.borrow(), route)
    }

    /// Re-read the session from local storage
    pub async fn refresh(&self) -> AuthStatus {
        let status = self.read_session().await;
        self.publish(status.clone());
        status
    }

    async fn read_session(&self) -> AuthStatus {
        let token = match self.storage.get_item(keys::AUTH_TOKEN).await {
            Ok(Some(token)) if !token.trim().is_empty() => token,
            Ok(_) => return AuthStatus::Unauthenticated,
            Err(e) => {
                tracing::warn!("[Auth] Cannot read session token: {}", e);
                return AuthStatus::Unauthenticated;
            }
        };

        // get_json logs and swallows malformed values
        let Some(user) = self.storage.get_json::<User>(keys::CURRENT_USER).await else {
            return AuthStatus::Unauthenticated;
        };
        let Some(user_id) = extract_user_id(&user) else {
            tracing::warn!("[Auth] Stored user has no identifier");
            return AuthStatus::Unauthenticated;
        };

        let role = match self.storage.get_item(keys::USER_ROLE).await {
            Ok(Some(role)) => Some(role),
            _ => user.role.clone(),
        };

        AuthStatus::Authenticated(Session {
            token,
            user,
            user_id,
            role,
        })
    }

    fn publish(&self, status: AuthStatus) {
        if let Some(api) = &self.api {
            api.set_credentials(status.session().map(|session| Credentials {
                token: session.token.clone(),
                user_id: Some(session.user_id.clone()),
            }));
        }

        let user_id = status.user_id().cloned();
        self.user_id.send_if_modified(|current| {
            let changed = *current != user_id;
            *current = user_id;
            changed
        });
        self.status.send_if_modified(|current| {
            let changed = *current != status;
            *current = status;
            changed
        });
    }

    /// Persist a new session and announce it
    pub async fn login(&self, token: &str, user: &User) -> Result<AuthStatus, AuthError> {
        if extract_user_id(user).is_none() {
            return Err(AuthError::MissingUserId);
        }
        self.storage.set_item(keys::AUTH_TOKEN, token).await?;
        self.storage.set_json(keys::CURRENT_USER, user).await?;
        match &user.role {
            Some(role) => self.storage.set_item(keys::USER_ROLE, role).await?,
            None => self.storage.remove_item(keys::USER_ROLE).await?,
        }

        let status = self.refresh().await;
        tracing::info!("[Auth] Signed in as {}", user.email);
        self.events.publish(AppEvent::auth_changed());
        Ok(status)
    }

    /// Exchange credentials with the API, then persist the session
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthStatus, AuthError> {
        let api = self.api.as_ref().ok_or(ApiError::InvalidRequest(
            "no API client attached".to_string(),
        ))?;
        let response = api.login(email, password).await?;
        self.login(&response.token, &response.user).await
    }

    pub async fn logout(&self) -> Result<(), AuthError> {
        self.storage.remove_item(keys::AUTH_TOKEN).await?;
        self.storage.remove_item(keys::CURRENT_USER).await?;
        self.storage.remove_item(keys::USER_ROLE).await?;

        self.refresh().await;
        tracing::info!("[Auth] Signed out");
        self.events.publish(AppEvent::auth_changed());
        Ok(())
    }

    /// Read the session now, then on every `auth-changed` and re-check tick
    ///
    /// The watcher task holds a clone of the gate, so the gate stays alive
    /// until [`AuthGate::stop`] is called even when every other handle is
    /// dropped. Returns `false` if already started.
    pub fn start(&self) -> bool {
        let mut task = match self.task.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return false;
        }

        let gate = self.clone();
        let events = self.events.subscribe();
        *task = Some(tokio::spawn(gate.watch(events)));
        true
    }

    async fn watch(self, mut events: broadcast::Receiver<AppEvent>) {
        self.refresh().await;

        let mut ticker = tokio::time::interval_at(Instant::now() + self.recheck, self.recheck);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                event = events.recv() => match event {
                    Ok(event) if event.event_type == EventType::AuthChanged => {}
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
            self.refresh().await;
        }
    }

    pub fn stop(&self) -> bool {
        let mut task = match self.task.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match task.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}
