//! egui Native Desktop App Module
//!
//! Desktop client for the Qualiflow compliance API: session handling,
//! local storage, and the sync layer that keeps local record collections
//! in step with the server.
//!
//! # Architecture
//!
//! - **`config`** - Configuration (server URL, intervals, storage path)
//! - **`api_client`** - HTTP client for the PHP API
//! - **`local_db`** - Persisted key/value client state (SQLite)
//! - **`auth`** - Session state and route guard
//! - **`sync`** - Sync state, services, periodic hooks and the global manager
//! - **`state`** - Application state wiring for the UI
//! - **`views`** - egui screens and status indicators
//! - **`theme`** - Colors and frame styles
//! - **`main`** - Main application entry point (binary)
//!
//! # Module Structure
//!
//! ```text
//! egui_app/
//! ├── mod.rs        - Module exports and documentation
//! ├── main.rs       - Main application entry point
//! ├── config.rs     - Configuration management
//! ├── api_client.rs - HTTP API client
//! ├── auth.rs       - Authentication gate
//! ├── local_db/     - Local storage
//! ├── sync/         - Sync layer
//! ├── state/        - Application state
//! ├── theme/        - Theme
//! └── views/        - Screens
//! ```

pub mod api_client;
pub mod auth;
pub mod config;
pub mod local_db;
pub mod state;
pub mod sync;
pub mod theme;
pub mod views;

// Re-export commonly used types
pub use api_client::ApiClient;
pub use auth::{AuthGate, AuthStatus, Route, RouteDecision};
pub use config::Config;
pub use local_db::LocalStorage;
pub use state::{AppState, StartupError};
