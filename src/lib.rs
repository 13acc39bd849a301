//! Qualiflow - Client Library
//!
//! Qualiflow (FormaCert) is a compliance management tool: documents,
//! requirements ("exigences"), members and users are stored by a PHP/MySQL
//! backend reached over HTTP. This crate is the native client core,
//! centred on keeping locally cached records in step with that server.
//!
//! # Module Structure
//!
//! - **`shared`** - Platform-agnostic types
//!   - Record DTOs, API envelope, identity extraction
//!   - Application events and the in-process event bus
//!   - Error types and application configuration
//!
//! - **`egui_app`** - Native desktop client (egui/eframe)
//!   - Local storage (SQLite through sqlx)
//!   - HTTP API client and authentication gate
//!   - Sync layer: state store, sync service, periodic hook, global manager
//!   - Status views
//!
//! # Sync Model
//!
//! Each resource ("documents", "exigences", ...) owns one `SyncState`
//! record. The record is mutated by a single actor task; views read it
//! through `tokio::sync::watch` receivers. At most one sync attempt per
//! resource is in flight at a time, and results from attempts that were
//! fenced off by a reset are discarded.
//!
//! ```rust,no_run
//! use qualiflow::egui_app::sync::sync_callback;
//! use qualiflow::egui_app::sync::sync_state::SyncStateStore;
//! use qualiflow::shared::EventBus;
//!
//! # async fn example() -> Result<(), qualiflow::shared::SyncError> {
//! let store = SyncStateStore::spawn();
//! let events = EventBus::default();
//! let service = qualiflow::egui_app::sync::service::SyncService::new("documents", store, events);
//!
//! let handle = service.setup_periodic_sync(sync_callback(|| async { Ok(()) }), 30)?;
//! assert!(!service.is_syncing().await?);
//! handle.cancel();
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! - `Result<T, E>` for fallible operations, with `thiserror` enums in
//!   `shared::error`, `shared::config` and `egui_app::local_db`
//! - Network and storage failures are recovered where the I/O happens;
//!   corrupted persisted data falls back to defaults with a warning

/// Shared types and data structures
pub mod shared;

/// egui native desktop client
/// Only compiled for native targets (not WASM)
#[cfg(not(target_arch = "wasm32"))]
pub mod egui_app;
