//! Common test utilities and helpers

pub mod assertions;
pub mod fixtures;
pub mod mock_api;
pub mod storage;

pub use fixtures::*;
pub use mock_api::MockApi;
pub use storage::temp_storage;
