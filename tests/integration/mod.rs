//! Integration tests against a mock API server

pub mod api_client_test;
pub mod auth_gate_test;
pub mod storage_test;
pub mod sync_scenario_test;
