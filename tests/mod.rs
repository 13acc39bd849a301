//! Test suite for the Qualiflow client
//!
//! Integration tests run against a wiremock server standing in for the
//! PHP API; property tests cover the sync state and identity invariants.

pub mod common;
pub mod integration;
pub mod property;
