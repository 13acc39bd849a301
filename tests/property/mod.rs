//! Property-based tests

pub mod identity_proptest;
pub mod sync_state_proptest;
