//! # Sync Metrics
//!
//! Per-resource counters for sync attempts: how many ran, how many
//! succeeded, and how long they took.

use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncMetrics {
    pub total_syncs: u64,
    pub successful_syncs: u64,
    pub failed_syncs: u64,
    /// Attempts refused because another one was running
    pub rejected_syncs: u64,
    pub average_sync_duration: Duration,
    pub last_sync_duration: Option<Duration>,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sync_start(&mut self) {
        self.total_syncs += 1;
    }

    pub fn record_sync_rejected(&mut self) {
        self.rejected_syncs += 1;
    }

    pub fn record_sync_success(&mut self, duration: Duration) {
        self.last_sync_duration = Some(duration);
        self.successful_syncs += 1;

        // Rolling average over successful attempts
        let total_duration =
            self.average_sync_duration * (self.successful_syncs - 1) as u32 + duration;
        self.average_sync_duration = total_duration / self.successful_syncs as u32;
    }

    pub fn record_sync_failure(&mut self, duration: Duration) {
        self.last_sync_duration = Some(duration);
        self.failed_syncs += 1;
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_syncs == 0 {
            0.0
        } else {
            self.successful_syncs as f64 / self.total_syncs as f64
        }
    }
}
