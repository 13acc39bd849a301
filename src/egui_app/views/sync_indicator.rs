//! Sync status indicator
//!
//! A read-only view of one resource's `SyncState`: a colored dot, a spinner
//! while an attempt is in flight, a pending-changes marker and the time
//! since the last successful sync.

use chrono::{DateTime, Utc};
use eframe::egui::{self, Color32};

use crate::egui_app::sync::{SyncPhase, SyncState};
use crate::egui_app::theme::colors;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorModel {
    pub color: Color32,
    pub status: &'static str,
    pub spinner: bool,
    pub pending: bool,
    pub last_sync: String,
    pub error: Option<String>,
}

impl IndicatorModel {
    pub fn from_state(state: &SyncState, now: DateTime<Utc>) -> Self {
        let (color, status) = match state.phase {
            SyncPhase::Idle => (colors::SYNC_IDLE, "Not synced"),
            SyncPhase::Syncing => (colors::SYNC_ACTIVE, "Syncing"),
            SyncPhase::Failed => (colors::SYNC_FAILED, "Sync failed"),
            SyncPhase::Synced => (colors::SYNC_OK, "Synced"),
        };

        Self {
            color,
            status,
            spinner: state.is_syncing(),
            pending: state.has_pending_changes,
            last_sync: relative_label(state.last_synced, now),
            error: state.error_message.clone(),
        }
    }
}

/// Human label for the time elapsed since `then`
pub fn relative_label(then: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(then) = then else {
        return "never".to_string();
    };

    let elapsed = now.signed_duration_since(then);
    if elapsed.num_seconds() < 60 {
        "just now".to_string()
    } else if elapsed.num_minutes() < 60 {
        format!("{} min ago", elapsed.num_minutes())
    } else if elapsed.num_hours() < 24 {
        format!("{} h ago", elapsed.num_hours())
    } else {
        then.format("%Y-%m-%d %H:%M").to_string()
    }
}

pub fn render(ui: &mut egui::Ui, model: &IndicatorModel) {
    ui.horizontal(|ui| {
        let (rect, response) = ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
        ui.painter().circle_filled(rect.center(), 5.0, model.color);
        if let Some(ref error) = model.error {
            response.on_hover_text(error);
        }

        if model.spinner {
            ui.spinner();
        }
        ui.label(egui::RichText::new(model.status).color(colors::TEXT_PRIMARY));
        ui.label(
            egui::RichText::new(format!("Last sync: {}", model.last_sync))
                .small()
                .color(colors::TEXT_SECONDARY),
        );
        if model.pending {
            ui.label(
                egui::RichText::new("● unsaved changes")
                    .small()
                    .color(colors::SYNC_ACTIVE),
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_fresh_state_is_grey_and_never_synced() {
        let model = IndicatorModel::from_state(&SyncState::default(), Utc::now());
        assert_eq!(model.color, colors::SYNC_IDLE);
        assert_eq!(model.last_sync, "never");
        assert!(!model.spinner);
        assert!(!model.pending);
    }

    #[test]
    fn test_phase_colors() {
        let now = Utc::now();
        let syncing = SyncState {
            phase: SyncPhase::Syncing,
            ..Default::default()
        };
        let failed = SyncState {
            phase: SyncPhase::Failed,
            error_message: Some("HTTP 500: boom".to_string()),
            ..Default::default()
        };
        let synced = SyncState {
            phase: SyncPhase::Synced,
            last_synced: Some(now),
            has_pending_changes: true,
            ..Default::default()
        };

        let model = IndicatorModel::from_state(&syncing, now);
        assert_eq!(model.color, colors::SYNC_ACTIVE);
        assert!(model.spinner);

        let model = IndicatorModel::from_state(&failed, now);
        assert_eq!(model.color, colors::SYNC_FAILED);
        assert_eq!(model.error.as_deref(), Some("HTTP 500: boom"));

        let model = IndicatorModel::from_state(&synced, now);
        assert_eq!(model.color, colors::SYNC_OK);
        assert!(model.pending);
        assert_eq!(model.last_sync, "just now");
    }

    #[test]
    fn test_relative_labels() {
        let now = Utc::now();
        assert_eq!(relative_label(Some(now - Duration::seconds(59)), now), "just now");
        assert_eq!(relative_label(Some(now - Duration::minutes(5)), now), "5 min ago");
        assert_eq!(relative_label(Some(now - Duration::hours(3)), now), "3 h ago");
        // Clock skew
        assert_eq!(relative_label(Some(now + Duration::seconds(30)), now), "just now");

        let old = now - Duration::days(3);
        assert_eq!(
            relative_label(Some(old), now),
            old.format("%Y-%m-%d %H:%M").to_string()
        );
    }
}
