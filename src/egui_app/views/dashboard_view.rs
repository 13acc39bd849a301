use chrono::Utc;
use eframe::egui;

use crate::egui_app::state::AppState;
use crate::egui_app::theme::{colors, styles};
use crate::egui_app::views::sync_indicator::{self, IndicatorModel};

/// One card per tracked table with its sync status
pub fn render(ui: &mut egui::Ui, state: &mut AppState) {
    let now = Utc::now();

    ui.horizontal(|ui| {
        ui.heading(egui::RichText::new("Tableau de bord").color(colors::TEXT_PRIMARY));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Sync all").clicked() {
                state.sync_all_now();
            }
        });
    });
    ui.label(egui::RichText::new(state.global_status_line(now)).color(colors::TEXT_SECONDARY));
    ui.add_space(12.0);

    let tables = state.tracked_tables().to_vec();
    for table in tables {
        let model = IndicatorModel::from_state(&state.table_state(&table), now);
        let count = state.record_count(&table);

        styles::card_frame().show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(&table).strong().color(colors::TEXT_PRIMARY));
                ui.label(egui::RichText::new(format!("{} records", count)).color(colors::TEXT_SECONDARY));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.add_enabled(!model.spinner, egui::Button::new("Sync now")).clicked() {
                        state.sync_now(&table);
                    }
                });
            });
            sync_indicator::render(ui, &model);
        });
        ui.add_space(8.0);
    }
}
