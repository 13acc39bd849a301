use chrono::Utc;
use eframe::egui;

use crate::egui_app::state::AppState;
use crate::egui_app::theme::colors;
use crate::egui_app::views::sync_indicator::{self, IndicatorModel};
use crate::shared::records::{Document, Exigence, Member, SyncRecord};

fn header(ui: &mut egui::Ui, state: &AppState, title: &str, table: &str) {
    ui.horizontal(|ui| {
        ui.heading(egui::RichText::new(title).color(colors::TEXT_PRIMARY));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Sync now").clicked() {
                state.sync_now(table);
            }
        });
    });
    let model = IndicatorModel::from_state(&state.table_state(table), Utc::now());
    sync_indicator::render(ui, &model);
    ui.separator();
}

fn empty(ui: &mut egui::Ui) {
    ui.label(egui::RichText::new("Aucun élément").color(colors::TEXT_SECONDARY));
}

pub fn render_documents(ui: &mut egui::Ui, state: &mut AppState) {
    header(ui, state, "Documents", Document::TABLE);
    let documents = state.documents.records().snapshot();
    if documents.is_empty() {
        return empty(ui);
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        egui::Grid::new("documents_grid").striped(true).show(ui, |ui| {
            ui.strong("Nom");
            ui.strong("Description");
            ui.strong("Modifié");
            ui.end_row();
            for document in &documents {
                ui.label(&document.name);
                ui.label(document.description.as_deref().unwrap_or("-"));
                ui.label(document.date_modification.as_deref().unwrap_or("-"));
                ui.end_row();
            }
        });
    });
}

pub fn render_exigences(ui: &mut egui::Ui, state: &mut AppState) {
    header(ui, state, "Exigences", Exigence::TABLE);
    let exigences = state.exigences.records().snapshot();
    if exigences.is_empty() {
        return empty(ui);
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        egui::Grid::new("exigences_grid").striped(true).show(ui, |ui| {
            ui.strong("Exigence");
            ui.strong("Statut");
            ui.end_row();
            for exigence in &exigences {
                ui.label(&exigence.nom);
                ui.label(exigence.status.label());
                ui.end_row();
            }
        });
    });
}

pub fn render_membres(ui: &mut egui::Ui, state: &mut AppState) {
    header(ui, state, "Membres", Member::TABLE);
    let membres = state.membres.records().snapshot();
    if membres.is_empty() {
        return empty(ui);
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        egui::Grid::new("membres_grid").striped(true).show(ui, |ui| {
            ui.strong("Nom");
            ui.strong("Prénom");
            ui.strong("Fonction");
            ui.end_row();
            for membre in &membres {
                ui.label(&membre.nom);
                ui.label(&membre.prenom);
                ui.label(membre.fonction.as_deref().unwrap_or("-"));
                ui.end_row();
            }
        });
    });
}

/// The signed-in account
pub fn render_account(ui: &mut egui::Ui, state: &mut AppState) {
    ui.heading(egui::RichText::new("Utilisateurs").color(colors::TEXT_PRIMARY));
    ui.separator();

    let status = state.auth_status();
    let Some(session) = status.session() else {
        return;
    };
    egui::Grid::new("account_grid").show(ui, |ui| {
        ui.strong("Identifiant");
        ui.label(session.user_id.as_str());
        ui.end_row();
        ui.strong("Email");
        ui.label(&session.user.email);
        ui.end_row();
        ui.strong("Nom");
        ui.label(session.user.display_name());
        ui.end_row();
        ui.strong("Rôle");
        ui.label(session.role.as_deref().unwrap_or("-"));
        ui.end_row();
    });
}
