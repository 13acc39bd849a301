use chrono::Utc;
use eframe::egui;

use crate::egui_app::auth::{AuthStatus, Route, RouteDecision};
use crate::egui_app::state::AppState;
use crate::egui_app::theme::{colors, styles};

pub mod auth_view;
pub mod dashboard_view;
pub mod records_view;
pub mod sync_indicator;

pub fn render_top_bar(ctx: &egui::Context, state: &mut AppState) {
    egui::TopBottomPanel::top("top_panel")
        .frame(styles::top_bar_frame())
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.colored_label(colors::TEXT_LIGHT, egui::RichText::new("Qualiflow").size(18.0).strong());

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.add_space(16.0);

                    if let AuthStatus::Authenticated(session) = state.auth_status() {
                        if ui.button("Logout").clicked() {
                            state.logout();
                        }
                        ui.colored_label(colors::TEXT_LIGHT, session.user.display_name());
                        ui.add_space(16.0);
                    }

                    if state.is_online() {
                        ui.colored_label(colors::STATUS_ONLINE, "● Online");
                    } else {
                        ui.colored_label(colors::STATUS_OFFLINE, "● Offline");
                    }
                });
            });
        });
}

pub fn render_sidebar(ctx: &egui::Context, state: &mut AppState) {
    if !state.auth_status().is_authenticated() {
        return;
    }

    egui::SidePanel::left("navigation")
        .frame(styles::sidebar_frame())
        .resizable(false)
        .exact_width(180.0)
        .show(ctx, |ui| {
            for route in Route::AUTHENTICATED {
                let selected = state.route == route;
                let text = egui::RichText::new(route.title()).color(colors::TEXT_LIGHT);
                let button = egui::Button::new(text)
                    .fill(if selected { colors::SIDEBAR_SELECTED } else { colors::SIDEBAR_BG })
                    .min_size(egui::vec2(ui.available_width(), 28.0));
                if ui.add(button).clicked() {
                    state.route = route;
                }
            }

            ui.with_layout(egui::Layout::bottom_up(egui::Align::Min), |ui| {
                ui.label(
                    egui::RichText::new(state.global_status_line(Utc::now()))
                        .small()
                        .color(colors::TEXT_LIGHT),
                );
            });
        });
}

pub fn render_main_panel(ctx: &egui::Context, state: &mut AppState) {
    egui::CentralPanel::default()
        .frame(styles::content_frame())
        .show(ctx, |ui| match crate::egui_app::auth::decide(&state.auth_status(), state.route) {
            RouteDecision::ShowLoading => {
                ui.centered_and_justified(|ui| ui.spinner());
            }
            // Redirects are applied by AppState::poll on the next frame
            RouteDecision::RedirectToLogin | RouteDecision::RedirectToHome => {}
            RouteDecision::Render => match state.route {
                Route::Login => auth_view::render(ui, state),
                Route::Dashboard => dashboard_view::render(ui, state),
                Route::Documents => records_view::render_documents(ui, state),
                Route::Exigences => records_view::render_exigences(ui, state),
                Route::Membres => records_view::render_membres(ui, state),
                Route::Users => records_view::render_account(ui, state),
            },
        });
}
