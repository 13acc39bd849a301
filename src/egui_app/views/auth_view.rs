use eframe::egui;

use crate::egui_app::state::AppState;
use crate::egui_app::theme::colors;

pub fn render(ui: &mut egui::Ui, state: &mut AppState) {
    let available_rect = ui.available_rect_before_wrap();

    ui.scope_builder(egui::UiBuilder::new().max_rect(available_rect), |ui| {
        ui.vertical_centered(|ui| {
            let top_space = (available_rect.height() - 260.0).max(0.0) / 2.0;
            ui.add_space(top_space);

            ui.label(egui::RichText::new("Qualiflow").size(32.0).strong().color(colors::TEXT_PRIMARY));
            ui.add_space(8.0);
            ui.label(egui::RichText::new("Connexion").size(20.0).color(colors::TEXT_SECONDARY));
            ui.add_space(20.0);

            if let Some(ref error) = state.login_error {
                ui.label(egui::RichText::new(error).color(colors::ERROR));
                ui.add_space(10.0);
            }

            let input_width = 280.0;
            ui.add_sized(
                [input_width, 28.0],
                egui::TextEdit::singleline(&mut state.email_input).hint_text("Email"),
            );
            ui.add_space(8.0);
            let password = ui.add_sized(
                [input_width, 28.0],
                egui::TextEdit::singleline(&mut state.password_input)
                    .password(true)
                    .hint_text("Mot de passe"),
            );
            ui.add_space(20.0);

            let submit = ui
                .add_enabled(
                    !state.login_pending,
                    egui::Button::new(egui::RichText::new("Se connecter").color(colors::TEXT_LIGHT))
                        .fill(colors::ACCENT)
                        .min_size(egui::vec2(input_width, 32.0)),
                )
                .clicked();
            let entered = password.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if (submit || entered) && !state.login_pending {
                state.handle_login();
            }

            if state.login_pending {
                ui.add_space(15.0);
                ui.spinner();
            }
        });
    });
}
