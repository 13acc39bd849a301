//! Theme Styling Functions

use super::colors;
use eframe::egui::{self, Stroke};

/// Apply the global theme to the egui context
pub fn apply_global_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    style.visuals = egui::Visuals::light();
    style.visuals.panel_fill = colors::CONTENT_BG;
    style.visuals.window_fill = colors::CARD_BG;
    style.visuals.window_stroke = Stroke::new(1.0, colors::CARD_BORDER);

    style.visuals.widgets.active.bg_fill = colors::ACCENT;
    style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, colors::TEXT_LIGHT);

    style.visuals.selection.bg_fill = colors::ACCENT;
    style.visuals.selection.stroke = Stroke::new(1.0, colors::TEXT_LIGHT);

    ctx.set_style(style);
}

/// Create a frame style for the top bar
pub fn top_bar_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(colors::TOP_BAR_BG)
        .inner_margin(egui::Margin::symmetric(12, 8))
}

/// Create a frame style for the navigation sidebar
pub fn sidebar_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(colors::SIDEBAR_BG)
        .inner_margin(egui::Margin::symmetric(8, 12))
}

/// Create a frame style for the main content area
pub fn content_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(colors::CONTENT_BG)
        .inner_margin(egui::Margin::same(16))
}

/// Create a frame style for dashboard cards
pub fn card_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(colors::CARD_BG)
        .stroke(Stroke::new(1.0, colors::CARD_BORDER))
        .corner_radius(egui::CornerRadius::same(6))
        .inner_margin(egui::Margin::same(12))
}
