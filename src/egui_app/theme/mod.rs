//! Theme Module
//!
//! Color scheme and frame builders shared by every view.
//!
//! # Usage
//!
//! ```rust,no_run
//! use qualiflow::egui_app::theme::{colors, styles};
//! # fn paint(ctx: &eframe::egui::Context, ui: &mut eframe::egui::Ui) {
//! styles::apply_global_theme(ctx);
//! styles::card_frame().show(ui, |ui| {
//!     ui.colored_label(colors::TEXT_SECONDARY, "Documents");
//! });
//! # }
//! ```

pub mod colors;
pub mod styles;
