/**
 * Qualiflow Desktop Client - Main Entry Point
 *
 * Installs logging, loads the configuration, builds the application state
 * and runs the eframe window.
 */
use eframe::egui;
use qualiflow::egui_app::theme::styles;
use qualiflow::egui_app::{views, AppState, Config, StartupError};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("qualiflow=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Panics end up in the log instead of only on stderr
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("panic: {}", info);
        default_hook(info);
    }));
}

fn main() -> Result<(), eframe::Error> {
    init_tracing();

    let state = match Config::from_env()
        .map_err(StartupError::from)
        .and_then(AppState::new)
    {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Connecting to {}", state.config.server_url());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Qualiflow",
        options,
        Box::new(|cc| {
            styles::apply_global_theme(&cc.egui_ctx);
            Ok(Box::new(QualiflowApp { state }))
        }),
    )
}

struct QualiflowApp {
    state: AppState,
}

impl eframe::App for QualiflowApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll();

        views::render_top_bar(ctx, &mut self.state);
        views::render_sidebar(ctx, &mut self.state);
        views::render_main_panel(ctx, &mut self.state);

        // Sync state changes arrive from background tasks
        ctx.request_repaint_after(std::time::Duration::from_millis(500));
    }
}
