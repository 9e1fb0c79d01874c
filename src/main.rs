mod app;
mod config;
mod constants;
mod conversion;
mod events;
mod presets;
mod services;
mod state;
mod ui;

use app::ConverterApp;
use constants::{APP_NAME, APP_VERSION};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    tracing::info!("Starting {} v{}", APP_NAME, APP_VERSION);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([560.0, 720.0])
            .with_min_inner_size([480.0, 600.0])
            .with_title(APP_NAME)
            .with_resizable(true),
        ..Default::default()
    };

    let app_creator =
        move |_cc: &eframe::CreationContext| -> Box<dyn eframe::App> { Box::new(ConverterApp::new()) };

    eframe::run_native(APP_NAME, options, Box::new(app_creator))
        .map_err(|e| anyhow::anyhow!("GUI terminated with an error: {}", e))?;

    tracing::info!("Application shutting down");
    Ok(())
}
