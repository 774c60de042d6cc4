// src/main.rs
use eframe::egui;
use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

mod analysis;
mod app;
mod config;
mod content;
mod dataset;
mod export;
mod file;
mod gateway;
mod state;
mod ui;
mod utils;
mod wizard;

use app::StatisticaApp;
use config::Settings;
use state::AppState;

/// RUST_LOG wins over the configured level.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

fn main() -> Result<()> {
    let (settings, load_error) = match Settings::load() {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };
    init_logging(&settings.log_level);
    if let Some(e) = load_error {
        warn!("Failed to load settings, using defaults: {:#}", e);
    }
    info!(api = %settings.api_base_url, export = %settings.export_base_url, "starting Statistica");

    let state = AppState::new(settings)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("Statistica"),
        ..Default::default()
    };

    eframe::run_native(
        "Statistica",
        options,
        Box::new(|_cc| Box::new(StatisticaApp::new(state))),
    ).map_err(|e| anyhow::anyhow!("Failed to run application: {}", e))
}
