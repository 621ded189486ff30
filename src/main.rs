mod app;
mod color;
mod config;
mod data;
mod error;
mod state;
mod ui;
mod view;

use anyhow::{Context, Result};
use app::MedalboardApp;
use config::DataSources;
use data::prepare::DatasetCache;
use eframe::egui;

fn main() -> Result<()> {
    env_logger::init();

    let sources = DataSources::load().context("loading configuration")?;

    // Prepared once; the app only ever reads it.
    let mut cache = DatasetCache::new();
    let dataset = match cache.get_or_prepare(&sources) {
        Ok(dataset) => dataset,
        Err(e) => {
            log::error!("Failed to prepare dataset: {e}");
            return Err(e).context("preparing the Olympic dataset");
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Medalboard – Olympic Results Explorer",
        options,
        Box::new(move |_cc| Ok(Box::new(MedalboardApp::new(dataset)))),
    )
    .map_err(|e| anyhow::anyhow!("running the UI: {e}"))
}
