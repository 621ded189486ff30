use std::sync::Arc;

use eframe::egui;

use crate::data::model::Dataset;
use crate::state::{AppState, Page};
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct MedalboardApp {
    pub state: AppState,
}

impl MedalboardApp {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self {
            state: AppState::new(dataset),
        }
    }
}

impl eframe::App for MedalboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: page, view and filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: main page or chart ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.page {
            Page::Main => table::main_page(ui, &mut self.state),
            Page::Visualizations => plot::chart_panel(ui, &self.state),
        });
    }
}
