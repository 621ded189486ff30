use std::collections::BTreeSet;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::filter::{CountryChoice, ALL_COUNTRIES};
use crate::state::{AppState, Page};
use crate::view::ViewKind;

// ---------------------------------------------------------------------------
// Left side panel – page, view and filter widgets
// ---------------------------------------------------------------------------

/// Render the left sidebar.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    ui.strong("Select Page");
    let mut page = state.page;
    for p in [Page::Main, Page::Visualizations] {
        ui.radio_value(&mut page, p, p.label());
    }
    state.page = page;

    if state.page == Page::Main {
        return;
    }
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.strong("Select Visualization");
            let mut view = state.view;
            for v in ViewKind::ALL {
                ui.radio_value(&mut view, v, v.label());
            }
            state.set_view(view);
            ui.separator();

            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all();
                }
                if ui.small_button("None").clicked() {
                    state.select_none();
                }
            });

            let seasons = state.dataset.seasons.clone();
            if let Some(value) = multiselect(ui, "Select Seasons", &seasons, &state.filters.seasons) {
                state.toggle_season(&value);
            }
            let types = state.dataset.types.clone();
            if let Some(value) = multiselect(ui, "Select Type", &types, &state.filters.types) {
                state.toggle_type(&value);
            }

            ui.separator();
            view_controls(ui, state);
        });
}

/// Collapsible checkbox list; returns the value whose checkbox was clicked.
fn multiselect(
    ui: &mut Ui,
    title: &str,
    all_values: &BTreeSet<String>,
    selected: &BTreeSet<String>,
) -> Option<String> {
    let header_text = format!("{title}  ({}/{})", selected.len(), all_values.len());
    let mut clicked = None;

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(title)
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            for val in all_values {
                let mut checked = selected.contains(val);
                if ui.checkbox(&mut checked, val.as_str()).changed() {
                    clicked = Some(val.clone());
                }
            }
        });
    clicked
}

/// The widgets specific to the selected view.
fn view_controls(ui: &mut Ui, state: &mut AppState) {
    let controls = state.view.controls();

    if controls.year_range {
        if let Some((lo, hi)) = state.dataset.year_bounds() {
            let (mut min, mut max) = state.filters.year_range.unwrap_or((lo, hi));
            ui.strong("Select a Year Range");
            let from = ui.add(egui::Slider::new(&mut min, lo..=hi).text("from"));
            let to = ui.add(egui::Slider::new(&mut max, lo..=hi).text("to"));
            if from.changed() || to.changed() {
                state.set_year_range(min, max);
            }
        }
    }

    if controls.year {
        let years = state.year_choices();
        if years.is_empty() {
            ui.label(RichText::new("No years available for this selection").italics());
        } else {
            let current = state.filters.year;
            let mut chosen = None;
            ui.strong("Select a Year");
            egui::ComboBox::from_id_salt("year")
                .selected_text(current.map(|y| y.to_string()).unwrap_or_default())
                .show_ui(ui, |ui: &mut Ui| {
                    for &year in years.iter().rev() {
                        if ui
                            .selectable_label(current == Some(year), year.to_string())
                            .clicked()
                        {
                            chosen = Some(year);
                        }
                    }
                });
            if let Some(year) = chosen {
                state.set_year(year);
            }
        }
    }

    if controls.country {
        let countries = state.country_choices();
        let current = state.filters.country.clone();
        let mut chosen = None;
        ui.strong("Select a Country");
        egui::ComboBox::from_id_salt("country")
            .selected_text(current.to_string())
            .show_ui(ui, |ui: &mut Ui| {
                if ui
                    .selectable_label(current == CountryChoice::All, ALL_COUNTRIES)
                    .clicked()
                {
                    chosen = Some(CountryChoice::All);
                }
                for name in &countries {
                    let option = CountryChoice::Only(name.clone());
                    if ui.selectable_label(current == option, name.as_str()).clicked() {
                        chosen = Some(option);
                    }
                }
            });
        if let Some(country) = chosen {
            state.set_country(country);
        }
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / status bar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("Page", |ui: &mut Ui| {
            for p in [Page::Main, Page::Visualizations] {
                if ui.selectable_label(state.page == p, p.label()).clicked() {
                    state.page = p;
                    ui.close_menu();
                }
            }
        });

        ui.separator();
        ui.label(format!("{} records loaded", state.dataset.len()));

        if state.page == Page::Visualizations {
            ui.separator();
            match &state.chart {
                Ok(spec) => {
                    ui.label(format!("{}: {} groups", state.view.label(), spec.table.len()));
                }
                Err(e) => {
                    ui.label(RichText::new(e.to_string()).color(Color32::RED));
                }
            }
        }
    });
}
