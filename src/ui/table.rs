use eframe::egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::{Dataset, Record};
use crate::state::AppState;

/// Rows shown by "Show Sample Data".
const SAMPLE_ROWS: usize = 10;

const COLUMNS: [&str; 20] = [
    "ID", "Name", "Sex", "Age", "Height", "Weight", "Team", "NOC", "Games", "Year", "Season",
    "City", "Sport", "Event", "Medal", "Type", "Country", "Gold", "Silver", "Bronze",
];

// ---------------------------------------------------------------------------
// Main page
// ---------------------------------------------------------------------------

/// Title, dataset description and the optional sample table.
pub fn main_page(ui: &mut Ui, state: &mut AppState) {
    ui.heading(RichText::new("OLYMPIC PERFORMANCE DASHBOARD 🥇 🥈 🥉").size(28.0));
    ui.label(
        RichText::new("Finding the best performing countries and athletes in the Olympics").strong(),
    );
    ui.separator();
    ui.label(
        "The Olympic Games are an international multi-sport event held every four years. \
         This dashboard presents insights and patterns across Olympic history, covering the \
         Summer and Winter Games from 1896 Athens to 2016 Rio de Janeiro.",
    );
    ui.add_space(8.0);

    ui.checkbox(&mut state.show_sample, "Show Sample Data");
    if state.show_sample {
        ui.label("💾 The Data:");
        sample_table(ui, &state.dataset);
        ui.label("Data displayed!");
    }
}

// ---------------------------------------------------------------------------
// Sample table
// ---------------------------------------------------------------------------

fn sample_table(ui: &mut Ui, dataset: &Dataset) {
    let rows = sample_rows(dataset, SAMPLE_ROWS);

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .columns(Column::auto(), COLUMNS.len())
        .header(20.0, |mut header| {
            for name in COLUMNS {
                header.col(|ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|mut body| {
            for cells in &rows {
                body.row(18.0, |mut row| {
                    for cell in cells {
                        row.col(|ui| {
                            ui.label(cell);
                        });
                    }
                });
            }
        });
}

/// The first `n` records rendered as text cells, in [`COLUMNS`] order.
fn sample_rows(dataset: &Dataset, n: usize) -> Vec<Vec<String>> {
    dataset.records().iter().take(n).map(cells).collect()
}

fn cells(rec: &Record) -> Vec<String> {
    fn text(v: &Option<String>) -> String {
        v.clone().unwrap_or_default()
    }
    fn number(v: Option<f64>) -> String {
        v.map(|x| x.to_string()).unwrap_or_default()
    }

    vec![
        rec.id.to_string(),
        text(&rec.name),
        rec.sex.clone(),
        number(rec.age),
        number(rec.height),
        number(rec.weight),
        text(&rec.team),
        rec.noc.clone(),
        text(&rec.games),
        rec.year.to_string(),
        rec.season.clone(),
        text(&rec.city),
        rec.sport.clone(),
        text(&rec.event),
        rec.medal.clone(),
        text(&rec.kind),
        text(&rec.country),
        rec.gold.to_string(),
        rec.silver.to_string(),
        rec.bronze.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;

    #[test]
    fn sample_is_capped_and_aligned_with_header() {
        let ds = Dataset::from_records((0..15).map(|i| record(i, Some("USA"), 2000, "Gold")).collect());
        let rows = sample_rows(&ds, SAMPLE_ROWS);
        assert_eq!(rows.len(), SAMPLE_ROWS);
        assert!(rows.iter().all(|r| r.len() == COLUMNS.len()));
        assert_eq!(rows[3][0], "3");
        assert_eq!(rows[3][16], "USA");
        assert_eq!(rows[3][17], "1");
    }
}
