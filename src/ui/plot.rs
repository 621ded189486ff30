use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_plot::{Bar, BarChart, GridInput, GridMark, Legend, Line, Plot, PlotPoints, Points};

use crate::color::{medal_color, sequential, sex_color, ColorMap};
use crate::data::aggregate::AggTable;
use crate::data::model::Value;
use crate::state::AppState;
use crate::view::{ChartKind, ChartSpec};

/// Points of one coloured series, keyed by the series value
/// (`Value::Null` when the chart has a single series).
type SeriesMap = BTreeMap<Value, Vec<(Value, f64)>>;

// ---------------------------------------------------------------------------
// Chart panel (central panel on the visualizations page)
// ---------------------------------------------------------------------------

/// Render the selected view's chart, or an empty chart with a notice.
pub fn chart_panel(ui: &mut Ui, state: &AppState) {
    ui.heading("VISUALIZATIONS 🥇 🥈 🥉");
    ui.separator();

    let spec = match &state.chart {
        Ok(spec) => spec,
        Err(e) => {
            ui.label(RichText::new(e.to_string()).italics());
            Plot::new("empty_plot")
                .allow_drag(false)
                .allow_zoom(false)
                .show(ui, |_| {});
            return;
        }
    };

    ui.heading(&spec.title);
    match spec.kind {
        ChartKind::Choropleth => choropleth(ui, spec),
        ChartKind::Bar => bar_chart(ui, spec, false),
        ChartKind::StackedBar => bar_chart(ui, spec, true),
        ChartKind::Line => line_chart(ui, spec),
        ChartKind::Scatter => scatter_chart(ui, spec),
        ChartKind::Sunburst => sunburst(ui, spec),
    }
}

// ---------------------------------------------------------------------------
// Table → plot coordinates
// ---------------------------------------------------------------------------

/// Distinct x values (first key column) in table order.
fn categories(table: &AggTable) -> Vec<Value> {
    let mut seen = BTreeSet::new();
    table
        .rows
        .iter()
        .filter_map(|row| row.first())
        .filter(|v| seen.insert((*v).clone()))
        .cloned()
        .collect()
}

/// Numeric x values are used as-is; text is placed at its category index.
fn x_coord(x: &Value, categories: &[Value]) -> f64 {
    x.as_f64()
        .or_else(|| categories.iter().position(|c| c == x).map(|i| i as f64))
        .unwrap_or(0.0)
}

/// Group the table rows into series by the chart's series column.
fn split_series(spec: &ChartSpec) -> SeriesMap {
    let series_idx = spec
        .series
        .and_then(|field| spec.table.column(field.name()));

    let mut series = SeriesMap::new();
    for row in &spec.table.rows {
        let Some(x) = row.first() else { continue };
        let key = series_idx
            .and_then(|i| row.get(i).cloned())
            .unwrap_or(Value::Null);
        series
            .entry(key)
            .or_default()
            .push((x.clone(), AggTable::metric(row) as f64));
    }
    series
}

/// Bar heights per series, one slot per category (0 where a series has no
/// row for it), so index `i` is the same category in every series.
fn aligned_series(spec: &ChartSpec, categories: &[Value]) -> BTreeMap<Value, Vec<f64>> {
    let mut aligned = BTreeMap::new();
    for (key, points) in split_series(spec) {
        let mut heights = vec![0.0; categories.len()];
        for (x, y) in points {
            if let Some(i) = categories.iter().position(|c| *c == x) {
                heights[i] += y;
            }
        }
        aligned.insert(key, heights);
    }
    aligned
}

fn category_label(categories: &[Value], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    categories
        .get(idx as usize)
        .map(|v| v.to_string())
        .unwrap_or_default()
}

/// Grid marks at every multiple of `step` inside `bounds`.
fn fixed_marks(bounds: (f64, f64), step: f64) -> Vec<GridMark> {
    if step <= 0.0 || !bounds.0.is_finite() || !bounds.1.is_finite() {
        return Vec::new();
    }
    let mut marks = Vec::new();
    let mut value = (bounds.0 / step).ceil() * step;
    while value <= bounds.1 && marks.len() < 1000 {
        marks.push(GridMark {
            value,
            step_size: step,
        });
        value += step;
    }
    marks
}

/// Axis labels, legend and category ticks shared by the x/y charts.
fn base_plot(spec: &ChartSpec, categories: Vec<Value>) -> Plot<'static> {
    let mut plot = Plot::new(spec.title.clone())
        .legend(Legend::default())
        .x_axis_label(spec.x_label.clone())
        .y_axis_label(spec.y_label.clone())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);

    let categorical = categories.iter().any(|c| c.as_f64().is_none());
    if categorical {
        plot = plot
            .x_grid_spacer(|input: GridInput| fixed_marks(input.bounds, 1.0))
            .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
                category_label(&categories, mark.value)
            });
    } else if let Some(step) = spec.x_tick_step {
        let step = step as f64;
        plot = plot.x_grid_spacer(move |input: GridInput| fixed_marks(input.bounds, step));
    }
    plot
}

// ---------------------------------------------------------------------------
// Chart kinds
// ---------------------------------------------------------------------------

fn bar_chart(ui: &mut Ui, spec: &ChartSpec, stacked: bool) {
    let categories = categories(&spec.table);
    let series = aligned_series(spec, &categories);
    let colors = ColorMap::new(spec.colors, &series.keys().cloned().collect());

    let mut charts: Vec<BarChart> = Vec::new();
    for (key, heights) in &series {
        let bars: Vec<Bar> = categories
            .iter()
            .zip(heights)
            .map(|(x, y)| {
                Bar::new(x_coord(x, &categories), *y)
                    .name(x.to_string())
                    .width(0.7)
            })
            .collect();
        let mut chart = BarChart::new(bars).color(colors.color_for(key));
        if !key.is_null() {
            chart = chart.name(key.to_string());
        }
        if stacked {
            let below: Vec<&BarChart> = charts.iter().collect();
            chart = chart.stack_on(&below);
        }
        charts.push(chart);
    }

    base_plot(spec, categories).show(ui, |plot_ui| {
        for chart in charts {
            plot_ui.bar_chart(chart);
        }
    });
}

fn line_chart(ui: &mut Ui, spec: &ChartSpec) {
    let categories = categories(&spec.table);
    let series = split_series(spec);
    let colors = ColorMap::new(spec.colors, &series.keys().cloned().collect());

    base_plot(spec, categories.clone()).show(ui, |plot_ui| {
        for (key, points) in &series {
            let color = colors.color_for(key);
            let coords: Vec<[f64; 2]> = points
                .iter()
                .map(|(x, y)| [x_coord(x, &categories), *y])
                .collect();

            plot_ui.line(
                Line::new(PlotPoints::new(coords.clone()))
                    .name(key.to_string())
                    .color(color)
                    .width(2.0),
            );
            plot_ui.points(
                Points::new(PlotPoints::new(coords))
                    .name(key.to_string())
                    .color(color)
                    .radius(3.0),
            );
        }
    });
}

fn scatter_chart(ui: &mut Ui, spec: &ChartSpec) {
    let categories = categories(&spec.table);
    let series = split_series(spec);
    let colors = ColorMap::new(spec.colors, &series.keys().cloned().collect());

    base_plot(spec, categories.clone()).show(ui, |plot_ui| {
        for (key, points) in &series {
            let coords: PlotPoints = points
                .iter()
                .map(|(x, y)| [x_coord(x, &categories), *y])
                .collect();
            plot_ui.points(
                Points::new(coords)
                    .name(key.to_string())
                    .color(colors.color_for(key))
                    .radius(5.0),
            );
        }
    });
}

/// Countries shaded on a sequential scale by their metric.
fn choropleth(ui: &mut Ui, spec: &ChartSpec) {
    let max = spec
        .table
        .rows
        .iter()
        .map(|row| AggTable::metric(row))
        .max()
        .unwrap_or(0)
        .max(1) as f32;

    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        egui::Grid::new("choropleth")
            .striped(true)
            .num_columns(3)
            .show(ui, |ui: &mut Ui| {
                ui.strong(&spec.x_label);
                ui.strong(&spec.y_label);
                ui.label("");
                ui.end_row();

                for row in &spec.table.rows {
                    let count = AggTable::metric(row);
                    let name = row.first().map(|v| v.to_string()).unwrap_or_default();
                    ui.label(name);
                    ui.label(count.to_string());
                    let (rect, _) =
                        ui.allocate_exact_size(egui::vec2(120.0, 14.0), egui::Sense::hover());
                    ui.painter()
                        .rect_filled(rect, 2.0, sequential(count as f32 / max));
                    ui.end_row();
                }
            });
    });
}

/// Children of `prefix` one level down: `(value, metric)` pairs.
fn children(table: &AggTable, prefix: &[Value]) -> Vec<(Value, i64)> {
    let level = table.rollup(prefix.len() + 1);
    level
        .rows
        .iter()
        .filter(|row| row.starts_with(prefix))
        .filter_map(|row| Some((row.get(prefix.len())?.clone(), AggTable::metric(row))))
        .collect()
}

/// Hierarchy rings (sex → medal → sport) as nested share bars.
fn sunburst(ui: &mut Ui, spec: &ChartSpec) {
    let table = &spec.table;
    let level_name = |depth: usize| {
        spec.keys
            .get(depth)
            .map(|f| f.name().to_lowercase())
            .unwrap_or_default()
    };
    let total = children(table, &[]).iter().map(|(_, n)| n).sum::<i64>().max(1);

    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        for (sex, sex_count) in children(table, &[]) {
            let sex_label = sex.to_string();
            ui.add(
                egui::ProgressBar::new(sex_count as f32 / total as f32)
                    .text(format!("{sex_label}: {sex_count}"))
                    .fill(sex_color(&sex_label)),
            );
            egui::CollapsingHeader::new(format!("{sex_label} by {}", level_name(1)))
                .id_salt(&sex_label)
                .show(ui, |ui: &mut Ui| {
                    let prefix = [sex.clone()];
                    for (medal, medal_count) in children(table, &prefix) {
                        let medal_label = medal.to_string();
                        ui.add(
                            egui::ProgressBar::new(medal_count as f32 / sex_count.max(1) as f32)
                                .text(format!("{medal_label}: {medal_count}"))
                                .fill(medal_color(&medal_label)),
                        );
                        egui::CollapsingHeader::new(format!("{medal_label} by {}", level_name(2)))
                            .id_salt((&sex_label, &medal_label))
                            .show(ui, |ui: &mut Ui| {
                                let prefix = [sex.clone(), medal.clone()];
                                for (sport, n) in children(table, &prefix) {
                                    ui.label(format!("{sport}: {n}"));
                                }
                            });
                    }
                });
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Field;
    use crate::view::{ColorScheme, ViewKind};

    fn spec(columns: &[&str], rows: Vec<Vec<Value>>, series: Option<Field>) -> ChartSpec {
        ChartSpec {
            view: ViewKind::MedalsByCountry,
            kind: ChartKind::StackedBar,
            title: "test".to_string(),
            x_label: "x".to_string(),
            y_label: "y".to_string(),
            keys: Vec::new(),
            series,
            colors: ColorScheme::ByMedal,
            x_tick_step: None,
            table: AggTable {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows,
            },
        }
    }

    fn row(country: &str, medal: &str, n: i64) -> Vec<Value> {
        vec![country.into(), medal.into(), Value::Integer(n)]
    }

    #[test]
    fn categories_keep_table_order() {
        let s = spec(
            &["Country", "Medal", "Count"],
            vec![row("USA", "Gold", 3), row("France", "Gold", 1), row("USA", "Silver", 2)],
            Some(Field::Medal),
        );
        assert_eq!(categories(&s.table), vec![Value::from("USA"), Value::from("France")]);
    }

    #[test]
    fn series_split_by_series_column() {
        let s = spec(
            &["Country", "Medal", "Count"],
            vec![row("USA", "Gold", 3), row("France", "Gold", 1), row("USA", "Silver", 2)],
            Some(Field::Medal),
        );
        let series = split_series(&s);
        assert_eq!(series.len(), 2);
        assert_eq!(
            series[&Value::from("Gold")],
            vec![(Value::from("USA"), 3.0), (Value::from("France"), 1.0)]
        );
    }

    #[test]
    fn aligned_series_share_category_slots() {
        let s = spec(
            &["Country", "Medal", "Count"],
            vec![
                row("France", "Bronze", 2),
                row("USA", "Gold", 1),
                row("USA", "Silver", 1),
            ],
            Some(Field::Medal),
        );
        let cats = categories(&s.table);
        assert_eq!(cats, vec![Value::from("France"), Value::from("USA")]);

        let aligned = aligned_series(&s, &cats);
        assert_eq!(aligned[&Value::from("Bronze")], vec![2.0, 0.0]);
        assert_eq!(aligned[&Value::from("Gold")], vec![0.0, 1.0]);
        assert_eq!(aligned[&Value::from("Silver")], vec![0.0, 1.0]);
        assert!(aligned.values().all(|h| h.len() == cats.len()));
    }

    #[test]
    fn single_series_uses_null_key() {
        let s = spec(
            &["Year", "Count"],
            vec![vec![Value::Integer(2000), Value::Integer(4)]],
            None,
        );
        let series = split_series(&s);
        assert_eq!(series.keys().cloned().collect::<Vec<_>>(), vec![Value::Null]);
        assert_eq!(x_coord(&Value::Integer(2000), &[]), 2000.0);
    }

    #[test]
    fn text_x_values_map_to_category_index() {
        let cats = vec![Value::from("USA"), Value::from("France")];
        assert_eq!(x_coord(&Value::from("France"), &cats), 1.0);
        assert_eq!(category_label(&cats, 1.0), "France");
        assert_eq!(category_label(&cats, 0.5), "");
        assert_eq!(category_label(&cats, 7.0), "");
    }

    #[test]
    fn fixed_marks_cover_bounds_at_step() {
        let values: Vec<f64> = fixed_marks((1893.0, 1921.0), 8.0)
            .iter()
            .map(|m| m.value)
            .collect();
        assert_eq!(values, vec![1896.0, 1904.0, 1912.0, 1920.0]);
        assert!(fixed_marks((0.0, 10.0), 0.0).is_empty());
    }

    #[test]
    fn children_walk_the_hierarchy() {
        let table = AggTable {
            columns: vec!["Sex".into(), "Medal".into(), "Sport".into(), "Count".into()],
            rows: vec![
                vec!["F".into(), "Gold".into(), "Rowing".into(), Value::Integer(2)],
                vec!["M".into(), "Gold".into(), "Judo".into(), Value::Integer(1)],
                vec!["M".into(), "Gold".into(), "Rowing".into(), Value::Integer(4)],
            ],
        };
        assert_eq!(
            children(&table, &[]),
            vec![(Value::from("F"), 2), (Value::from("M"), 5)]
        );
        assert_eq!(
            children(&table, &[Value::from("M"), Value::from("Gold")]),
            vec![(Value::from("Judo"), 1), (Value::from("Rowing"), 4)]
        );
    }
}
