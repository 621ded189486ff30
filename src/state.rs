use std::collections::BTreeSet;
use std::sync::Arc;

use crate::data::filter::{available_countries, available_years, CountryChoice, Filters};
use crate::data::model::Dataset;
use crate::error::ViewError;
use crate::view::{ChartSpec, ViewKind};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Main,
    Visualizations,
}

impl Page {
    pub fn label(self) -> &'static str {
        match self {
            Page::Main => "Main Page",
            Page::Visualizations => "Visualizations",
        }
    }
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Prepared dataset, shared read-only for the whole session.
    pub dataset: Arc<Dataset>,

    pub page: Page,

    /// Which chart is shown on the visualizations page.
    pub view: ViewKind,

    /// Current filter selections.
    pub filters: Filters,

    /// Whether the main page shows the first rows of the dataset.
    pub show_sample: bool,

    /// Result of the selected view for the current filters (cached).
    pub chart: Result<ChartSpec, ViewError>,
}

impl AppState {
    /// Start with every season and type selected and the first view shown.
    pub fn new(dataset: Arc<Dataset>) -> Self {
        let filters = Filters::all(&dataset);
        let view = ViewKind::default();
        let chart = view.run(&dataset, &filters);
        Self {
            dataset,
            page: Page::default(),
            view,
            filters,
            show_sample: false,
            chart,
        }
    }

    /// Recompute the chart after a view or filter change.
    pub fn rerun(&mut self) {
        self.chart = self.view.run(&self.dataset, &self.filters);
        if let Err(e) = &self.chart {
            log::debug!("{e}");
        }
    }

    pub fn set_view(&mut self, view: ViewKind) {
        if self.view != view {
            self.view = view;
            self.rerun();
        }
    }

    /// Toggle a single season in the selection.
    pub fn toggle_season(&mut self, season: &str) {
        toggle(&mut self.filters.seasons, season);
        self.selection_changed();
    }

    /// Toggle a single event type in the selection.
    pub fn toggle_type(&mut self, kind: &str) {
        toggle(&mut self.filters.types, kind);
        self.selection_changed();
    }

    /// Select all seasons and types.
    pub fn select_all(&mut self) {
        self.filters.seasons = self.dataset.seasons.clone();
        self.filters.types = self.dataset.types.clone();
        self.selection_changed();
    }

    /// Deselect all seasons and types.
    pub fn select_none(&mut self) {
        self.filters.seasons.clear();
        self.filters.types.clear();
        self.selection_changed();
    }

    pub fn set_year_range(&mut self, min: i64, max: i64) {
        self.filters.year_range = Some((min.min(max), min.max(max)));
        self.rerun();
    }

    /// Select a single year.  Years with no Games in the current
    /// season/type selection are ignored.
    pub fn set_year(&mut self, year: i64) {
        if !self.year_choices().contains(&year) {
            log::debug!("Ignoring year {year}: no Games in the current selection");
            return;
        }
        self.filters.year = Some(year);
        self.rerun();
    }

    pub fn set_country(&mut self, country: CountryChoice) {
        self.filters.country = country;
        self.rerun();
    }

    /// Years the single-year selector may offer.
    pub fn year_choices(&self) -> BTreeSet<i64> {
        available_years(&self.dataset, &self.filters)
    }

    /// Countries the country selector may offer (besides "All Countries").
    pub fn country_choices(&self) -> BTreeSet<String> {
        available_countries(&self.dataset, &self.filters)
    }

    /// Keep the year and country selections valid for the new season/type choice.
    fn selection_changed(&mut self) {
        let years = self.year_choices();
        self.filters.year = match self.filters.year {
            Some(y) if years.contains(&y) => Some(y),
            _ => years.last().copied(),
        };
        if let CountryChoice::Only(name) = &self.filters.country {
            if !self.country_choices().contains(name) {
                self.filters.country = CountryChoice::All;
            }
        }
        self.rerun();
    }
}

fn toggle(selected: &mut BTreeSet<String>, value: &str) {
    if !selected.remove(value) {
        selected.insert(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;

    fn state() -> AppState {
        let mut winter = record(3, Some("Norway"), 1994, "Gold");
        winter.season = "Winter".to_string();
        let ds = Dataset::from_records(vec![
            record(1, Some("USA"), 2000, "Gold"),
            record(2, Some("France"), 1996, "Silver"),
            winter,
        ]);
        AppState::new(Arc::new(ds))
    }

    #[test]
    fn starts_with_everything_selected() {
        let st = state();
        assert_eq!(st.page, Page::Main);
        assert_eq!(st.filters.seasons.len(), 2);
        assert_eq!(st.filters.year, Some(2000));
        assert!(st.chart.is_ok());
    }

    #[test]
    fn deselecting_everything_empties_the_chart() {
        let mut st = state();
        st.select_none();
        assert_eq!(
            st.chart,
            Err(ViewError::EmptySelection {
                view: ViewKind::MedalMap
            })
        );
        assert_eq!(st.filters.year, None);

        st.select_all();
        assert!(st.chart.is_ok());
    }

    #[test]
    fn year_follows_season_choice() {
        let mut st = state();
        st.toggle_season("Summer");
        assert_eq!(st.filters.year, Some(1994));
        st.toggle_season("Summer");
        assert_eq!(st.filters.year, Some(1994));
    }

    #[test]
    fn set_year_only_accepts_available_years() {
        let mut st = state();
        st.set_view(ViewKind::SexSunburst);

        st.set_year(1997);
        assert_eq!(st.filters.year, Some(2000));

        st.set_year(1996);
        assert_eq!(st.filters.year, Some(1996));
        assert!(st.chart.as_ref().unwrap().title.ends_with("(1996)"));

        st.toggle_season("Summer");
        st.set_year(1996);
        assert_eq!(st.filters.year, Some(1994));
    }

    #[test]
    fn country_resets_when_no_longer_available() {
        let mut st = state();
        st.set_view(ViewKind::SexSunburst);
        st.set_country(CountryChoice::Only("Norway".to_string()));
        assert!(st.chart.is_ok());

        st.toggle_season("Winter");
        assert_eq!(st.filters.country, CountryChoice::All);
    }

    #[test]
    fn view_change_reruns() {
        let mut st = state();
        st.set_view(ViewKind::TopCountries);
        let spec = st.chart.as_ref().unwrap();
        assert_eq!(spec.view, ViewKind::TopCountries);
    }
}
