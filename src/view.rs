//! The seven chart views: filter the prepared dataset, group, and describe
//! the chart to draw.

use polars::prelude::PolarsResult;

use crate::data::aggregate::{group_by, AggTable, Metric};
use crate::data::filter::{available_years, CountryChoice, Filters, Predicate};
use crate::data::model::{Dataset, Field};
use crate::error::ViewError;

// ---------------------------------------------------------------------------
// Chart specification handed to the renderer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Choropleth,
    Bar,
    Line,
    Scatter,
    StackedBar,
    Sunburst,
}

/// How marks are coloured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    /// Continuous scale over the metric.
    Sequential,
    /// Every mark the same colour.
    Single([u8; 3]),
    /// Men blue, women pink.
    BySex,
    /// Gold, silver, bronze, plus a neutral shade for no medal.
    ByMedal,
}

const ROYAL_BLUE: [u8; 3] = [65, 105, 225];

/// Everything the renderer needs: what to draw, from which table, how to label it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub view: ViewKind,
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Key columns of `table`, in order; the first is the x axis
    /// (or the innermost ring of a sunburst).
    pub keys: Vec<Field>,
    /// Key column that splits the table into coloured series.
    pub series: Option<Field>,
    pub colors: ColorScheme,
    /// Spacing of x-axis ticks, when the chart asks for a fixed step.
    pub x_tick_step: Option<i64>,
    pub table: AggTable,
}

// ---------------------------------------------------------------------------
// View selection
// ---------------------------------------------------------------------------

/// Which filter widgets a view reads, beyond season and type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub year_range: bool,
    pub year: bool,
    pub country: bool,
}

/// The closed set of chart views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewKind {
    #[default]
    MedalMap,
    ParticipatingCountries,
    AthletesBySex,
    MedalsOverYears,
    TopCountries,
    MedalsByCountry,
    SexSunburst,
}

impl ViewKind {
    pub const ALL: [ViewKind; 7] = [
        ViewKind::MedalMap,
        ViewKind::ParticipatingCountries,
        ViewKind::AthletesBySex,
        ViewKind::MedalsOverYears,
        ViewKind::TopCountries,
        ViewKind::MedalsByCountry,
        ViewKind::SexSunburst,
    ];

    /// Sidebar label.
    pub fn label(self) -> &'static str {
        match self {
            ViewKind::MedalMap => "Map of Medals",
            ViewKind::ParticipatingCountries => "Participating countries by year",
            ViewKind::AthletesBySex => "Athletes across the years",
            ViewKind::MedalsOverYears => "Medals across the years",
            ViewKind::TopCountries => "Top countries",
            ViewKind::MedalsByCountry => "Medals by Country",
            ViewKind::SexSunburst => "Male Vs Female performance",
        }
    }

    pub fn controls(self) -> Controls {
        match self {
            ViewKind::MedalMap => Controls {
                year_range: true,
                ..Controls::default()
            },
            ViewKind::ParticipatingCountries
            | ViewKind::AthletesBySex
            | ViewKind::MedalsOverYears => Controls::default(),
            ViewKind::TopCountries | ViewKind::MedalsByCountry => Controls {
                year: true,
                ..Controls::default()
            },
            ViewKind::SexSunburst => Controls {
                year: true,
                country: true,
                ..Controls::default()
            },
        }
    }

    /// Whether the view drops "No Medal" rows.  Fixed per view, whatever
    /// the incoming filters say.
    pub fn excludes_no_medal(self) -> bool {
        matches!(self, ViewKind::MedalsOverYears | ViewKind::TopCountries)
    }

    /// Filter, aggregate and describe the chart for this view.
    ///
    /// Pure: the dataset is only read.  An empty result is reported as
    /// [`ViewError::EmptySelection`].
    pub fn run(self, dataset: &Dataset, filters: &Filters) -> Result<ChartSpec, ViewError> {
        let filters = Filters {
            exclude_no_medal: self.excludes_no_medal(),
            ..filters.clone()
        };
        let spec = match self {
            ViewKind::MedalMap => medal_map(dataset, &filters),
            ViewKind::ParticipatingCountries => participating_countries(dataset, &filters),
            ViewKind::AthletesBySex => athletes_by_sex(dataset, &filters),
            ViewKind::MedalsOverYears => medals_over_years(dataset, &filters),
            ViewKind::TopCountries => top_countries(dataset, &filters),
            ViewKind::MedalsByCountry => medals_by_country(dataset, &filters),
            ViewKind::SexSunburst => sex_sunburst(dataset, &filters),
        }
        .map_err(|e| ViewError::Aggregate {
            view: self,
            reason: e.to_string(),
        })?;
        log::debug!("{}: {} aggregated rows", self.label(), spec.table.len());

        if spec.table.is_empty() {
            Err(ViewError::EmptySelection { view: self })
        } else {
            Ok(spec)
        }
    }
}

// ---------------------------------------------------------------------------
// Shared filter steps
// ---------------------------------------------------------------------------

/// Season and type membership, plus the "No Medal" exclusion when set.
fn base_predicates(filters: &Filters) -> Vec<Predicate<'_>> {
    let mut predicates = vec![
        Predicate::Seasons(&filters.seasons),
        Predicate::Types(&filters.types),
    ];
    if filters.exclude_no_medal {
        predicates.push(Predicate::WithMedal);
    }
    predicates
}

/// The selected single year, or `None` when no year is available.
fn effective_year(dataset: &Dataset, filters: &Filters) -> Option<i64> {
    filters
        .year
        .filter(|_| !available_years(dataset, filters).is_empty())
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

fn medal_map(dataset: &Dataset, filters: &Filters) -> PolarsResult<ChartSpec> {
    let mut predicates = base_predicates(filters);
    if let Some((min, max)) = filters.year_range {
        predicates.push(Predicate::YearRange(min, max));
    }

    Ok(ChartSpec {
        view: ViewKind::MedalMap,
        kind: ChartKind::Choropleth,
        title: "Total Medals by Country".to_string(),
        x_label: "Country".to_string(),
        y_label: "Medal".to_string(),
        keys: vec![Field::Country],
        series: None,
        colors: ColorScheme::Sequential,
        x_tick_step: None,
        table: group_by(
            dataset.records(),
            &predicates,
            &[Field::Country],
            Metric::Count(Field::Medal),
            "Medal",
        )?,
    })
}

fn participating_countries(dataset: &Dataset, filters: &Filters) -> PolarsResult<ChartSpec> {
    let predicates = base_predicates(filters);

    Ok(ChartSpec {
        view: ViewKind::ParticipatingCountries,
        kind: ChartKind::Bar,
        title: "Total Participating Countries per Year".to_string(),
        x_label: "Year".to_string(),
        y_label: "Number of Countries".to_string(),
        keys: vec![Field::Year],
        series: None,
        colors: ColorScheme::Single(ROYAL_BLUE),
        x_tick_step: None,
        table: group_by(
            dataset.records(),
            &predicates,
            &[Field::Year],
            Metric::Distinct(Field::Country),
            "Country",
        )?,
    })
}

fn athletes_by_sex(dataset: &Dataset, filters: &Filters) -> PolarsResult<ChartSpec> {
    // Each sex is grouped on its own; a year missing from one series stays missing.
    let mut table = AggTable {
        columns: vec![
            Field::Year.name().to_string(),
            Field::Sex.name().to_string(),
            "Athletes".to_string(),
        ],
        rows: Vec::new(),
    };
    for sex in ["M", "F"] {
        let mut predicates = base_predicates(filters);
        predicates.push(Predicate::Sex(sex));

        let series = group_by(
            dataset.records(),
            &predicates,
            &[Field::Year],
            Metric::Distinct(Field::Id),
            "Athletes",
        )?;
        table.rows.extend(series.rows.into_iter().map(|mut row| {
            row.insert(1, sex.into());
            row
        }));
    }

    Ok(ChartSpec {
        view: ViewKind::AthletesBySex,
        kind: ChartKind::Line,
        title: "Number of Participants per Year".to_string(),
        x_label: "Year".to_string(),
        y_label: "Number of Participants".to_string(),
        keys: vec![Field::Year, Field::Sex],
        series: Some(Field::Sex),
        colors: ColorScheme::BySex,
        x_tick_step: None,
        table,
    })
}

fn medals_over_years(dataset: &Dataset, filters: &Filters) -> PolarsResult<ChartSpec> {
    let predicates = base_predicates(filters);

    Ok(ChartSpec {
        view: ViewKind::MedalsOverYears,
        kind: ChartKind::Scatter,
        title: "Olympic Medals Over the Years".to_string(),
        x_label: "Year".to_string(),
        y_label: "Count".to_string(),
        keys: vec![Field::Year, Field::Medal],
        series: Some(Field::Medal),
        colors: ColorScheme::ByMedal,
        x_tick_step: Some(8),
        table: group_by(
            dataset.records(),
            &predicates,
            &[Field::Year, Field::Medal],
            Metric::Rows,
            "Medal Count",
        )?,
    })
}

fn top_countries(dataset: &Dataset, filters: &Filters) -> PolarsResult<ChartSpec> {
    let mut predicates = base_predicates(filters);
    if let Some(year) = effective_year(dataset, filters) {
        predicates.push(Predicate::Year(year));
    }

    let mut table = group_by(
        dataset.records(),
        &predicates,
        &[Field::Country],
        Metric::Rows,
        "Count",
    )?;
    table.sort_by_value_desc();

    Ok(ChartSpec {
        view: ViewKind::TopCountries,
        kind: ChartKind::Bar,
        title: "Total Medals by Country".to_string(),
        x_label: "Country".to_string(),
        y_label: "Medal Count".to_string(),
        keys: vec![Field::Country],
        series: None,
        colors: ColorScheme::Single(ROYAL_BLUE),
        x_tick_step: None,
        table,
    })
}

fn medals_by_country(dataset: &Dataset, filters: &Filters) -> PolarsResult<ChartSpec> {
    let mut predicates = base_predicates(filters);
    if let Some(year) = effective_year(dataset, filters) {
        predicates.push(Predicate::Year(year));
    }

    Ok(ChartSpec {
        view: ViewKind::MedalsByCountry,
        kind: ChartKind::StackedBar,
        title: "Medal Counts by Country and Medal Category".to_string(),
        x_label: "Country".to_string(),
        y_label: "Medal Count".to_string(),
        keys: vec![Field::Country, Field::Medal],
        series: Some(Field::Medal),
        colors: ColorScheme::ByMedal,
        x_tick_step: None,
        table: group_by(
            dataset.records(),
            &predicates,
            &[Field::Country, Field::Medal],
            Metric::Rows,
            "Count",
        )?,
    })
}

fn sex_sunburst(dataset: &Dataset, filters: &Filters) -> PolarsResult<ChartSpec> {
    let mut predicates = base_predicates(filters);
    if let CountryChoice::Only(name) = &filters.country {
        predicates.push(Predicate::Country(name));
    }

    // The year only labels the chart; it does not filter.
    let title = match effective_year(dataset, filters) {
        Some(year) => format!("Male vs Female Participants by Medal Category ({year})"),
        None => "Male vs Female Participants by Medal Category".to_string(),
    };

    Ok(ChartSpec {
        view: ViewKind::SexSunburst,
        kind: ChartKind::Sunburst,
        title,
        x_label: "Sex".to_string(),
        y_label: "Count".to_string(),
        keys: vec![Field::Sex, Field::Medal, Field::Sport],
        series: Some(Field::Sex),
        colors: ColorScheme::BySex,
        x_tick_step: None,
        table: group_by(
            dataset.records(),
            &predicates,
            &[Field::Sex, Field::Medal, Field::Sport],
            Metric::Rows,
            "Count",
        )?,
    })
}
