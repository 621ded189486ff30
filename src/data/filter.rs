use std::collections::BTreeSet;
use std::fmt;

use polars::prelude::{col, lit, Expr};

use super::model::{Dataset, Field, Record, NO_MEDAL};

/// Label of the country selector entry that disables the country filter.
pub const ALL_COUNTRIES: &str = "All Countries";

// ---------------------------------------------------------------------------
// Filters – the user's selections, shared by every view
// ---------------------------------------------------------------------------

/// Country selector: everything, or one exact region name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CountryChoice {
    #[default]
    All,
    Only(String),
}

impl fmt::Display for CountryChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountryChoice::All => f.write_str(ALL_COUNTRIES),
            CountryChoice::Only(name) => f.write_str(name),
        }
    }
}

/// Filter selections.  Each view reads the subset it needs.
///
/// An empty `seasons` or `types` set matches no rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filters {
    pub seasons: BTreeSet<String>,
    pub types: BTreeSet<String>,
    /// Inclusive `(min, max)` year bounds.
    pub year_range: Option<(i64, i64)>,
    /// Single year; ignored when no year is available for the selection.
    pub year: Option<i64>,
    pub country: CountryChoice,
    pub exclude_no_medal: bool,
}

impl Filters {
    /// Initialise with every season and type selected and the full year range.
    pub fn all(dataset: &Dataset) -> Self {
        Filters {
            seasons: dataset.seasons.clone(),
            types: dataset.types.clone(),
            year_range: dataset.year_bounds(),
            year: dataset.years.last().copied(),
            country: CountryChoice::All,
            exclude_no_medal: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Predicate – one filter step
// ---------------------------------------------------------------------------

/// A single row test.  Views compose these into their fixed filter sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate<'a> {
    Seasons(&'a BTreeSet<String>),
    Types(&'a BTreeSet<String>),
    YearRange(i64, i64),
    Year(i64),
    Country(&'a str),
    Sex(&'a str),
    WithMedal,
}

impl Predicate<'_> {
    pub fn matches(&self, rec: &Record) -> bool {
        match self {
            Predicate::Seasons(selected) => selected.contains(&rec.season),
            // An absent type never matches, like a membership test on a null.
            Predicate::Types(selected) => rec.kind.as_ref().is_some_and(|k| selected.contains(k)),
            Predicate::YearRange(min, max) => (*min..=*max).contains(&rec.year),
            Predicate::Year(year) => rec.year == *year,
            Predicate::Country(name) => rec.country.as_deref() == Some(*name),
            Predicate::Sex(sex) => rec.sex == *sex,
            Predicate::WithMedal => rec.has_medal(),
        }
    }

    /// Column the predicate reads.
    pub fn field(&self) -> Field {
        match self {
            Predicate::Seasons(_) => Field::Season,
            Predicate::Types(_) => Field::Type,
            Predicate::YearRange(..) | Predicate::Year(_) => Field::Year,
            Predicate::Country(_) => Field::Country,
            Predicate::Sex(_) => Field::Sex,
            Predicate::WithMedal => Field::Medal,
        }
    }

    /// The same test as a polars expression over the [`Field`] columns.
    ///
    /// Comparisons against a null cell yield null, which `filter` drops,
    /// so absent values never match.
    pub fn to_expr(&self) -> Expr {
        let column = col(self.field().name());
        match self {
            Predicate::Seasons(selected) | Predicate::Types(selected) => selected
                .iter()
                .fold(lit(false), |acc, v| acc.or(column.clone().eq(lit(v.as_str())))),
            Predicate::YearRange(min, max) => column
                .clone()
                .gt_eq(lit(*min))
                .and(column.lt_eq(lit(*max))),
            Predicate::Year(year) => column.eq(lit(*year)),
            Predicate::Country(name) | Predicate::Sex(name) => column.eq(lit(*name)),
            Predicate::WithMedal => column.neq(lit(NO_MEDAL)),
        }
    }
}

/// Records passing every predicate, in dataset order.
pub fn select<'a>(dataset: &'a Dataset, predicates: &[Predicate<'_>]) -> Vec<&'a Record> {
    dataset
        .records()
        .iter()
        .filter(|rec| predicates.iter().all(|p| p.matches(rec)))
        .collect()
}

/// Years present among rows passing the season and type filters.
/// These are the valid choices of the single-year selector.
pub fn available_years(dataset: &Dataset, filters: &Filters) -> BTreeSet<i64> {
    select(
        dataset,
        &[
            Predicate::Seasons(&filters.seasons),
            Predicate::Types(&filters.types),
        ],
    )
    .into_iter()
    .map(|rec| rec.year)
    .collect()
}

/// Countries present among rows passing the season and type filters.
pub fn available_countries(dataset: &Dataset, filters: &Filters) -> BTreeSet<String> {
    select(
        dataset,
        &[
            Predicate::Seasons(&filters.seasons),
            Predicate::Types(&filters.types),
        ],
    )
    .into_iter()
    .filter_map(|rec| rec.country.clone())
    .collect()
}
