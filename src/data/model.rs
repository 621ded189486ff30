use std::collections::BTreeSet;
use std::fmt;

/// Sentinel stored in the medal column for athletes who did not place.
pub const NO_MEDAL: &str = "No Medal";

// ---------------------------------------------------------------------------
// Value – a single cell of a raw or aggregated table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell, as read from the source files.
/// Used as a group-by key downstream, so `Value` must be `Ord`.
#[derive(Debug, Clone)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Null,
}

// -- Manual Eq/Ord so we can put Value in BTreeMap keys --

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Integer(_) => 1,
                Float(_) => 2,
                Text(_) => 3,
            }
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Text(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl Value {
    /// Interpret the value as an `f64` for plotting.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Interpret the value as a whole number. Floats with no fractional
    /// part are accepted since pandas writes `1996.0` for nullable ints.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            Value::Text(s) => {
                let s = s.trim();
                s.parse().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite() && v.fract() == 0.0)
                        .map(|v| v as i64)
                })
            }
            _ => None,
        }
    }

    /// Numeric content of a cell, parsing text read from a CSV file.
    pub fn parse_f64(&self) -> Option<f64> {
        match self {
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|v| !v.is_nan()),
            other => other.as_f64(),
        }
    }

    /// Text content; numbers are rendered with `Display`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Text(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Field – the columns the views filter and group on
// ---------------------------------------------------------------------------

/// Named columns of a prepared [`Record`] that can be projected as a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Id,
    Sex,
    Country,
    Year,
    Season,
    Type,
    Sport,
    Medal,
}

impl Field {
    /// Column header as it appears in the source data and in chart tables.
    pub fn name(self) -> &'static str {
        match self {
            Field::Id => "ID",
            Field::Sex => "Sex",
            Field::Country => "Country",
            Field::Year => "Year",
            Field::Season => "Season",
            Field::Type => "Type",
            Field::Sport => "Sport",
            Field::Medal => "Medal",
        }
    }

    /// Whether the column holds whole numbers rather than text.
    pub fn is_integer(self) -> bool {
        matches!(self, Field::Id | Field::Year)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the prepared table
// ---------------------------------------------------------------------------

/// A single athlete-event entry after preparation.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: i64,
    pub name: Option<String>,
    pub sex: String,
    pub age: Option<f64>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub team: Option<String>,
    pub noc: String,
    /// Region name joined in from the reference table (`None` if unmatched).
    pub country: Option<String>,
    pub games: Option<String>,
    pub year: i64,
    pub season: String,
    /// Event type (`Type` column).
    pub kind: Option<String>,
    pub city: Option<String>,
    pub sport: String,
    pub event: Option<String>,
    /// Gold / Silver / Bronze or [`NO_MEDAL`]; never absent.
    pub medal: String,
    pub gold: u8,
    pub silver: u8,
    pub bronze: u8,
}

impl Record {
    /// Project a column as a dynamically-typed value.
    pub fn value(&self, field: Field) -> Value {
        match field {
            Field::Id => Value::Integer(self.id),
            Field::Sex => self.sex.as_str().into(),
            Field::Country => self.country.as_deref().into(),
            Field::Year => Value::Integer(self.year),
            Field::Season => self.season.as_str().into(),
            Field::Type => self.kind.as_deref().into(),
            Field::Sport => self.sport.as_str().into(),
            Field::Medal => self.medal.as_str().into(),
        }
    }

    pub fn has_medal(&self) -> bool {
        self.medal != NO_MEDAL
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete prepared table
// ---------------------------------------------------------------------------

/// The prepared table with pre-computed indices for the filter widgets.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
    /// Sorted unique seasons.
    pub seasons: BTreeSet<String>,
    /// Sorted unique event types (absent values excluded).
    pub types: BTreeSet<String>,
    /// Sorted unique years.
    pub years: BTreeSet<i64>,
    /// Sorted unique countries (unmatched codes excluded).
    pub countries: BTreeSet<String>,
}

impl Dataset {
    /// Build the column indices from prepared records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut seasons = BTreeSet::new();
        let mut types = BTreeSet::new();
        let mut years = BTreeSet::new();
        let mut countries = BTreeSet::new();

        for rec in &records {
            seasons.insert(rec.season.clone());
            if let Some(kind) = &rec.kind {
                types.insert(kind.clone());
            }
            years.insert(rec.year);
            if let Some(country) = &rec.country {
                countries.insert(country.clone());
            }
        }

        Dataset {
            records,
            seasons,
            types,
            years,
            countries,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Smallest and largest year, if any rows exist.
    pub fn year_bounds(&self) -> Option<(i64, i64)> {
        Some((*self.years.first()?, *self.years.last()?))
    }
}
