use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use super::loader::{load_table, RawTable};
use super::model::{Dataset, Record, Value, NO_MEDAL};
use crate::config::DataSources;
use crate::error::PrepareError;

/// Join key and joined-in name in the region reference table.
const REGION_KEY: &str = "noc_region";
const REGION_NAME: &str = "reg";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Build the prepared dataset from the configured sources.
///
/// Reads the records and region tables, fills absent medals with
/// [`NO_MEDAL`], left-joins the region name in as `country` and derives the
/// gold / silver / bronze indicators.  Storage is only ever read.
pub fn prepare(sources: &DataSources) -> Result<Dataset, PrepareError> {
    let raw = load_table(&sources.records)?;
    let regions = load_table(&sources.regions)?;

    let lookup = region_lookup(&regions)?;
    let columns = RecordColumns::locate(&raw)?;

    let mut records = Vec::with_capacity(raw.len());
    let mut unmatched: BTreeSet<String> = BTreeSet::new();
    for (row_no, row) in raw.rows.iter().enumerate() {
        let record = columns.build(&raw.path, row_no, row, &lookup)?;
        if record.country.is_none() {
            unmatched.insert(record.noc.clone());
        }
        records.push(record);
    }

    if !unmatched.is_empty() {
        log::warn!(
            "{} NOC code(s) have no region in {}: {:?}",
            unmatched.len(),
            regions.path.display(),
            unmatched
        );
    }
    log::info!(
        "Prepared {} records from {} ({} regions)",
        records.len(),
        raw.path.display(),
        lookup.len()
    );

    Ok(Dataset::from_records(records))
}

/// `1` if the medal text mentions `keyword`, else `0`.
pub fn medal_indicator(medal: &str, keyword: &str) -> u8 {
    u8::from(medal.contains(keyword))
}

// ---------------------------------------------------------------------------
// Region reference table
// ---------------------------------------------------------------------------

/// NOC code → region name.  A repeated code keeps its first name.
fn region_lookup(regions: &RawTable) -> Result<HashMap<String, Option<String>>, PrepareError> {
    let key_idx = regions.column(REGION_KEY)?;
    let name_idx = regions.column(REGION_NAME)?;

    let mut lookup = HashMap::with_capacity(regions.len());
    for row in &regions.rows {
        let Some(code) = row[key_idx].as_text() else {
            continue;
        };
        let name = row[name_idx].as_text();
        if lookup.contains_key(&code) {
            log::warn!(
                "Duplicate region code '{code}' in {}; keeping the first entry",
                regions.path.display()
            );
            continue;
        }
        lookup.insert(code, name);
    }
    Ok(lookup)
}

// ---------------------------------------------------------------------------
// Records table
// ---------------------------------------------------------------------------

/// Column positions in the raw records table.
struct RecordColumns {
    id: usize,
    sex: usize,
    noc: usize,
    year: usize,
    season: usize,
    sport: usize,
    medal: usize,
    name: Option<usize>,
    age: Option<usize>,
    height: Option<usize>,
    weight: Option<usize>,
    team: Option<usize>,
    games: Option<usize>,
    city: Option<usize>,
    event: Option<usize>,
    kind: Option<usize>,
}

impl RecordColumns {
    fn locate(raw: &RawTable) -> Result<Self, PrepareError> {
        Ok(RecordColumns {
            id: raw.column("ID")?,
            sex: raw.column("Sex")?,
            noc: raw.column("NOC")?,
            year: raw.column("Year")?,
            season: raw.column("Season")?,
            sport: raw.column("Sport")?,
            medal: raw.column("Medal")?,
            name: raw.optional_column("Name"),
            age: raw.optional_column("Age"),
            height: raw.optional_column("Height"),
            weight: raw.optional_column("Weight"),
            team: raw.optional_column("Team"),
            games: raw.optional_column("Games"),
            city: raw.optional_column("City"),
            event: raw.optional_column("Event"),
            kind: raw.optional_column("Type"),
        })
    }

    fn build(
        &self,
        path: &Path,
        row_no: usize,
        row: &[Value],
        lookup: &HashMap<String, Option<String>>,
    ) -> Result<Record, PrepareError> {
        let malformed = |column: &str, reason: &str| PrepareError::Malformed {
            path: path.to_path_buf(),
            row: row_no,
            column: column.to_string(),
            reason: reason.to_string(),
        };
        let text = |idx: usize, column: &str| {
            row[idx]
                .as_text()
                .ok_or_else(|| malformed(column, "value is missing"))
        };
        let optional_text = |idx: Option<usize>| idx.and_then(|i| row[i].as_text());
        let optional_f64 = |idx: Option<usize>| idx.and_then(|i| row[i].parse_f64());

        let id = row[self.id]
            .as_i64()
            .ok_or_else(|| malformed("ID", "expected an integer"))?;
        let year = row[self.year]
            .as_i64()
            .ok_or_else(|| malformed("Year", "expected an integer"))?;
        let noc = text(self.noc, "NOC")?;
        let medal = row[self.medal]
            .as_text()
            .unwrap_or_else(|| NO_MEDAL.to_string());
        let country = lookup.get(&noc).cloned().flatten();

        Ok(Record {
            id,
            name: optional_text(self.name),
            sex: text(self.sex, "Sex")?,
            age: optional_f64(self.age),
            height: optional_f64(self.height),
            weight: optional_f64(self.weight),
            team: optional_text(self.team),
            noc,
            country,
            games: optional_text(self.games),
            year,
            season: text(self.season, "Season")?,
            kind: optional_text(self.kind),
            city: optional_text(self.city),
            sport: text(self.sport, "Sport")?,
            event: optional_text(self.event),
            gold: medal_indicator(&medal, "Gold"),
            silver: medal_indicator(&medal, "Silver"),
            bronze: medal_indicator(&medal, "Bronze"),
            medal,
        })
    }
}

// ---------------------------------------------------------------------------
// DatasetCache – compute once per process
// ---------------------------------------------------------------------------

/// Memoizes prepared datasets by their sources.
///
/// Owned by the caller and passed explicitly; entries live until [`clear`]
/// or process exit.
///
/// [`clear`]: DatasetCache::clear
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<DataSources, Arc<Dataset>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset for `sources`, preparing it on first use.
    pub fn get_or_prepare(&mut self, sources: &DataSources) -> Result<Arc<Dataset>, PrepareError> {
        if let Some(dataset) = self.entries.get(sources) {
            log::info!("Reusing prepared dataset for {}", sources.records.display());
            return Ok(Arc::clone(dataset));
        }
        let dataset = Arc::new(prepare(sources)?);
        self.entries.insert(sources.clone(), Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Drop every cached dataset.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    const HEADER: &str =
        "ID,Name,Sex,Age,Height,Weight,Team,NOC,Games,Year,Season,City,Sport,Event,Medal,Type";

    /// Write a records file and a region file into `dir`.
    fn write_sources(dir: &Path, rows: &[&str], regions: &[&str]) -> DataSources {
        let records = dir.join("dataset_olympics.csv");
        let mut f = std::fs::File::create(&records).unwrap();
        writeln!(f, "{HEADER}").unwrap();
        for row in rows {
            writeln!(f, "{row}").unwrap();
        }

        let region_path = dir.join("noc_region.csv");
        let mut f = std::fs::File::create(&region_path).unwrap();
        writeln!(f, "noc_region,reg").unwrap();
        for row in regions {
            writeln!(f, "{row}").unwrap();
        }

        DataSources {
            records,
            regions: region_path,
        }
    }

    const ROWS: [&str; 4] = [
        "1,A Dijiang,M,24,180,80,China,CHN,1992 Summer,1992,Summer,Barcelona,Basketball,Basketball Men's Basketball,,T1",
        "2,Edgar Aabye,M,34,,,Denmark/Sweden,DEN,1900 Summer,1900,Summer,Paris,Tug-Of-War,Tug-Of-War Men's Tug-Of-War,Gold,T1",
        "3,Cornelia Aalten,F,21,185,82,Netherlands,NED,1932 Summer,1932,Summer,Los Angeles,Athletics,Athletics Women's 100 metres,Bronze,T1",
        "4,Nils Egil Aaness,M,24,,,Unknown,ZZZ,1964 Winter,1964,Winter,Innsbruck,Luge,Luge Mixed (Men)'s Doubles,Silver,T2",
    ];

    const REGIONS: [&str; 3] = ["CHN,China", "DEN,Denmark", "NED,Netherlands"];

    #[test]
    fn missing_medal_becomes_sentinel_and_country_is_joined() {
        let dir = tempfile::tempdir().unwrap();
        let sources = write_sources(
            dir.path(),
            &["1,Someone,M,,,,United States,USA,2000 Summer,2000,Summer,Sydney,Swimming,,,T1"],
            &["USA,United States"],
        );

        let ds = prepare(&sources).unwrap();
        let rec = &ds.records()[0];
        assert_eq!(rec.medal, NO_MEDAL);
        assert_eq!(rec.country.as_deref(), Some("United States"));
        assert_eq!((rec.gold, rec.silver, rec.bronze), (0, 0, 0));
    }

    #[test]
    fn left_join_preserves_every_row() {
        let dir = tempfile::tempdir().unwrap();
        let sources = write_sources(dir.path(), &ROWS, &REGIONS);

        let ds = prepare(&sources).unwrap();
        assert_eq!(ds.len(), ROWS.len());
        let countries: Vec<Option<&str>> =
            ds.records().iter().map(|r| r.country.as_deref()).collect();
        assert_eq!(
            countries,
            vec![Some("China"), Some("Denmark"), Some("Netherlands"), None]
        );
        assert_eq!(ds.records()[3].noc, "ZZZ");
    }

    #[test]
    fn indicators_follow_medal_text() {
        let dir = tempfile::tempdir().unwrap();
        let sources = write_sources(dir.path(), &ROWS, &REGIONS);

        let ds = prepare(&sources).unwrap();
        for rec in ds.records() {
            assert!(!rec.medal.is_empty());
            assert!(rec.gold <= 1 && rec.silver <= 1 && rec.bronze <= 1);
            assert!(rec.gold + rec.silver + rec.bronze <= 1);
            assert_eq!(rec.gold == 1, rec.medal.contains("Gold"));
            assert_eq!(rec.silver == 1, rec.medal.contains("Silver"));
            assert_eq!(rec.bronze == 1, rec.medal.contains("Bronze"));
        }
        assert_eq!(ds.records()[1].gold, 1);
        assert_eq!(ds.records()[2].bronze, 1);
        assert_eq!(ds.records()[3].silver, 1);
    }

    #[test]
    fn indicator_is_case_sensitive_substring() {
        assert_eq!(medal_indicator("Gold", "Gold"), 1);
        assert_eq!(medal_indicator("gold", "Gold"), 0);
        assert_eq!(medal_indicator(NO_MEDAL, "Gold"), 0);
    }

    #[test]
    fn duplicate_region_codes_keep_first_name() {
        let dir = tempfile::tempdir().unwrap();
        let sources = write_sources(
            dir.path(),
            &ROWS[..1],
            &["CHN,China", "CHN,People's Republic of China"],
        );

        let ds = prepare(&sources).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records()[0].country.as_deref(), Some("China"));
    }

    #[test]
    fn text_columns_keep_their_literal_text() {
        let dir = tempfile::tempdir().unwrap();
        let sources = write_sources(
            dir.path(),
            &["7,Inf,F,21.0,1e3,,1e3,NED,1996 Summer,1996.0,Summer,Atlanta,Rowing,,Gold,T1"],
            &REGIONS,
        );

        let prepared = prepare(&sources).unwrap();
        let rec = &prepared.records()[0];
        assert_eq!(rec.name.as_deref(), Some("Inf"));
        assert_eq!(rec.team.as_deref(), Some("1e3"));
        assert_eq!(rec.age, Some(21.0));
        assert_eq!(rec.height, Some(1000.0));
        assert_eq!(rec.weight, None);
        assert_eq!(rec.year, 1996);
    }

    #[test]
    fn optional_columns_may_be_absent() {
        let dir = tempfile::tempdir().unwrap();
        let records = dir.path().join("minimal.csv");
        std::fs::write(
            &records,
            "ID,Sex,NOC,Year,Season,Sport,Medal\n5,F,FRA,1924,Summer,Fencing,Gold\n",
        )
        .unwrap();
        let regions = dir.path().join("regions.csv");
        std::fs::write(&regions, "noc_region,reg\nFRA,France\n").unwrap();

        let ds = prepare(&DataSources { records, regions }).unwrap();
        let rec = &ds.records()[0];
        assert_eq!(rec.name, None);
        assert_eq!(rec.kind, None);
        assert_eq!(rec.country.as_deref(), Some("France"));
        assert_eq!(rec.gold, 1);
    }

    #[test]
    fn missing_source_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut sources = write_sources(dir.path(), &ROWS, &REGIONS);
        sources.regions = dir.path().join("nowhere.csv");

        match prepare(&sources).unwrap_err() {
            PrepareError::MissingSource { path, .. } => {
                assert_eq!(path, dir.path().join("nowhere.csv"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_medal_column_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let records = dir.path().join("records.csv");
        std::fs::write(&records, "ID,Sex,NOC,Year,Season,Sport\n1,M,USA,2000,Summer,Rowing\n")
            .unwrap();
        let regions = dir.path().join("regions.csv");
        std::fs::write(&regions, "noc_region,reg\nUSA,USA\n").unwrap();

        let err = prepare(&DataSources { records, regions }).unwrap_err();
        assert!(matches!(err, PrepareError::Schema { ref column, .. } if column == "Medal"));
        assert!(err.to_string().contains("Medal"));
    }

    #[test]
    fn missing_region_key_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut sources = write_sources(dir.path(), &ROWS, &[]);
        let regions = dir.path().join("bad_regions.csv");
        std::fs::write(&regions, "code,reg\nCHN,China\n").unwrap();
        sources.regions = regions;

        let err = prepare(&sources).unwrap_err();
        assert!(matches!(err, PrepareError::Schema { ref column, .. } if column == "noc_region"));
    }

    #[test]
    fn non_numeric_year_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let sources = write_sources(
            dir.path(),
            &["1,X,M,,,,Team,USA,Games,nineteen,Summer,City,Rowing,,,T1"],
            &["USA,USA"],
        );

        let err = prepare(&sources).unwrap_err();
        assert!(matches!(err, PrepareError::Malformed { row: 0, ref column, .. } if column == "Year"));
    }

    #[test]
    fn preparing_twice_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let sources = write_sources(dir.path(), &ROWS, &REGIONS);

        assert_eq!(prepare(&sources).unwrap(), prepare(&sources).unwrap());
    }

    #[test]
    fn cache_reuses_dataset_without_rereading_storage() {
        let dir = tempfile::tempdir().unwrap();
        let sources = write_sources(dir.path(), &ROWS, &REGIONS);
        let mut cache = DatasetCache::new();

        let first = cache.get_or_prepare(&sources).unwrap();
        std::fs::remove_file(&sources.records).unwrap();
        let second = cache.get_or_prepare(&sources).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert!(matches!(
            cache.get_or_prepare(&sources).unwrap_err(),
            PrepareError::MissingSource { .. }
        ));
    }

    #[test]
    fn cache_keys_on_sources() {
        let dir = tempfile::tempdir().unwrap();
        let sources = write_sources(dir.path(), &ROWS, &REGIONS);
        let other = DataSources {
            records: PathBuf::from(&sources.records),
            regions: dir.path().join("missing.csv"),
        };
        let mut cache = DatasetCache::new();

        cache.get_or_prepare(&sources).unwrap();
        assert!(cache.get_or_prepare(&other).is_err());
        assert_eq!(cache.len(), 1);
    }
}
