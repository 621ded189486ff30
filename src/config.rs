use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Optional configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "medalboard.json";

// ---------------------------------------------------------------------------
// Data sources
// ---------------------------------------------------------------------------

/// Where the two input tables live.
///
/// ```json
/// { "records": "data/athlete_events.parquet", "regions": "data/noc_region.csv" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct DataSources {
    /// Primary athlete-event records (`.csv` or `.parquet`).
    pub records: PathBuf,
    /// NOC code → region reference table.
    pub regions: PathBuf,
}

impl Default for DataSources {
    fn default() -> Self {
        Self {
            records: PathBuf::from("dataset_olympics.csv"),
            regions: PathBuf::from("noc_region.csv"),
        }
    }
}

impl DataSources {
    /// Read [`CONFIG_FILE`] from the working directory, or use the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_file_or_default(Path::new(CONFIG_FILE))
    }

    /// Parse `path` if it exists; a missing file yields the defaults.
    /// Relative paths inside the file are resolved against its directory.
    pub fn from_file_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("{} not found, using default data sources", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed: DataSources =
            serde_json::from_str(&text).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let sources = DataSources {
            records: base.join(parsed.records),
            regions: base.join(parsed.regions),
        };
        log::info!(
            "Data sources from {}: records={}, regions={}",
            path.display(),
            sources.records.display(),
            sources.regions.display()
        );
        Ok(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let sources = DataSources::from_file_or_default(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(sources, DataSources::default());
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "records": "data/events.parquet" }"#).unwrap();

        let sources = DataSources::from_file_or_default(&path).unwrap();
        assert_eq!(sources.records, dir.path().join("data/events.parquet"));
        assert_eq!(sources.regions, dir.path().join("noc_region.csv"));
    }

    #[test]
    fn absolute_paths_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let records = dir.path().join("elsewhere.csv");
        std::fs::write(
            &path,
            serde_json::json!({ "records": records, "regions": "regions.csv" }).to_string(),
        )
        .unwrap();

        let sources = DataSources::from_file_or_default(&path).unwrap();
        assert_eq!(sources.records, records);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ records: ").unwrap();

        let err = DataSources::from_file_or_default(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
    }
}
