use std::path::PathBuf;

use thiserror::Error;

use crate::view::ViewKind;

/// Fatal failures while building the prepared dataset.
#[derive(Error, Debug)]
pub enum PrepareError {
    #[error("cannot read data source {}: {reason}", path.display())]
    MissingSource { path: PathBuf, reason: String },

    #[error("{} is missing required column '{column}'", path.display())]
    Schema { path: PathBuf, column: String },

    #[error("{} row {row}, column '{column}': {reason}", path.display())]
    Malformed {
        path: PathBuf,
        row: usize,
        column: String,
        reason: String,
    },

    #[error("unsupported file extension for {} (expected .csv or .parquet)", path.display())]
    UnsupportedFormat { path: PathBuf },
}

impl PrepareError {
    pub(crate) fn missing(path: &std::path::Path, reason: impl ToString) -> Self {
        PrepareError::MissingSource {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Non-fatal outcome of a view: nothing to plot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("no rows match the current selection for '{}'", view.label())]
    EmptySelection { view: ViewKind },

    #[error("aggregation failed for '{}': {reason}", view.label())]
    Aggregate { view: ViewKind, reason: String },
}

/// Problems with the optional `medalboard.json` file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
