use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::Value;
use crate::error::PrepareError;

/// Cell contents that pandas reads as missing by default.
const NULL_MARKERS: [&str; 4] = ["", "NA", "NaN", "nan"];

// ---------------------------------------------------------------------------
// RawTable – an untyped table straight from storage
// ---------------------------------------------------------------------------

/// Header plus rows of cells, before any preparation.
///
/// CSV cells stay text; Parquet cells keep their column type.  Numbers are
/// parsed per column during preparation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RawTable {
    /// Index of a column that must be present.
    pub fn column(&self, name: &str) -> Result<usize, PrepareError> {
        self.optional_column(name).ok_or_else(|| PrepareError::Schema {
            path: self.path.clone(),
            column: name.to_string(),
        })
    }

    /// Index of a column that may be absent.
    pub fn optional_column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a raw table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with column names (the published dataset)
/// * `.parquet` – flat columns of strings / integers / floats
pub fn load_table(path: &Path) -> Result<RawTable, PrepareError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        _ => Err(PrepareError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<RawTable, PrepareError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| PrepareError::missing(path, e))?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| PrepareError::missing(path, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|e| PrepareError::Malformed {
            path: path.to_path_buf(),
            row: row_no,
            column: String::new(),
            reason: e.to_string(),
        })?;
        rows.push(record.iter().map(text_cell).collect());
    }

    Ok(RawTable {
        path: path.to_path_buf(),
        headers,
        rows,
    })
}

/// A CSV cell as text, or null for the markers pandas reads as missing.
fn text_cell(s: &str) -> Value {
    if NULL_MARKERS.contains(&s) {
        Value::Null
    } else {
        Value::Text(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<RawTable, PrepareError> {
    let file = std::fs::File::open(path).map_err(|e| PrepareError::missing(path, e))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| PrepareError::missing(path, e))?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().map_err(|e| PrepareError::missing(path, e))?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.map_err(|e| PrepareError::missing(path, e))?;
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| extract_value(col, row))
                    .collect(),
            );
        }
    }

    Ok(RawTable {
        path: path.to_path_buf(),
        headers,
        rows,
    })
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Value {
    if col.is_null(row) {
        return Value::Null;
    }
    match col.data_type() {
        DataType::Utf8 => text_value(col.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => text_value(col.as_string::<i64>().value(row)),
        DataType::Utf8View => text_value(col.as_string_view().value(row)),
        DataType::Int16 => Value::Integer(col.as_primitive::<Int16Type>().value(row) as i64),
        DataType::Int32 => Value::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => Value::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => float_value(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => float_value(col.as_primitive::<Float64Type>().value(row)),
        // Dictionary-encoded categoricals and anything else: use Arrow's formatter.
        _ => match array_value_to_string(col.as_ref(), row) {
            Ok(s) => text_cell(&s),
            Err(_) => Value::Null,
        },
    }
}

fn text_value(s: &str) -> Value {
    if s.is_empty() {
        Value::Null
    } else {
        Value::Text(s.to_string())
    }
}

fn float_value(v: f64) -> Value {
    if v.is_nan() {
        Value::Null
    } else {
        Value::Float(v)
    }
}
