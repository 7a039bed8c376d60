use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors that abort loading a dataset. No partial table is produced.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed delimited text: {0}")]
    Csv(#[from] csv::Error),

    #[error("no header row found")]
    Empty,

    #[error("required column '{0}' is missing")]
    MissingColumn(String),

    #[error("row {row}: '{value}' is not a day/month/year date")]
    InvalidDate { row: usize, value: String },

    #[error("row {row}: '{value}' in column '{column}' is not a number")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },

    #[error("row {row}: {found} fields where the header has {expected}")]
    ExtraFields {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// Errors raised while building a single chart block. They never leave the
/// block that produced them.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("column '{0}' is not present in the chart data")]
    MissingColumn(String),

    #[error("column '{0}' does not hold numeric values")]
    NonNumeric(String),

    #[error("no column selected for the {0}")]
    Unselected(&'static str),

    #[error("the date column holds no dates")]
    EmptyDateColumn,

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// Errors reading or writing exported rows and layout files.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("cannot access file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot encode rows: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid layout JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Chart(#[from] ChartError),
}
