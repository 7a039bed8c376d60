use polars::prelude::*;

use crate::data::datetime::from_epoch_days;
use crate::error::ChartError;

/// A table column pulled out of polars into plain vectors, keeping the one
/// distinction charts care about: numbers, calendar dates, or labels.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Numeric(Vec<Option<f64>>),
    /// Days since the Unix epoch.
    Date(Vec<Option<i32>>),
    Text(Vec<Option<String>>),
}

impl ColumnValues {
    pub fn from_table(table: &DataFrame, name: &str) -> Result<Self, ChartError> {
        let column = table
            .column(name)
            .map_err(|_| ChartError::MissingColumn(name.to_string()))?;
        let series = column.as_materialized_series();
        let dtype = series.dtype();

        if *dtype == DataType::Date {
            let days = series.cast(&DataType::Int32)?;
            Ok(ColumnValues::Date(days.i32()?.into_iter().collect()))
        } else if dtype.is_float() || dtype.is_integer() {
            let values = series.cast(&DataType::Float64)?;
            Ok(ColumnValues::Numeric(values.f64()?.into_iter().collect()))
        } else {
            let text = series.cast(&DataType::String)?;
            Ok(ColumnValues::Text(
                text.str()?
                    .into_iter()
                    .map(|v| v.map(str::to_string))
                    .collect(),
            ))
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Date(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
        }
    }

    /// Value at `row` as a plot coordinate. Text has no coordinate.
    pub fn coordinate(&self, row: usize) -> Option<f64> {
        match self {
            ColumnValues::Numeric(v) => v.get(row).copied().flatten().filter(|x| x.is_finite()),
            ColumnValues::Date(v) => v.get(row).copied().flatten().map(f64::from),
            ColumnValues::Text(_) => None,
        }
    }

    /// Value at `row` rendered for legends, facet titles and exports.
    pub fn label(&self, row: usize) -> Option<String> {
        match self {
            ColumnValues::Numeric(v) => v.get(row).copied().flatten().map(format_number),
            ColumnValues::Date(v) => v
                .get(row)
                .copied()
                .flatten()
                .and_then(from_epoch_days)
                .map(|d| d.format("%Y-%m-%d").to_string()),
            ColumnValues::Text(v) => v.get(row).cloned().flatten(),
        }
    }
}

/// Whole numbers print without a decimal point.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::columns::{ASSAY, GMT, TESTDATE};
    use crate::data::loader::tests::sample_table;

    #[test]
    fn columns_keep_their_kind() {
        let table = sample_table();
        let dates = ColumnValues::from_table(&table, TESTDATE).unwrap();
        assert!(matches!(dates, ColumnValues::Date(_)));
        assert_eq!(dates.label(0).as_deref(), Some("2023-01-01"));
        assert_eq!(dates.coordinate(0), Some(19358.0));

        let gmt = ColumnValues::from_table(&table, GMT).unwrap();
        assert_eq!(gmt.coordinate(2), Some(40.0));
        assert_eq!(gmt.label(2).as_deref(), Some("40"));

        let assay = ColumnValues::from_table(&table, ASSAY).unwrap();
        assert_eq!(assay.coordinate(0), None);
        assert_eq!(assay.label(2).as_deref(), Some("B"));
        assert_eq!(assay.len(), 5);
    }

    #[test]
    fn unknown_column_is_a_chart_error() {
        let err = ColumnValues::from_table(&sample_table(), "Lot").unwrap_err();
        assert!(matches!(err, ChartError::MissingColumn(_)));
    }
}
