use polars::prelude::*;

use crate::data::columns::{MEAN_COLUMNS, RESULT, RESULTS_COUNT};
use crate::error::ChartError;
use crate::state::selection::YAxis;

/// How rows collapse once grouping keys are chosen.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    /// One `Results Count` column holding the row count of each group.
    Count,
    /// Arithmetic mean of each listed column within the group.
    Means(Vec<String>),
}

impl Aggregation {
    /// Pre-defined blocks count for `Results Count` and otherwise average the
    /// fixed titer/age column set.
    pub fn for_y_axis(y_axis: YAxis) -> Self {
        match y_axis {
            YAxis::ResultsCount => Aggregation::Count,
            _ => Aggregation::Means(MEAN_COLUMNS.iter().map(|c| c.to_string()).collect()),
        }
    }

    /// Custom blocks average only the chosen column. Choosing `Result` counts
    /// rows instead; the returned name is the column to plot on y.
    pub fn for_custom(y_column: &str) -> (Self, String) {
        if y_column == RESULT {
            (Aggregation::Count, RESULTS_COUNT.to_string())
        } else {
            (Aggregation::Means(vec![y_column.to_string()]), y_column.to_string())
        }
    }
}

pub(crate) fn is_numeric(dtype: &DataType) -> bool {
    dtype.is_float() || dtype.is_integer()
}

/// Group `table` by `group_by` and collapse each group per `aggregation`.
///
/// With no grouping keys the table is returned unchanged and charts plot row
/// level data. Grouped output is sorted ascending by the keys.
pub fn aggregate(
    table: &DataFrame,
    group_by: &[String],
    aggregation: &Aggregation,
) -> Result<DataFrame, ChartError> {
    if group_by.is_empty() {
        return Ok(table.clone());
    }

    for key in group_by {
        if table.column(key).is_err() {
            return Err(ChartError::MissingColumn(key.clone()));
        }
    }

    let aggs: Vec<Expr> = match aggregation {
        Aggregation::Count => vec![len().alias(RESULTS_COUNT)],
        Aggregation::Means(columns) => {
            let mut exprs = Vec::with_capacity(columns.len());
            for name in columns {
                let column = table
                    .column(name)
                    .map_err(|_| ChartError::MissingColumn(name.clone()))?;
                if !is_numeric(column.dtype()) {
                    return Err(ChartError::NonNumeric(name.clone()));
                }
                exprs.push(col(name.as_str()).mean());
            }
            exprs
        }
    };

    let keys: Vec<Expr> = group_by.iter().map(|k| col(k.as_str())).collect();
    let grouped = table
        .clone()
        .lazy()
        .group_by(keys.clone())
        .agg(aggs)
        .sort_by_exprs(keys, SortMultipleOptions::default())
        .collect()?;

    tracing::debug!(
        "Aggregated {} rows into {} groups by {:?}",
        table.height(),
        grouped.height(),
        group_by
    );
    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::columns::{ASSAY, MEAN_TITER, TESTDATE};
    use crate::data::loader::tests::sample_table;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn f64_values(frame: &DataFrame, name: &str) -> Vec<f64> {
        frame
            .column(name)
            .unwrap()
            .as_materialized_series()
            .cast(&DataType::Float64)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap())
            .collect()
    }

    #[test]
    fn no_grouping_is_identity_for_every_y() {
        let table = sample_table();
        for y in YAxis::ALL {
            let out = aggregate(&table, &[], &Aggregation::for_y_axis(y)).unwrap();
            assert!(out.equals_missing(&table));
        }
    }

    #[test]
    fn counts_match_raw_group_sizes() {
        let table = sample_table();
        let out = aggregate(&table, &keys(&[ASSAY]), &Aggregation::Count).unwrap();
        let counts = f64_values(&out, RESULTS_COUNT);
        assert_eq!(counts, vec![3.0, 2.0]);
        assert_eq!(counts.iter().sum::<f64>() as usize, table.height());
    }

    #[test]
    fn counts_over_two_keys_sum_to_row_count() {
        let table = sample_table();
        let out = aggregate(&table, &keys(&[ASSAY, TESTDATE]), &Aggregation::Count).unwrap();
        assert_eq!(out.height(), 4);
        let total: f64 = f64_values(&out, RESULTS_COUNT).iter().sum();
        assert_eq!(total as usize, table.height());
    }

    #[test]
    fn means_are_per_group_arithmetic_means() {
        let table = sample_table();
        let out = aggregate(&table, &keys(&[ASSAY]), &Aggregation::for_y_axis(YAxis::MeanTiter)).unwrap();
        let means = f64_values(&out, MEAN_TITER);
        assert!((means[0] - 5.0).abs() < 1e-9);
        assert!((means[1] - 11.0).abs() < 1e-9);
        // Only the keys and the averaged columns survive.
        assert_eq!(out.width(), 1 + MEAN_COLUMNS.len());
    }

    #[test]
    fn groups_come_out_in_key_order() {
        let table = sample_table();
        let out = aggregate(&table, &keys(&[TESTDATE]), &Aggregation::Count).unwrap();
        let days = out
            .column(TESTDATE)
            .unwrap()
            .as_materialized_series()
            .cast(&DataType::Int32)
            .unwrap();
        let days: Vec<i32> = days.i32().unwrap().into_iter().flatten().collect();
        let mut sorted = days.clone();
        sorted.sort();
        assert_eq!(days, sorted);
        assert_eq!(f64_values(&out, RESULTS_COUNT), vec![2.0, 1.0, 2.0]);
    }

    #[test]
    fn missing_key_is_reported() {
        let table = sample_table();
        let err = aggregate(&table, &keys(&["Lot"]), &Aggregation::Count).unwrap_err();
        assert!(matches!(err, ChartError::MissingColumn(name) if name == "Lot"));
    }

    #[test]
    fn custom_mean_of_text_column_is_rejected() {
        let table = sample_table();
        let (plan, y) = Aggregation::for_custom(ASSAY);
        assert_eq!(y, ASSAY);
        let err = aggregate(&table, &keys(&[TESTDATE]), &plan).unwrap_err();
        assert!(matches!(err, ChartError::NonNumeric(_)));
    }

    #[test]
    fn custom_result_axis_counts_rows() {
        let (plan, y) = Aggregation::for_custom(RESULT);
        assert_eq!(plan, Aggregation::Count);
        assert_eq!(y, RESULTS_COUNT);
    }
}
