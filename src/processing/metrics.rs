use polars::prelude::*;

use crate::data::columns::{ASSAY, GMT};
use crate::data::values::format_number;

/// Headline numbers shown above the charts.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardMetrics {
    pub sample_count: usize,
    pub assay_count: usize,
    pub min_gmt: Option<f64>,
    pub max_gmt: Option<f64>,
}

impl DashboardMetrics {
    pub fn compute(table: &DataFrame) -> PolarsResult<Self> {
        let assay_count = table
            .column(ASSAY)?
            .as_materialized_series()
            .drop_nulls()
            .n_unique()?;
        let gmt = table.column(GMT)?.as_materialized_series().cast(&DataType::Float64)?;
        let gmt = gmt.f64()?;

        Ok(Self {
            sample_count: table.height(),
            assay_count,
            min_gmt: gmt.min(),
            max_gmt: gmt.max(),
        })
    }
}

pub fn format_metric(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::tests::sample_table;

    #[test]
    fn metrics_summarise_the_whole_table() {
        let metrics = DashboardMetrics::compute(&sample_table()).unwrap();
        assert_eq!(
            metrics,
            DashboardMetrics {
                sample_count: 5,
                assay_count: 2,
                min_gmt: Some(10.0),
                max_gmt: Some(80.0),
            }
        );
    }

    #[test]
    fn metric_values_format_compactly() {
        assert_eq!(format_metric(Some(10.0)), "10");
        assert_eq!(format_metric(Some(12.5)), "12.5");
        assert_eq!(format_metric(None), "-");
    }
}
