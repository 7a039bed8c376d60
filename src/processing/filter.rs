use chrono::NaiveDate;
use polars::prelude::*;

use crate::data::columns::TESTDATE;
use crate::data::datetime::{from_epoch_days, to_epoch_days};
use crate::error::ChartError;

/// `Testdate` as days since the Unix epoch, one entry per row.
fn epoch_days(table: &DataFrame) -> Result<Vec<Option<i32>>, ChartError> {
    let column = table
        .column(TESTDATE)
        .map_err(|_| ChartError::MissingColumn(TESTDATE.to_string()))?;
    let physical = column.as_materialized_series().cast(&DataType::Int32)?;
    Ok(physical.i32()?.into_iter().collect())
}

/// Inclusive min/max of the date column.
pub fn date_bounds(table: &DataFrame) -> Result<(NaiveDate, NaiveDate), ChartError> {
    let days = epoch_days(table)?;
    let min = days.iter().flatten().min().copied();
    let max = days.iter().flatten().max().copied();
    match (min.and_then(from_epoch_days), max.and_then(from_epoch_days)) {
        (Some(lo), Some(hi)) => Ok((lo, hi)),
        _ => Err(ChartError::EmptyDateColumn),
    }
}

/// Effective date range of a chart block. Only a date x axis honours the
/// user's choice (clamped into the data bounds); every other axis gets the
/// full bounds so no rows are filtered out.
pub fn select_range(
    bounds: (NaiveDate, NaiveDate),
    x_column: &str,
    chosen: Option<(NaiveDate, NaiveDate)>,
) -> (NaiveDate, NaiveDate) {
    if x_column != TESTDATE {
        return bounds;
    }
    let (lo, hi) = chosen.unwrap_or(bounds);
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    (lo.clamp(bounds.0, bounds.1), hi.clamp(bounds.0, bounds.1))
}

/// Keep rows whose calendar date lies in `[lo, hi]`. Rows without a date are
/// dropped. Returns a new frame; the input is untouched.
pub fn filter_by_date(table: &DataFrame, lo: NaiveDate, hi: NaiveDate) -> Result<DataFrame, ChartError> {
    let (lo, hi) = (to_epoch_days(lo), to_epoch_days(hi));
    let mask: BooleanChunked = epoch_days(table)?
        .into_iter()
        .map(|d| d.is_some_and(|d| d >= lo && d <= hi))
        .collect();
    Ok(table.filter(&mask)?)
}
