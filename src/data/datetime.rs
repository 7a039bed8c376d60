use chrono::{Datelike, NaiveDate};

/// Day/month/year format used by the `Testdate` column of uploaded files.
pub const TESTDATE_FORMAT: &str = "%d/%m/%Y";

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Strictly parse a `Testdate` cell. Surrounding whitespace is ignored,
/// anything else that does not match `%d/%m/%Y` is rejected.
pub fn parse_testdate(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), TESTDATE_FORMAT).ok()
}

/// Days since 1970-01-01, the physical representation of a polars `Date`.
pub fn to_epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

pub fn from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

/// Format a plot coordinate holding epoch days as a calendar date.
/// Coordinates that fall between days are rounded to the nearest day.
pub fn format_epoch_days(days: f64) -> String {
    if !days.is_finite() {
        return String::new();
    }
    match from_epoch_days(days.round() as i32) {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => format!("{days:.0}"),
    }
}

/// Short "MMM YYYY" label used next to the date range pickers.
pub fn format_month(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_day_first_dates() {
        let d = parse_testdate("03/02/2023").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2023, 2, 3).unwrap());
        assert_eq!(parse_testdate(" 31/12/2022 "), NaiveDate::from_ymd_opt(2022, 12, 31));
    }

    #[test]
    fn rejects_other_layouts() {
        assert!(parse_testdate("2023-02-03").is_none());
        assert!(parse_testdate("13/13/2023").is_none());
        assert!(parse_testdate("").is_none());
        assert!(parse_testdate("03/02/2023 10:00").is_none());
    }

    #[test]
    fn epoch_days_round_trip_through_the_unix_epoch() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(to_epoch_days(epoch), 0);
        let d = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert_eq!(to_epoch_days(d), 19358);
        assert_eq!(from_epoch_days(19358), Some(d));
        assert_eq!(format_epoch_days(19358.4), "2023-01-01");
        assert_eq!(format_month(d), "Jan 2023");
    }
}
