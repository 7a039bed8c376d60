/// Column names of the titer result schema.
pub const TESTDATE: &str = "Testdate";
pub const ASSAY: &str = "Assay";
pub const RESULT: &str = "Result";
pub const GMT: &str = "GMT";
pub const AGE_DAYS: &str = "Age Days";
pub const AGE_WEEKS: &str = "Age Weeks";
pub const MIN_TITER: &str = "Min Titer";
pub const MAX_TITER: &str = "Max Titer";
pub const MEAN_TITER: &str = "Mean Titer";

/// Synthetic column produced when rows are counted per group.
pub const RESULTS_COUNT: &str = "Results Count";

/// Columns every uploaded file has to carry.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    TESTDATE, ASSAY, RESULT, GMT, AGE_DAYS, AGE_WEEKS, MIN_TITER, MAX_TITER, MEAN_TITER,
];

/// Required columns that must hold numbers in every non-empty cell.
pub const NUMERIC_COLUMNS: [&str; 6] = [GMT, AGE_DAYS, AGE_WEEKS, MIN_TITER, MAX_TITER, MEAN_TITER];

/// Columns averaged per group by the pre-defined chart blocks.
pub const MEAN_COLUMNS: [&str; 5] = [AGE_DAYS, AGE_WEEKS, MIN_TITER, MAX_TITER, MEAN_TITER];

/// Whether a header looks like an index column written by a dataframe export
/// (blank, or pandas' `Unnamed: N`).
pub fn is_unnamed(header: &str) -> bool {
    let trimmed = header.trim();
    trimmed.is_empty() || trimmed.starts_with("Unnamed")
}
