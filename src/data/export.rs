use std::io::Write;
use std::path::Path;

use polars::prelude::DataFrame;

use crate::data::values::ColumnValues;
use crate::error::FileError;

/// Write the rows behind a chart as `;`-delimited text, the same layout the
/// dashboard reads.
pub fn write_table<W: Write>(table: &DataFrame, out: W) -> Result<(), FileError> {
    let names: Vec<String> = table
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    let columns = names
        .iter()
        .map(|name| ColumnValues::from_table(table, name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(crate::data::loader::DELIMITER)
        .from_writer(out);

    writer.write_record(&names)?;
    for row in 0..table.height() {
        let record: Vec<String> = columns
            .iter()
            .map(|c| c.label(row).unwrap_or_default())
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_table(table: &DataFrame, path: &Path) -> Result<(), FileError> {
    let file = std::fs::File::create(path)?;
    write_table(table, file)?;
    tracing::info!("Exported {} rows to {:?}", table.height(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::columns::ASSAY;
    use crate::data::loader::tests::sample_table;
    use crate::processing::aggregate::{aggregate, Aggregation};

    #[test]
    fn exported_rows_use_display_labels() {
        let table = sample_table();
        let counts = aggregate(&table, &[ASSAY.to_string()], &Aggregation::Count).unwrap();
        let mut buf = Vec::new();
        write_table(&counts, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "Assay;Results Count\nA;3\nB;2\n");
    }

    #[test]
    fn exported_dates_round_trip_as_iso_days() {
        let mut buf = Vec::new();
        write_table(&sample_table(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let first_row = text.lines().nth(1).unwrap();
        assert!(first_row.starts_with("2023-01-01;A;Pos;10;"));
    }
}
