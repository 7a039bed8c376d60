use polars::prelude::*;

use crate::data::columns::{self, NUMERIC_COLUMNS, REQUIRED_COLUMNS, TESTDATE};
use crate::data::datetime::{parse_testdate, to_epoch_days};
use crate::error::LoadError;

/// Field separator of the laboratory exports.
pub const DELIMITER: u8 = b';';

/// Raw delimited text split into named string columns.
pub struct RawTable {
    pub columns: Vec<String>,
    pub column_data: Vec<Vec<String>>, // column-major: column_data[col_idx][row_idx]
}

impl RawTable {
    /// Remove index columns written by dataframe exports (blank or `Unnamed` headers).
    pub fn without_unnamed_columns(self) -> Self {
        let (columns, column_data): (Vec<_>, Vec<_>) = self
            .columns
            .into_iter()
            .zip(self.column_data)
            .filter(|(name, _)| !columns::is_unnamed(name))
            .unzip();
        Self {
            columns,
            column_data,
        }
    }

    fn cells(&self, name: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|idx| self.column_data[idx].as_slice())
    }
}

/// Parse `;`-delimited bytes into a typed table.
///
/// Unnamed index columns are dropped, `Testdate` must parse as day/month/year
/// on every non-empty row and the required numeric columns must hold numbers.
/// Remaining columns become `Float64` when every non-empty cell is numeric and
/// `String` otherwise.
pub fn load_bytes(bytes: &[u8]) -> Result<DataFrame, LoadError> {
    let raw = read_delimited(bytes, DELIMITER)?.without_unnamed_columns();

    for required in REQUIRED_COLUMNS {
        if raw.cells(required).is_none() {
            return Err(LoadError::MissingColumn(required.to_string()));
        }
    }

    let mut frame_columns: Vec<Column> = Vec::with_capacity(raw.columns.len());
    for (name, cells) in raw.columns.iter().zip(raw.column_data.iter()) {
        let column = if name == TESTDATE {
            date_column(name, cells)?
        } else if NUMERIC_COLUMNS.contains(&name.as_str()) {
            numeric_column(name, cells)?
        } else {
            inferred_column(name, cells)
        };
        frame_columns.push(column);
    }

    Ok(DataFrame::new(frame_columns)?)
}

/// Split delimited text into a header row and column-major cells.
/// Short rows are padded with empty cells. Fields past the header are only
/// allowed when empty (trailing delimiters).
pub fn read_delimited(bytes: &[u8], delimiter: u8) -> Result<RawTable, LoadError> {
    // Fallback: treat as latin1 (each byte maps to the same Unicode code point)
    let text = String::from_utf8(bytes.to_vec())
        .unwrap_or_else(|_| bytes.iter().map(|&b| b as char).collect());

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record?,
        None => return Err(LoadError::Empty),
    };

    let columns: Vec<String> = header.iter().map(|s| s.trim().to_string()).collect();
    let num_cols = columns.len();
    let mut column_data: Vec<Vec<String>> = vec![Vec::new(); num_cols];
    let mut row = 0usize;

    for record in records {
        let record = record?;
        // A trailing blank line shows up as a single empty field.
        if record.len() == 1 && record[0].trim().is_empty() {
            continue;
        }
        row += 1;
        if record.iter().skip(num_cols).any(|field| !field.trim().is_empty()) {
            return Err(LoadError::ExtraFields {
                row,
                found: record.len(),
                expected: num_cols,
            });
        }
        for (col_idx, col_data) in column_data.iter_mut().enumerate() {
            col_data.push(record.get(col_idx).unwrap_or("").to_string());
        }
    }

    Ok(RawTable {
        columns,
        column_data,
    })
}

fn date_column(name: &str, cells: &[String]) -> Result<Column, LoadError> {
    let days = cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            if cell.trim().is_empty() {
                return Ok(None);
            }
            parse_testdate(cell)
                .map(|d| Some(to_epoch_days(d)))
                .ok_or_else(|| LoadError::InvalidDate {
                    row: i + 1,
                    value: cell.clone(),
                })
        })
        .collect::<Result<Vec<Option<i32>>, LoadError>>()?;

    let series = Series::new(name.into(), days).cast(&DataType::Date)?;
    Ok(series.into())
}

fn numeric_column(name: &str, cells: &[String]) -> Result<Column, LoadError> {
    let values = cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let trimmed = cell.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map(Some)
                .map_err(|_| LoadError::InvalidNumber {
                    column: name.to_string(),
                    row: i + 1,
                    value: cell.clone(),
                })
        })
        .collect::<Result<Vec<Option<f64>>, LoadError>>()?;

    Ok(Series::new(name.into(), values).into())
}

fn inferred_column(name: &str, cells: &[String]) -> Column {
    let numeric: Option<Vec<Option<f64>>> = cells
        .iter()
        .map(|cell| {
            let trimmed = cell.trim();
            if trimmed.is_empty() {
                Some(None)
            } else {
                trimmed.parse::<f64>().ok().map(Some)
            }
        })
        .collect();

    let has_values = cells.iter().any(|c| !c.trim().is_empty());
    match numeric {
        Some(values) if has_values => Series::new(name.into(), values).into(),
        _ => {
            let text: Vec<Option<String>> = cells
                .iter()
                .map(|cell| {
                    let trimmed = cell.trim();
                    (!trimmed.is_empty()).then(|| trimmed.to_string())
                })
                .collect();
            Series::new(name.into(), text).into()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::columns::*;

    pub(crate) const HEADER: &str =
        ";Testdate;Assay;Result;GMT;Age Days;Age Weeks;Min Titer;Max Titer;Mean Titer";

    /// Small in-memory dataset shared by the pipeline tests.
    pub(crate) fn sample_csv() -> String {
        [
            HEADER,
            "0;01/01/2023;A;Pos;10;7;1;4;6;5",
            "1;01/01/2023;A;Neg;20;14;2;6;8;7",
            "2;15/02/2023;B;Pos;40;21;3;8;12;10",
            "3;20/03/2023;B;Pos;80;28;4;10;14;12",
            "4;20/03/2023;A;Neg;20;35;5;2;4;3",
        ]
        .join("\n")
    }

    pub(crate) fn sample_table() -> DataFrame {
        load_bytes(sample_csv().as_bytes()).unwrap()
    }

    #[test]
    fn drops_unnamed_index_columns() {
        let table = sample_table();
        let names: Vec<String> = table
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert!(names.iter().all(|n| !columns::is_unnamed(n)));
        assert_eq!(names.len(), 9);
        assert_eq!(table.height(), 5);
    }

    #[test]
    fn drops_pandas_style_index_header() {
        let text = "Unnamed: 0;Testdate;Assay;Result;GMT;Age Days;Age Weeks;Min Titer;Max Titer;Mean Titer\n\
                    0;01/01/2023;A;Pos;10;7;1;4;6;5\n";
        let table = load_bytes(text.as_bytes()).unwrap();
        assert!(table.column("Unnamed: 0").is_err());
        assert_eq!(table.width(), 9);
    }

    #[test]
    fn types_the_schema_columns() {
        let table = sample_table();
        assert_eq!(table.column(TESTDATE).unwrap().dtype(), &DataType::Date);
        assert_eq!(table.column(GMT).unwrap().dtype(), &DataType::Float64);
        assert_eq!(table.column(ASSAY).unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn malformed_date_fails_the_whole_load() {
        let text = format!("{HEADER}\n0;01/01/2023;A;Pos;10;7;1;4;6;5\n1;2023-01-02;A;Pos;10;7;1;4;6;5\n");
        match load_bytes(text.as_bytes()) {
            Err(LoadError::InvalidDate { row, value }) => {
                assert_eq!(row, 2);
                assert_eq!(value, "2023-01-02");
            }
            other => panic!("expected an invalid date error, got {other:?}"),
        }
    }

    #[test]
    fn missing_required_column_fails_the_load() {
        let text = "Testdate;Assay;Result\n01/01/2023;A;Pos\n";
        match load_bytes(text.as_bytes()) {
            Err(LoadError::MissingColumn(name)) => assert_eq!(name, GMT),
            other => panic!("expected a missing column error, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_titer_fails_the_load() {
        let text = format!("{HEADER}\n0;01/01/2023;A;Pos;high;7;1;4;6;5\n");
        assert!(matches!(
            load_bytes(text.as_bytes()),
            Err(LoadError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn extra_columns_are_inferred() {
        let text = "Testdate;Assay;Result;GMT;Age Days;Age Weeks;Min Titer;Max Titer;Mean Titer;Lot;Dose\n\
                    01/01/2023;A;Pos;10;7;1;4;6;5;L-1;2\n\
                    02/01/2023;A;Pos;10;7;1;4;6;5;L-2;\n";
        let table = load_bytes(text.as_bytes()).unwrap();
        assert_eq!(table.column("Lot").unwrap().dtype(), &DataType::String);
        assert_eq!(table.column("Dose").unwrap().dtype(), &DataType::Float64);
        assert_eq!(table.column("Dose").unwrap().null_count(), 1);
    }

    #[test]
    fn stray_delimiter_fails_the_load() {
        let text = format!("{HEADER}\n0;01/01/2023;A;Pos;10;7;1;4;6;5\n1;01/01/2023;A;Pos;x;10;7;1;4;6;5\n");
        match load_bytes(text.as_bytes()) {
            Err(LoadError::ExtraFields { row, found, expected }) => {
                assert_eq!(row, 2);
                assert_eq!(found, 11);
                assert_eq!(expected, 10);
            }
            other => panic!("expected an extra fields error, got {other:?}"),
        }
    }

    #[test]
    fn trailing_delimiters_are_tolerated() {
        let text = format!("{HEADER}\n0;01/01/2023;A;Pos;10;7;1;4;6;5;;\n");
        let table = load_bytes(text.as_bytes()).unwrap();
        assert_eq!(table.height(), 1);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(load_bytes(b""), Err(LoadError::Empty)));
    }
}
