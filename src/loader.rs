use crate::error::ReportError;
use crate::record::{COLUMNS, OH_REDUCTION, OTHER_SAVINGS, SMV_UNLOCK, SolutionRecord};
use calamine::{Data, Reader, open_workbook_auto};
use std::path::Path;

/// A raw input cell before it is interpreted against its column
#[derive(Debug, Clone, PartialEq)]
enum Field {
    Empty,
    Text(String),
    Number(f64),
}

/// Positions of the expected columns within the input header
struct ColumnMap {
    indices: [usize; 7],
}

impl ColumnMap {
    /// Locate every expected column, failing on the first one that is absent
    fn from_header(header: &[String]) -> Result<Self, ReportError> {
        let mut indices = [0usize; 7];
        for (slot, name) in indices.iter_mut().zip(COLUMNS) {
            *slot = header
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| ReportError::MissingColumn {
                    column: name.to_string(),
                })?;
        }
        Ok(ColumnMap { indices })
    }

    fn field<'a>(&self, fields: &'a [Field], column: usize) -> &'a Field {
        fields.get(self.indices[column]).unwrap_or(&Field::Empty)
    }
}

/// Load solution records from a spreadsheet file
///
/// Detects the file type from its extension and dispatches to the Excel or
/// CSV reader. The first row is the header; the seven solution columns must
/// all be present, in any order.
///
/// # Arguments
/// * `filepath` - Path to the `.xlsx`, `.xls`, `.ods` or `.csv` file
///
/// # Returns
/// * `Result<Vec<SolutionRecord>, ReportError>` - Records in file order
///
/// # Errors
/// * `ReportError::MissingColumn` naming the first expected column not found
/// * `ReportError::InvalidNumber` when a savings cell holds text
/// * `ReportError::UnsupportedExtension` for any other file type
///
/// # Examples
/// ```no_run
/// use solution_dashboard::loader::load_records;
///
/// match load_records("Solution List.xlsx") {
///     Ok(records) => println!("Loaded {} solutions", records.len()),
///     Err(e) => eprintln!("Error loading solutions: {}", e),
/// }
/// ```
pub fn load_records(filepath: impl AsRef<Path>) -> Result<Vec<SolutionRecord>, ReportError> {
    let path = filepath.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        Some("csv") => from_csv(path),
        Some("xlsx") | Some("xlsm") | Some("xls") | Some("ods") => from_excel(path),
        Some(ext) => Err(ReportError::UnsupportedExtension(ext.to_string())),
        None => Err(ReportError::UnsupportedExtension(String::new())),
    }
}

/// Load solution records from the first worksheet of an Excel or ODS file
pub fn from_excel(filepath: impl AsRef<Path>) -> Result<Vec<SolutionRecord>, ReportError> {
    let mut workbook = open_workbook_auto(filepath)?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(ReportError::EmptyInput)?;
    let range = workbook.worksheet_range(&sheet_name)?;

    // calamine trims leading empty rows, so keep the offset for error messages
    let first_row = range.start().map_or(0, |(row, _)| row as usize);
    let mut rows = range.rows();

    let header: Vec<String> = rows
        .next()
        .ok_or(ReportError::EmptyInput)?
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();

    let data = rows.map(|row| row.iter().map(field_from_cell).collect::<Vec<_>>());
    records_from_rows(&header, data, first_row + 2)
}

/// Load solution records from a CSV file with a header row
///
/// Quoted fields may span lines and rows may be shorter than the header; the
/// missing trailing cells read as empty.
pub fn from_csv(filepath: impl AsRef<Path>) -> Result<Vec<SolutionRecord>, ReportError> {
    let mut reader = csv::ReaderBuilder::new()
        // The header goes through the same column mapping as the Excel reader
        .has_headers(false)
        .flexible(true)
        .from_path(filepath)?;

    let mut rows = reader.records();
    let header: Vec<String> = rows
        .next()
        .ok_or(ReportError::EmptyInput)??
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut data = Vec::new();
    for row in rows {
        let fields = row?
            .iter()
            .map(|value| {
                if value.trim().is_empty() {
                    Field::Empty
                } else {
                    Field::Text(value.to_string())
                }
            })
            .collect::<Vec<_>>();
        data.push(fields);
    }
    records_from_rows(&header, data.into_iter(), 2)
}

// Interpret raw rows against the header; `first_row` is the 1-based sheet row of the first data row
fn records_from_rows(
    header: &[String],
    rows: impl Iterator<Item = Vec<Field>>,
    first_row: usize,
) -> Result<Vec<SolutionRecord>, ReportError> {
    let columns = ColumnMap::from_header(header)?;
    let mut records = Vec::new();

    for (offset, fields) in rows.enumerate() {
        let row = first_row + offset;
        let record = SolutionRecord {
            division: text_value(columns.field(&fields, 0)),
            solution_name: text_value(columns.field(&fields, 1)),
            focus_area: text_value(columns.field(&fields, 2)),
            stage: text_value(columns.field(&fields, 3)),
            smv_unlock: number_value(columns.field(&fields, 4), row, SMV_UNLOCK)?,
            oh_reduction: number_value(columns.field(&fields, 5), row, OH_REDUCTION)?,
            other_savings: number_value(columns.field(&fields, 6), row, OTHER_SAVINGS)?,
        };

        if record.is_blank() {
            continue; // Skip rows with nothing in the known columns
        }
        records.push(record);
    }

    log::debug!("Read {} solution records", records.len());
    Ok(records)
}

fn field_from_cell(cell: &Data) -> Field {
    match cell {
        Data::Int(i) => Field::Number(*i as f64),
        Data::Float(f) => Field::Number(*f),
        Data::String(s) => Field::Text(s.clone()),
        Data::Bool(b) => Field::Text(b.to_string()),
        Data::DateTime(dt) => Field::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Field::Text(s.clone()),
        Data::Error(_) | Data::Empty => Field::Empty,
    }
}

fn text_value(field: &Field) -> Option<String> {
    match field {
        Field::Empty => None,
        Field::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Field::Number(n) => Some(format_number(*n)),
    }
}

fn number_value(
    field: &Field,
    row: usize,
    column: &'static str,
) -> Result<Option<f64>, ReportError> {
    match field {
        Field::Empty => Ok(None),
        Field::Number(n) if n.is_nan() => Ok(None),
        Field::Number(n) => Ok(Some(*n)),
        Field::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .replace(',', "")
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ReportError::InvalidNumber {
                    row,
                    column,
                    value: trimmed.to_string(),
                })
        }
    }
}

// Whole numbers read from a text column print without a trailing ".0"
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn quoted_csv_fields_keep_commas_quotes_and_newlines() {
        let file = write_csv(
            "Division,Solution Name,Focus Area,Stage,SMV Unlock,OH Reduction,Other Savings\n\
             Knit,\"Line one\nline two\",Quality,Live,1,2,3\n\
             Apparel,\"Cut, Sew \"\"Fast\"\"\",Cutting,Pilot,\"1,500\",,\n",
        );

        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].division.as_deref(), Some("Knit"));
        assert_eq!(records[0].solution_name.as_deref(), Some("Line one\nline two"));
        assert_eq!(records[0].focus_area.as_deref(), Some("Quality"));
        assert_eq!(records[0].other_savings, Some(3.0));
        assert_eq!(records[1].solution_name.as_deref(), Some(r#"Cut, Sew "Fast""#));
        assert_eq!(records[1].smv_unlock, Some(1500.0));
        assert_eq!(records[1].oh_reduction, None);
    }

    #[test]
    fn short_csv_rows_read_as_empty_trailing_cells() {
        let file = write_csv(
            "\u{feff}Division,Solution Name,Focus Area,Stage,SMV Unlock,OH Reduction,Other Savings\n\
             Knit,Guide,Quality,Live,2\n",
        );

        let records = load_records(file.path()).unwrap();
        assert_eq!(records[0].division.as_deref(), Some("Knit"));
        assert_eq!(records[0].smv_unlock, Some(2.0));
        assert_eq!(records[0].other_savings, None);
    }

    #[test]
    fn loads_csv_with_reordered_and_padded_headers() {
        let file = write_csv(
            " Stage ,Division,Solution Name,Focus Area,SMV Unlock,OH Reduction,Other Savings\n\
             Pilot,Apparel,Auto cutter,Cutting,1.5,,2\n\
             ,,,,,,\n\
             Live,Textiles,Dye saver, Dyeing ,,3,\n",
        );

        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].division.as_deref(), Some("Apparel"));
        assert_eq!(records[0].stage.as_deref(), Some("Pilot"));
        assert_eq!(records[0].smv_unlock, Some(1.5));
        assert_eq!(records[0].oh_reduction, None);
        assert_eq!(records[1].focus_area.as_deref(), Some("Dyeing"));
        assert_eq!(records[1].oh_reduction, Some(3.0));
    }

    #[test]
    fn missing_column_is_named() {
        let file = write_csv("Division,Solution Name,Focus Area,Stage,SMV Unlock,Other Savings\n");
        match load_records(file.path()) {
            Err(ReportError::MissingColumn { column }) => assert_eq!(column, "OH Reduction"),
            other => panic!("expected missing column error, got {:?}", other),
        }
    }

    #[test]
    fn text_in_savings_column_is_rejected_with_row() {
        let file = write_csv(
            "Division,Solution Name,Focus Area,Stage,SMV Unlock,OH Reduction,Other Savings\n\
             Apparel,A,Cutting,Pilot,1,2,3\n\
             Apparel,B,Cutting,Pilot,lots,2,3\n",
        );
        match load_records(file.path()) {
            Err(ReportError::InvalidNumber { row, column, value }) => {
                assert_eq!(row, 3);
                assert_eq!(column, SMV_UNLOCK);
                assert_eq!(value, "lots");
            }
            other => panic!("expected invalid number error, got {:?}", other),
        }
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        assert!(matches!(
            load_records("solutions.txt"),
            Err(ReportError::UnsupportedExtension(ext)) if ext == "txt"
        ));
    }

    #[test]
    fn numeric_categories_become_text() {
        assert_eq!(text_value(&Field::Number(12.0)), Some("12".to_string()));
        assert_eq!(text_value(&Field::Number(1.25)), Some("1.25".to_string()));
        assert_eq!(text_value(&Field::Text("  ".into())), None);
    }
}
