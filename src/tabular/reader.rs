use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets};
use sha2::{Digest, Sha256};

use super::table::Table;
use super::types::{CellValue, ParsedFile, SourceFormat, TabularError};

/// Parse uploaded bytes into a table, dispatching on the declared extension.
///
/// `csv` goes through the CSV reader; `xlsx` and `xls` go through the
/// spreadsheet reader (first sheet only). Anything else is a parse error.
/// The header row defines the column names in both paths.
pub fn parse(bytes: &[u8], extension: &str) -> Result<ParsedFile, TabularError> {
    match extension.to_ascii_lowercase().as_str() {
        "csv" => parse_csv(bytes),
        "xlsx" | "xls" => parse_spreadsheet(bytes),
        other => Err(TabularError::Parse(format!(
            "unsupported file extension '{}' (expected csv, xlsx, or xls)",
            other
        ))),
    }
}

fn parse_csv(bytes: &[u8]) -> Result<ParsedFile, TabularError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true) // short rows are padded with empty cells
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| TabularError::Parse(format!("failed to read CSV headers: {}", e)))?
        .clone();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(TabularError::Parse("input has no header row".to_string()));
    }

    let columns: Vec<String> = headers.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            TabularError::Parse(format!("failed to parse CSV row {}: {}", idx + 1, e))
        })?;
        rows.push(record.iter().map(infer_csv_cell).collect());
    }

    let table = Table::from_parts(columns, rows)?;

    Ok(ParsedFile {
        table,
        format: SourceFormat::Csv,
        sheets: Vec::new(),
    })
}

fn parse_spreadsheet(bytes: &[u8]) -> Result<ParsedFile, TabularError> {
    let mut workbook: Sheets<_> = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| TabularError::Parse(format!("failed to open workbook: {}", e)))?;

    let sheets = workbook.sheet_names().to_vec();
    let first = sheets
        .first()
        .cloned()
        .ok_or_else(|| TabularError::Parse("workbook contains no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| TabularError::Parse(format!("failed to read sheet '{}': {}", first, e)))?;

    let mut row_iter = range.rows();
    let header = row_iter
        .next()
        .ok_or_else(|| TabularError::Parse(format!("sheet '{}' has no header row", first)))?;

    let columns: Vec<String> = header.iter().map(header_text).collect();
    if columns.iter().all(|c| c.is_empty()) {
        return Err(TabularError::Parse(format!(
            "sheet '{}' has no header row",
            first
        )));
    }

    let rows: Vec<Vec<CellValue>> = row_iter
        .map(|row| row.iter().map(convert_cell_value).collect())
        .collect();

    let table = Table::from_parts(columns, rows)?;

    Ok(ParsedFile {
        table,
        format: SourceFormat::Excel,
        sheets,
    })
}

/// Infer the cell type of a CSV field. Blank fields are empty cells and
/// finite numeric fields become numbers so exports can write typed cells;
/// everything else stays text.
fn infer_csv_cell(field: &str) -> CellValue {
    if field.is_empty() {
        return CellValue::Empty;
    }
    if let Ok(n) = field.parse::<f64>() {
        if n.is_finite() {
            return CellValue::Number(n);
        }
    }
    CellValue::Text(field.to_string())
}

/// Render a header cell to a column name.
fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        _ => String::new(),
    }
}

/// Convert calamine Data to our CellValue
fn convert_cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => CellValue::Text(format_excel_datetime(dt.as_f64())),
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
    }
}

/// Format Excel datetime (days since 1899-12-30) to ISO 8601
fn format_excel_datetime(value: f64) -> String {
    let days = value.floor() as i64;
    let time_fraction = value.fract();

    // Excel epoch is December 30, 1899
    let epoch = chrono::NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();
    let date = epoch + chrono::Duration::days(days);

    let total_seconds = (time_fraction * 86400.0).round() as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    let time = chrono::NaiveTime::from_hms_opt(hours, minutes, seconds).unwrap_or_default();
    let datetime = chrono::NaiveDateTime::new(date, time);

    datetime.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// SHA-256 hex digest of uploaded bytes, reported in the load summary so a
/// frontend can tell identical re-uploads apart from new files.
pub fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xlsx_bytes(build: impl FnOnce(&mut umya_spreadsheet::Worksheet)) -> Vec<u8> {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
        build(sheet);

        let mut cursor = Cursor::new(Vec::new());
        umya_spreadsheet::writer::xlsx::write_writer(&book, &mut cursor).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_parse_csv() {
        let parsed = parse(b"name,age\nAlice,30\nBob,25\nCarol,40", "csv").unwrap();

        assert_eq!(parsed.format, SourceFormat::Csv);
        assert!(parsed.sheets.is_empty());
        assert_eq!(parsed.table.columns(), &["name", "age"]);
        assert_eq!(parsed.table.row_count(), 3);
        assert_eq!(
            parsed.table.cell(0, 0),
            Some(&CellValue::Text("Alice".to_string()))
        );
        assert_eq!(parsed.table.cell(0, 1), Some(&CellValue::Number(30.0)));
    }

    #[test]
    fn test_parse_csv_pads_short_rows() {
        let parsed = parse(b"a,b,c\n1,2\n", "csv").unwrap();

        assert_eq!(parsed.table.cell(0, 2), Some(&CellValue::Empty));
    }

    #[test]
    fn test_parse_csv_rejects_invalid_bytes() {
        let result = parse(&[0xff, 0xfe, 0xfd, 0x00, 0x01], "csv");

        assert!(matches!(result, Err(TabularError::Parse(_))));
    }

    #[test]
    fn test_parse_csv_rejects_empty_input() {
        assert!(matches!(parse(b"", "csv"), Err(TabularError::Parse(_))));
    }

    #[test]
    fn test_parse_rejects_unknown_extension() {
        let result = parse(b"name,age\n", "txt");

        assert!(matches!(result, Err(TabularError::Parse(_))));
    }

    #[test]
    fn test_extension_dispatch_is_case_insensitive() {
        assert!(parse(b"name\nAlice\n", "CSV").is_ok());
    }

    #[test]
    fn test_infer_csv_cell() {
        assert_eq!(infer_csv_cell(""), CellValue::Empty);
        assert_eq!(infer_csv_cell("30"), CellValue::Number(30.0));
        assert_eq!(infer_csv_cell("2.5"), CellValue::Number(2.5));
        assert_eq!(infer_csv_cell("abc"), CellValue::Text("abc".to_string()));
        // Non-finite parses stay text
        assert_eq!(infer_csv_cell("inf"), CellValue::Text("inf".to_string()));
        assert_eq!(infer_csv_cell("NaN"), CellValue::Text("NaN".to_string()));
    }

    #[test]
    fn test_parse_xlsx() {
        let bytes = xlsx_bytes(|sheet| {
            sheet.get_cell_mut("A1").set_value_string("name");
            sheet.get_cell_mut("B1").set_value_string("age");
            sheet.get_cell_mut("A2").set_value_string("Alice");
            sheet.get_cell_mut("B2").set_value_number(30.0);
            sheet.get_cell_mut("A3").set_value_string("Bob");
            sheet.get_cell_mut("B3").set_value_number(25.0);
        });

        let parsed = parse(&bytes, "xlsx").unwrap();

        assert_eq!(parsed.format, SourceFormat::Excel);
        assert_eq!(parsed.sheets, vec!["Sheet1".to_string()]);
        assert_eq!(parsed.table.columns(), &["name", "age"]);
        assert_eq!(parsed.table.row_count(), 2);
        assert_eq!(
            parsed.table.cell(0, 0),
            Some(&CellValue::Text("Alice".to_string()))
        );
        assert_eq!(parsed.table.cell(1, 1), Some(&CellValue::Number(25.0)));
    }

    #[test]
    fn test_parse_xlsx_rejects_garbage_bytes() {
        let result = parse(b"this is not a zip archive", "xlsx");

        assert!(matches!(result, Err(TabularError::Parse(_))));
    }

    #[test]
    fn test_format_excel_datetime() {
        // 2024-01-01 is 45292 days after the Excel epoch
        assert_eq!(format_excel_datetime(45292.0), "2024-01-01T00:00:00");
        assert_eq!(format_excel_datetime(45292.5), "2024-01-01T12:00:00");
    }

    #[test]
    fn test_checksum_is_stable() {
        let a = checksum(b"name,age\n");
        let b = checksum(b"name,age\n");
        let c = checksum(b"name,city\n");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
