use std::io::Cursor;

use umya_spreadsheet::{new_file, writer};

use super::table::Table;
use super::types::{CellValue, ExportArtifact, ExportFormat, TabularError};

/// Serialize the table for download in the requested format.
///
/// Returns the encoded bytes together with the MIME type and suggested
/// filename the frontend should attach to the artifact. The table itself is
/// never modified; a failed export leaves the in-memory state untouched.
pub fn serialize(table: &Table, format: ExportFormat) -> Result<ExportArtifact, TabularError> {
    let bytes = match format {
        ExportFormat::Csv => write_csv(table)?,
        ExportFormat::Xlsx => write_xlsx(table)?,
    };

    Ok(ExportArtifact {
        bytes,
        mime_type: format.mime_type().to_string(),
        filename: format.suggested_filename(),
    })
}

/// UTF-8 comma-separated output, header row first, one record per data row.
fn write_csv(table: &Table) -> Result<Vec<u8>, TabularError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(table.columns())
        .map_err(|e| TabularError::Export(format!("failed to write CSV header: {}", e)))?;

    for (idx, row) in table.rows().iter().enumerate() {
        writer
            .write_record(row.iter().map(|cell| cell.display_text()))
            .map_err(|e| {
                TabularError::Export(format!("failed to write CSV row {}: {}", idx + 1, e))
            })?;
    }

    writer
        .into_inner()
        .map_err(|e| TabularError::Export(format!("failed to flush CSV output: {}", e)))
}

/// Single-sheet workbook with the table's current row and column order.
/// Cells are written by inferred type: numbers as numeric cells, text as
/// strings, empty cells left unwritten.
fn write_xlsx(table: &Table) -> Result<Vec<u8>, TabularError> {
    let mut book = new_file();

    if book.get_sheet_by_name("Sheet1").is_none() {
        let _ = book.new_sheet("Sheet1");
    }

    let sheet = book
        .get_sheet_by_name_mut("Sheet1")
        .ok_or_else(|| TabularError::Export("default worksheet is missing".to_string()))?;

    // Excel uses 1-based indexing; header goes in row 1
    for (col_idx, name) in table.columns().iter().enumerate() {
        let col_num = (col_idx + 1) as u32;
        sheet.get_cell_mut((col_num, 1)).set_value_string(name.as_str());
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        let row_num = (row_idx + 2) as u32;

        for (col_idx, cell) in row.iter().enumerate() {
            let col_num = (col_idx + 1) as u32;

            match cell {
                CellValue::Empty => {}
                CellValue::Text(s) => {
                    sheet.get_cell_mut((col_num, row_num)).set_value_string(s.as_str());
                }
                CellValue::Number(n) => {
                    sheet.get_cell_mut((col_num, row_num)).set_value_number(*n);
                }
            }
        }
    }

    let mut cursor = Cursor::new(Vec::new());
    writer::xlsx::write_writer(&book, &mut cursor)
        .map_err(|e| TabularError::Export(format!("failed to write workbook: {}", e)))?;

    Ok(cursor.into_inner())
}
