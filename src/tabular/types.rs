use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::table::Table;

/// Name of the column holding the per-row category assignment.
pub const CATEGORY_COLUMN: &str = "Category";

/// Represents a cell value with type information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Text rendering used for CSV fields and header cells. `Empty` renders
    /// as the empty string; integral numbers carry no fractional part.
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => n.to_string(),
        }
    }
}

/// Detected format of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceFormat {
    Csv,
    Excel,
}

/// Result of parsing an uploaded file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedFile {
    pub table: Table,
    pub format: SourceFormat,
    /// Worksheet names for Excel sources; empty for CSV.
    pub sheets: Vec<String>,
}

/// Target format for a download artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn suggested_filename(&self) -> String {
        format!("updated_file.{}", self.extension())
    }
}

/// Serialized table bytes plus the metadata a frontend needs to offer a
/// download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub filename: String,
}

/// Errors from parsing, exporting, and the category source
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
pub enum TabularError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("export error: {0}")]
    Export(String),

    #[error("category source error: {0}")]
    CategorySource(String),

    #[error("row index {0} is out of range")]
    RowOutOfRange(usize),

    #[error("no column named '{0}'")]
    NoSuchColumn(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_wire_shape() {
        let json = serde_json::to_value(CellValue::Text("Finance".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"type": "Text", "value": "Finance"}));

        let json = serde_json::to_value(CellValue::Number(30.0)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "Number", "value": 30.0}));

        let json = serde_json::to_value(CellValue::Empty).unwrap();
        assert_eq!(json, serde_json::json!({"type": "Empty"}));
    }

    #[test]
    fn test_display_text() {
        assert_eq!(CellValue::Empty.display_text(), "");
        assert_eq!(CellValue::Text("abc".to_string()).display_text(), "abc");
        assert_eq!(CellValue::Number(30.0).display_text(), "30");
        assert_eq!(CellValue::Number(2.5).display_text(), "2.5");
    }

    #[test]
    fn test_export_format_metadata() {
        assert_eq!(ExportFormat::Csv.mime_type(), "text/csv");
        assert_eq!(ExportFormat::Csv.suggested_filename(), "updated_file.csv");
        assert_eq!(
            ExportFormat::Xlsx.mime_type(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(ExportFormat::Xlsx.suggested_filename(), "updated_file.xlsx");
    }
}
