//! The fixed list of allowed category labels, loaded once at startup from a
//! reference workbook and injected into each session.

use std::io::{Read, Seek};
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Reader, Sheets};
use serde::{Deserialize, Serialize};

use crate::tabular::TabularError;

/// Column in the reference workbook holding the allowed labels.
pub const REFERENCE_COLUMN: &str = "Custom Categories";

/// Default location of the reference workbook.
pub const DEFAULT_REFERENCE_PATH: &str = "data/Categories.xlsx";

/// Ordered set of unique category labels.
///
/// Immutable for the session's duration; used only as the allowed-value set
/// for the `Category` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryList {
    labels: Vec<String>,
}

impl CategoryList {
    /// Build a list from literal labels, keeping the first occurrence of
    /// each and preserving order.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen: Vec<String> = Vec::new();
        for label in labels {
            let label = label.into();
            if !seen.contains(&label) {
                seen.push(label);
            }
        }
        CategoryList { labels: seen }
    }

    /// Load the list from the reference workbook on disk. Failure here is
    /// fatal for the application: without the list no session can serve.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, TabularError> {
        let path = path.as_ref();
        let workbook = open_workbook_auto(path).map_err(|e| {
            TabularError::CategorySource(format!(
                "failed to open reference workbook '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_workbook(workbook)
    }

    /// Load the list from an in-memory workbook source.
    pub fn load_from_reader<RS: Read + Seek + Clone>(source: RS) -> Result<Self, TabularError> {
        let workbook = open_workbook_auto_from_rs(source).map_err(|e| {
            TabularError::CategorySource(format!("failed to open reference workbook: {}", e))
        })?;
        Self::from_workbook(workbook)
    }

    fn from_workbook<RS: Read + Seek>(mut workbook: Sheets<RS>) -> Result<Self, TabularError> {
        let sheet = workbook.sheet_names().to_vec().first().cloned().ok_or_else(|| {
            TabularError::CategorySource("reference workbook contains no sheets".to_string())
        })?;

        let range = workbook.worksheet_range(&sheet).map_err(|e| {
            TabularError::CategorySource(format!("failed to read sheet '{}': {}", sheet, e))
        })?;

        let mut row_iter = range.rows();
        let header = row_iter.next().ok_or_else(|| {
            TabularError::CategorySource(format!("sheet '{}' is empty", sheet))
        })?;

        let col = header
            .iter()
            .position(|cell| matches!(cell, Data::String(s) if s == REFERENCE_COLUMN))
            .ok_or_else(|| {
                TabularError::CategorySource(format!(
                    "column '{}' not found in reference workbook",
                    REFERENCE_COLUMN
                ))
            })?;

        let list = Self::from_labels(row_iter.filter_map(|row| match row.get(col) {
            Some(Data::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Data::Float(f)) => Some(f.to_string()),
            Some(Data::Int(i)) => Some(i.to_string()),
            _ => None,
        }));

        if list.is_empty() {
            return Err(TabularError::CategorySource(format!(
                "column '{}' contains no category values",
                REFERENCE_COLUMN
            )));
        }

        Ok(list)
    }

    /// Exact-match membership test; the same comparison the selector uses.
    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reference_workbook(values: &[&str]) -> umya_spreadsheet::Spreadsheet {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
        sheet.get_cell_mut("A1").set_value_string(REFERENCE_COLUMN);
        for (idx, value) in values.iter().enumerate() {
            let row = (idx + 2) as u32;
            sheet.get_cell_mut((1, row)).set_value_string(*value);
        }
        book
    }

    fn workbook_bytes(book: &umya_spreadsheet::Spreadsheet) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        umya_spreadsheet::writer::xlsx::write_writer(book, &mut cursor).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_from_labels_dedups_preserving_order() {
        let list = CategoryList::from_labels(["Finance", "Operations", "Finance", "Marketing"]);

        assert_eq!(list.labels(), &["Finance", "Operations", "Marketing"]);
        assert!(list.contains("Operations"));
        assert!(!list.contains("operations"));
    }

    #[test]
    fn test_load_from_reader() {
        let book = reference_workbook(&["Finance", "Operations", "Finance", "Marketing"]);
        let bytes = workbook_bytes(&book);

        let list = CategoryList::load_from_reader(Cursor::new(bytes)).unwrap();

        assert_eq!(list.labels(), &["Finance", "Operations", "Marketing"]);
    }

    #[test]
    fn test_load_from_path() {
        let book = reference_workbook(&["Finance", "Operations"]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Categories.xlsx");
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        let list = CategoryList::load_from_path(&path).unwrap();

        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_load_missing_file_is_fatal() {
        let result = CategoryList::load_from_path("no/such/Categories.xlsx");

        assert!(matches!(result, Err(TabularError::CategorySource(_))));
    }

    #[test]
    fn test_load_rejects_missing_column() {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
        sheet.get_cell_mut("A1").set_value_string("Labels");
        sheet.get_cell_mut("A2").set_value_string("Finance");

        let result = CategoryList::load_from_reader(Cursor::new(workbook_bytes(&book)));

        assert!(matches!(result, Err(TabularError::CategorySource(_))));
    }

    #[test]
    fn test_load_rejects_empty_value_set() {
        let book = reference_workbook(&[]);

        let result = CategoryList::load_from_reader(Cursor::new(workbook_bytes(&book)));

        assert!(matches!(result, Err(TabularError::CategorySource(_))));
    }
}
