use serde::{Deserialize, Serialize};

use super::types::{CellValue, TabularError};

/// The in-memory rectangular dataset being edited.
///
/// Column names are positionally ordered and shared across rows; every row
/// holds exactly one cell per column. The edit API is independent of any
/// rendering toolkit so that a grid frontend can bind to it directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Create an empty table with the given column names.
    pub fn new(columns: Vec<String>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from parsed parts. Rows shorter than the column set are
    /// padded with `Empty`; a row with more cells than columns is rejected.
    pub fn from_parts(
        columns: Vec<String>,
        rows: Vec<Vec<CellValue>>,
    ) -> Result<Self, TabularError> {
        let width = columns.len();
        let mut padded = Vec::with_capacity(rows.len());

        for (idx, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(TabularError::Parse(format!(
                    "row {} has {} cells but the header defines {} columns",
                    idx + 1,
                    row.len(),
                    width
                )));
            }
            row.resize(width, CellValue::Empty);
            padded.push(row);
        }

        Ok(Table {
            columns,
            rows: padded,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Index of the column with the given name, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Replace a single cell value.
    pub fn set_cell(
        &mut self,
        row: usize,
        col: usize,
        value: CellValue,
    ) -> Result<(), TabularError> {
        if col >= self.columns.len() {
            return Err(TabularError::NoSuchColumn(format!("#{}", col)));
        }
        let cells = self
            .rows
            .get_mut(row)
            .ok_or(TabularError::RowOutOfRange(row))?;
        cells[col] = value;
        Ok(())
    }

    /// Append a row of `Empty` cells and return its index.
    pub fn insert_row(&mut self) -> usize {
        self.rows.push(vec![CellValue::Empty; self.columns.len()]);
        self.rows.len() - 1
    }

    /// Remove a row; subsequent rows shift up.
    pub fn delete_row(&mut self, row: usize) -> Result<(), TabularError> {
        if row >= self.rows.len() {
            return Err(TabularError::RowOutOfRange(row));
        }
        self.rows.remove(row);
        Ok(())
    }

    /// Append a column of `Empty` cells if no column with this name exists.
    /// Returns the column index either way.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(CellValue::Empty);
        }
        self.columns.len() - 1
    }
}
