//! Per-user command layer: one session per user, owning the table being
//! edited. The hosting frontend binds its grid to these operations rather
//! than owning the data.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::categories::CategoryList;
use crate::tabular::{
    audit_categories, reader, writer, CategoryAudit, CellValue, ExportArtifact, ExportFormat,
    SourceFormat, Table, TabularError, CATEGORY_COLUMN,
};

/// Errors surfaced to the frontend by session commands
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
pub enum SessionError {
    #[error(transparent)]
    Tabular(#[from] TabularError),

    #[error("no file loaded")]
    NoFile,

    #[error("'{0}' is not in the category list")]
    UnknownCategory(String),
}

/// Summary returned after a successful upload
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub filename: String,
    pub format: SourceFormat,
    /// Worksheet names for Excel uploads; empty for CSV.
    pub sheets: Vec<String>,
    pub row_count: u32,
    pub column_count: u32,
    /// SHA-256 of the uploaded bytes.
    pub checksum: String,
    /// Whether the upload lacked a `Category` column and one was appended.
    pub category_column_added: bool,
}

/// Where the session sits in its lifecycle
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state")]
pub enum SessionStatus {
    NoFile,
    FileLoaded {
        filename: String,
        row_count: u32,
        column_count: u32,
        edit_count: u32,
    },
}

struct GridState {
    table: Table,
    filename: String,
    edit_count: u32,
}

/// One user's continuous interaction from upload to (optional) export.
///
/// Lifecycle: NoFile until the first upload, then FileLoaded with any number
/// of edits and exports; a new upload replaces the table wholesale and
/// discards prior edits. There is exactly one writer, so edits are applied
/// in place with last-write-wins semantics.
pub struct Session {
    id: Uuid,
    categories: CategoryList,
    grid: Option<GridState>,
}

impl Session {
    /// Create a session around the process-wide category list. The list is
    /// injected rather than read from ambient global state.
    pub fn new(categories: CategoryList) -> Self {
        Session {
            id: Uuid::new_v4(),
            categories,
            grid: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn categories(&self) -> &CategoryList {
        &self.categories
    }

    /// The table currently being edited, if a file is loaded.
    pub fn table(&self) -> Option<&Table> {
        self.grid.as_ref().map(|g| &g.table)
    }

    // ==================== Upload ====================

    /// Parse an uploaded file and make it the session's table, discarding
    /// any previous table and its edits. The file type is taken from the
    /// uploaded filename's extension. A failed parse surfaces an error and
    /// leaves the previous state untouched.
    pub fn load_file(
        &mut self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<LoadSummary, SessionError> {
        let extension = filename.rsplit('.').next().unwrap_or_default();
        let parsed = reader::parse(bytes, extension)?;

        let mut table = parsed.table;
        let category_column_added = table.column_index(CATEGORY_COLUMN).is_none();
        if category_column_added {
            table.ensure_column(CATEGORY_COLUMN);
        }

        let summary = LoadSummary {
            filename: filename.to_string(),
            format: parsed.format,
            sheets: parsed.sheets,
            row_count: table.row_count() as u32,
            column_count: table.column_count() as u32,
            checksum: reader::checksum(bytes),
            category_column_added,
        };

        info!(
            session = %self.id,
            filename,
            rows = summary.row_count,
            columns = summary.column_count,
            "file loaded"
        );

        self.grid = Some(GridState {
            table,
            filename: filename.to_string(),
            edit_count: 0,
        });

        Ok(summary)
    }

    // ==================== Editing ====================

    /// Replace a single cell by column name. No value constraint is applied
    /// here; the constrained Category selector path is [`Session::set_category`].
    pub fn set_cell(
        &mut self,
        row: usize,
        column: &str,
        value: CellValue,
    ) -> Result<(), SessionError> {
        let grid = self.grid.as_mut().ok_or(SessionError::NoFile)?;
        let col = grid
            .table
            .column_index(column)
            .ok_or_else(|| TabularError::NoSuchColumn(column.to_string()))?;
        grid.table.set_cell(row, col, value)?;
        grid.edit_count += 1;
        debug!(session = %self.id, row, column, "cell edited");
        Ok(())
    }

    /// Assign a category from the allowed list, or clear it with `None`.
    /// Labels outside the list are rejected and the table is untouched.
    pub fn set_category(
        &mut self,
        row: usize,
        category: Option<&str>,
    ) -> Result<(), SessionError> {
        if self.grid.is_none() {
            return Err(SessionError::NoFile);
        }

        let value = match category {
            None => CellValue::Empty,
            Some(label) => {
                if !self.categories.contains(label) {
                    warn!(session = %self.id, label, "rejected category outside the allowed list");
                    return Err(SessionError::UnknownCategory(label.to_string()));
                }
                CellValue::Text(label.to_string())
            }
        };

        let grid = self.grid.as_mut().ok_or(SessionError::NoFile)?;
        let col = grid
            .table
            .column_index(CATEGORY_COLUMN)
            .ok_or_else(|| TabularError::NoSuchColumn(CATEGORY_COLUMN.to_string()))?;
        grid.table.set_cell(row, col, value)?;
        grid.edit_count += 1;
        debug!(session = %self.id, row, "category set");
        Ok(())
    }

    /// Append a new all-empty row and return its index.
    pub fn insert_row(&mut self) -> Result<usize, SessionError> {
        let grid = self.grid.as_mut().ok_or(SessionError::NoFile)?;
        let row = grid.table.insert_row();
        grid.edit_count += 1;
        debug!(session = %self.id, row, "row inserted");
        Ok(row)
    }

    /// Remove a row; subsequent rows shift up.
    pub fn delete_row(&mut self, row: usize) -> Result<(), SessionError> {
        let grid = self.grid.as_mut().ok_or(SessionError::NoFile)?;
        grid.table.delete_row(row)?;
        grid.edit_count += 1;
        debug!(session = %self.id, row, "row deleted");
        Ok(())
    }

    // ==================== Export ====================

    /// Serialize the current table for download. Exporting never consumes
    /// the editing state; repeated exports of evolving state are allowed.
    pub fn export(&self, format: ExportFormat) -> Result<ExportArtifact, SessionError> {
        let grid = self.grid.as_ref().ok_or(SessionError::NoFile)?;
        let artifact = writer::serialize(&grid.table, format)?;
        info!(
            session = %self.id,
            format = ?format,
            bytes = artifact.bytes.len(),
            "table exported"
        );
        Ok(artifact)
    }

    // ==================== Inspection ====================

    /// Advisory report of Category cells outside the allowed list.
    pub fn audit(&self) -> Result<CategoryAudit, SessionError> {
        let grid = self.grid.as_ref().ok_or(SessionError::NoFile)?;
        Ok(audit_categories(&grid.table, &self.categories))
    }

    pub fn status(&self) -> SessionStatus {
        match &self.grid {
            None => SessionStatus::NoFile,
            Some(grid) => SessionStatus::FileLoaded {
                filename: grid.filename.clone(),
                row_count: grid.table.row_count() as u32,
                column_count: grid.table.column_count() as u32,
                edit_count: grid.edit_count,
            },
        }
    }
}
