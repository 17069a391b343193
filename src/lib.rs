//! Backend for a single-user category-tagging tool.
//!
//! A frontend uploads a CSV or Excel file, the user assigns a per-row
//! `Category` value from a fixed reference list, and the edited table is
//! exported back as CSV or XLSX bytes for download. This crate owns the data
//! and the command API; a grid rendering layer binds to [`Session`] rather
//! than owning the table itself.
//!
//! The category list is loaded once at startup from the reference workbook
//! ([`CategoryList::load_from_path`]) and injected into each session. A
//! failure to load it is fatal: the application must not start serving
//! without the list.

pub mod categories;
pub mod session;
pub mod tabular;

pub use categories::{CategoryList, DEFAULT_REFERENCE_PATH, REFERENCE_COLUMN};
pub use session::{LoadSummary, Session, SessionError, SessionStatus};
pub use tabular::{
    audit_categories, CategoryAudit, CategoryViolation, CellValue, ExportArtifact, ExportFormat,
    SourceFormat, Table, TabularError, CATEGORY_COLUMN,
};
