use serde::{Deserialize, Serialize};

use super::table::Table;
use super::types::{CellValue, CATEGORY_COLUMN};
use crate::categories::CategoryList;

/// A Category cell whose value is outside the allowed list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryViolation {
    pub row: u32,
    pub value: String,
}

/// Result of auditing the Category column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAudit {
    pub is_valid: bool,
    pub violations: Vec<CategoryViolation>,
    pub rows_checked: u32,
}

/// Audit every `Category` cell against the allowed list.
///
/// Advisory only: the edit path never calls this, and a violation does not
/// block anything. Unset cells are never violations, and a table without a
/// `Category` column audits clean with zero rows checked. Membership is
/// exact-match, the same comparison the selector applies.
pub fn audit_categories(table: &Table, categories: &CategoryList) -> CategoryAudit {
    let col = match table.column_index(CATEGORY_COLUMN) {
        Some(col) => col,
        None => {
            return CategoryAudit {
                is_valid: true,
                violations: Vec::new(),
                rows_checked: 0,
            }
        }
    };

    let mut violations = Vec::new();

    for (row_idx, row) in table.rows().iter().enumerate() {
        match &row[col] {
            CellValue::Empty => {}
            CellValue::Text(s) if categories.contains(s) => {}
            other => violations.push(CategoryViolation {
                row: row_idx as u32,
                value: other.display_text(),
            }),
        }
    }

    CategoryAudit {
        is_valid: violations.is_empty(),
        rows_checked: table.row_count() as u32,
        violations,
    }
}
