//! Spreadsheet-driven resolution: look up a document's text against a
//! reference table and take the name from the first matching row.

use super::{NameResolver, Resolution};
use crate::error::{RenameError, Result};
use crate::files::{is_null_sentinel, sanitize};
use crate::table::{Table, TextTable};

/// Reference table plus the columns used to find and name documents.
///
/// The find and name columns are checked when the filter is built, so a
/// resolver never meets a missing column mid-batch.
#[derive(Debug, Clone)]
pub struct SpreadsheetFilter {
    source: Table,
    find_column: String,
    name_column: String,
    extra_columns: Vec<String>,
    name_idx: usize,
    extra_idx: Vec<usize>,
}

impl SpreadsheetFilter {
    pub fn new(
        source: Table,
        find_column: impl Into<String>,
        name_column: impl Into<String>,
        extra_columns: Vec<String>,
    ) -> Result<Self> {
        let find_column = find_column.into();
        let name_column = name_column.into();
        required_column(&source, "find", &find_column)?;
        let name_idx = required_column(&source, "name", &name_column)?;

        let mut extra_idx = Vec::with_capacity(extra_columns.len());
        for column in &extra_columns {
            extra_idx.push(required_column(&source, "extra", column)?);
        }

        Ok(Self {
            source,
            find_column,
            name_column,
            extra_columns,
            name_idx,
            extra_idx,
        })
    }

    pub fn source(&self) -> &Table {
        &self.source
    }

    pub fn find_column(&self) -> &str {
        &self.find_column
    }

    pub fn name_column(&self) -> &str {
        &self.name_column
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }
}

fn required_column(source: &Table, role: &str, column: &str) -> Result<usize> {
    source.column_index(column).ok_or_else(|| {
        RenameError::configuration(format!(
            "{} column '{}' not found in spreadsheet (columns: {})",
            role,
            column,
            source.headers().join(", ")
        ))
    })
}

/// Resolves names by substring lookup against a [`SpreadsheetFilter`].
#[derive(Debug, Clone)]
pub struct SpreadsheetResolver {
    filter: SpreadsheetFilter,
    /// Lowercased find values by row; `None` for null cells.
    candidates: Vec<Option<String>>,
}

impl SpreadsheetResolver {
    pub fn new(filter: SpreadsheetFilter) -> Self {
        let candidates = filter
            .source
            .column(&filter.find_column)
            .unwrap_or_default()
            .into_iter()
            .map(str::trim)
            .map(|value| (!is_null_sentinel(value)).then(|| value.to_lowercase()))
            .collect();
        Self { filter, candidates }
    }

    pub fn filter(&self) -> &SpreadsheetFilter {
        &self.filter
    }

    /// Lowest-index row whose find value occurs, ignoring case, in any line.
    pub fn winning_row(&self, table: &TextTable) -> Option<usize> {
        let lines: Vec<String> = table.lines().map(str::to_lowercase).collect();
        self.candidates.iter().position(|candidate| {
            candidate
                .as_deref()
                .is_some_and(|c| lines.iter().any(|line| line.contains(c)))
        })
    }

    /// Name column plus non-null extra columns, joined with `-`.
    fn compose_name(&self, row: usize) -> Option<String> {
        let source = &self.filter.source;
        let base = source.cell(row, self.filter.name_idx)?.trim();
        if is_null_sentinel(base) {
            return None;
        }

        let mut parts = vec![base];
        for &idx in &self.filter.extra_idx {
            if let Some(value) = source.cell(row, idx).map(str::trim) {
                if !is_null_sentinel(value) {
                    parts.push(value);
                }
            }
        }
        Some(sanitize(&parts.join("-")))
    }
}

impl NameResolver for SpreadsheetResolver {
    fn resolve(&self, table: &TextTable) -> Resolution {
        let Some(row) = self.winning_row(table) else {
            return Resolution::Unresolved;
        };
        tracing::debug!(row, "Spreadsheet row matched");
        Resolution::from_name(self.compose_name(row))
    }
}
