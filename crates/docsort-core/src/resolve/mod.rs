//! Name resolution: turning a document's extracted text into a file name.
//!
//! Two strategies implement [`NameResolver`]:
//! - [`PatternResolver`] looks for a fixed-format field or a caller pattern
//!   inside the text.
//! - [`SpreadsheetResolver`] looks up the text against a reference table.
//!
//! A document's resolution is `Extracted -> Resolved(name) | Unresolved`.
//! There is no retry.

mod pattern;
mod sheet;

pub use pattern::{DocumentType, PatternResolver};
pub use sheet::{SpreadsheetFilter, SpreadsheetResolver};

use std::sync::Arc;

use crate::error::Result;
use crate::files::FileRecord;
use crate::table::TextTable;

/// Outcome of resolving one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(String),
    Unresolved,
}

impl Resolution {
    /// Resolved unless the (sanitized) name is empty.
    pub fn from_name(name: Option<String>) -> Self {
        match name {
            Some(name) if !name.trim().is_empty() => Self::Resolved(name),
            _ => Self::Unresolved,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Resolved(name) => Some(name),
            Self::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Output record carrying the resolved name, or no name when unresolved.
    pub fn into_output(self, extension: Option<&str>) -> FileRecord {
        match self {
            Self::Resolved(name) => FileRecord::output(name, extension),
            Self::Unresolved => {
                let mut record = FileRecord::default();
                record.set_extension(extension);
                record
            }
        }
    }
}

/// Strategy that derives an output name from a document's extracted text.
pub trait NameResolver: Send + Sync {
    fn resolve(&self, table: &TextTable) -> Resolution;
}

/// Caller-facing choice of resolver, validated before a batch starts.
#[derive(Debug, Clone)]
pub enum NamingStrategy {
    Pattern {
        document_type: DocumentType,
        pattern: Option<String>,
    },
    Spreadsheet(SpreadsheetFilter),
}

impl NamingStrategy {
    /// Build the resolver. Fails with a configuration error when the
    /// strategy cannot work (e.g. a generic document without a pattern).
    pub fn into_resolver(self) -> Result<Arc<dyn NameResolver>> {
        match self {
            Self::Pattern {
                document_type,
                pattern,
            } => Ok(Arc::new(PatternResolver::new(
                document_type,
                pattern.as_deref(),
            )?)),
            Self::Spreadsheet(filter) => Ok(Arc::new(SpreadsheetResolver::new(filter))),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pattern { .. } => "pattern",
            Self::Spreadsheet(_) => "spreadsheet",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenameError;

    #[test]
    fn test_unresolved_output_has_no_name() {
        let output = Resolution::Unresolved.into_output(Some(".pdf"));
        assert_eq!(output.name(), None);
        assert_eq!(output.extension(), Some(".pdf"));
    }

    #[test]
    fn test_blank_name_is_unresolved() {
        assert_eq!(Resolution::from_name(Some("  ".into())), Resolution::Unresolved);
        assert_eq!(Resolution::from_name(None), Resolution::Unresolved);
        assert!(Resolution::from_name(Some("B2".into())).is_resolved());
    }

    #[test]
    fn test_generic_strategy_without_pattern_is_configuration_error() {
        let strategy = NamingStrategy::Pattern {
            document_type: DocumentType::Generic,
            pattern: None,
        };
        assert!(matches!(
            strategy.into_resolver(),
            Err(RenameError::Configuration(_))
        ));
    }
}
