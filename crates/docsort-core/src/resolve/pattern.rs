//! Free-text resolution: a caller pattern for generic documents, fixed
//! label/value fields for known document layouts.

use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::{NameResolver, Resolution};
use crate::error::{RenameError, Result};
use crate::files::{sanitize, truncate_chars};
use crate::table::TextTable;

/// Longest name a pattern match may produce.
const MAX_NAME_CHARS: usize = 90;

/// Calculation letters carry a consumer unit number: `UC: 1234-5`.
const CARTA_CALCULO_FIELD: &str = r"\b(?:unidade\s+consumidora|instala[cç][aã]o|uc)\b\s*(?:n[ºo°.]*)?\s*[:#\-]?\s*([0-9][0-9.\-/]*)";

/// PPE sheets carry the employee name: `Nome do colaborador: JOAO`.
const EPI_FIELD: &str = r"\b(?:nome\s+do\s+(?:colaborador|funcion[aá]rio)|colaborador|funcion[aá]rio|nome)\b\s*[:\-]\s*(.+)$";

/// Known document layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Any document; the caller supplies the pattern.
    #[default]
    Generic,
    /// Utility calculation letter, named after its consumer unit.
    CartaCalculo,
    /// PPE (EPI) delivery sheet, named after the employee.
    Epi,
}

impl FromStr for DocumentType {
    type Err = RenameError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "generic" | "generico" => Ok(Self::Generic),
            "carta_calculo" | "carta-calculo" | "cartas" | "carta" => Ok(Self::CartaCalculo),
            "epi" | "epis" => Ok(Self::Epi),
            other => Err(RenameError::configuration(format!(
                "unknown document type '{}'",
                other
            ))),
        }
    }
}

/// Resolves names by matching text lines.
#[derive(Debug, Clone)]
pub struct PatternResolver {
    document_type: DocumentType,
    matcher: Regex,
}

impl PatternResolver {
    /// Generic documents require a pattern; typed documents ignore it.
    pub fn new(document_type: DocumentType, pattern: Option<&str>) -> Result<Self> {
        let matcher = match document_type {
            DocumentType::Generic => {
                let pattern = pattern.map(str::trim).filter(|p| !p.is_empty()).ok_or_else(|| {
                    RenameError::configuration("a text pattern is required for generic documents")
                })?;
                user_pattern(pattern)?
            }
            DocumentType::CartaCalculo => field_pattern(CARTA_CALCULO_FIELD)?,
            DocumentType::Epi => field_pattern(EPI_FIELD)?,
        };
        Ok(Self {
            document_type,
            matcher,
        })
    }

    /// Resolver for generic documents.
    pub fn generic(pattern: &str) -> Result<Self> {
        Self::new(DocumentType::Generic, Some(pattern))
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    fn derive_name(&self, table: &TextTable) -> Option<String> {
        match self.document_type {
            // First matching line becomes the name.
            DocumentType::Generic => table
                .lines()
                .find(|line| self.matcher.is_match(line))
                .map(str::to_string),
            DocumentType::CartaCalculo => {
                self.field_value(table).map(|value| format!("UC {}", value))
            }
            DocumentType::Epi => self.field_value(table).map(|value| {
                // OCR keeps neighbouring fields on the same line, separated by wide gaps.
                let name = value.split("  ").next().unwrap_or(&value).trim().to_string();
                format!("EPI {}", name)
            }),
        }
    }

    fn field_value(&self, table: &TextTable) -> Option<String> {
        table.lines().find_map(|line| {
            self.matcher
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|value| !value.is_empty())
        })
    }
}

impl NameResolver for PatternResolver {
    fn resolve(&self, table: &TextTable) -> Resolution {
        let name = self
            .derive_name(table)
            .map(|name| truncate_chars(&sanitize(&name), MAX_NAME_CHARS));
        Resolution::from_name(name)
    }
}

/// Case-insensitive regex; an invalid expression is matched literally.
fn user_pattern(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .or_else(|_| {
            tracing::debug!(pattern, "Pattern is not a valid regex, matching literally");
            RegexBuilder::new(&regex::escape(pattern))
                .case_insensitive(true)
                .build()
        })
        .map_err(|e| RenameError::configuration(format!("invalid pattern '{}': {}", pattern, e)))
}

fn field_pattern(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| RenameError::configuration(e.to_string()))
}
