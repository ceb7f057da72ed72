//! Per-document audit log produced alongside every export.

use serde::Serialize;

/// Outcome of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    Success,
    Failure,
}

/// One row per document added to a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRow {
    #[serde(rename = "STATUS")]
    pub status: AuditStatus,
    #[serde(rename = "ORIGIN_NAME")]
    pub origin_name: String,
    #[serde(rename = "NEW_NAME")]
    pub new_name: Option<String>,
    /// Failure reason, empty on success.
    #[serde(rename = "DETAIL")]
    pub detail: Option<String>,
}

impl AuditRow {
    pub fn success(origin_name: String, new_name: String) -> Self {
        Self {
            status: AuditStatus::Success,
            origin_name,
            new_name: Some(new_name),
            detail: None,
        }
    }

    pub fn failure(origin_name: String, detail: impl ToString) -> Self {
        Self {
            status: AuditStatus::Failure,
            origin_name,
            new_name: None,
            detail: Some(detail.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == AuditStatus::Success
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditLog {
    rows: Vec<AuditRow>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: AuditRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[AuditRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn successes(&self) -> usize {
        self.rows.iter().filter(|r| r.is_success()).count()
    }

    pub fn failures(&self) -> usize {
        self.len() - self.successes()
    }

    /// CSV rendering with a header row, even when there are no rows.
    pub fn to_csv(&self) -> csv::Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        if self.rows.is_empty() {
            writer.write_record(["STATUS", "ORIGIN_NAME", "NEW_NAME", "DETAIL"])?;
        }
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))
    }
}
