//! Tabular data exchanged with the extraction and spreadsheet boundaries.

use serde::Serialize;

/// Column holding one extracted line of text.
pub const TEXT: &str = "TEXT";
/// Column holding the document's extension.
pub const FILETYPE: &str = "FILETYPE";
/// Column holding the document's original file name.
pub const FILE_NAME: &str = "FILE_NAME";

/// One line of text extracted from a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextRow {
    #[serde(rename = "FILE_NAME")]
    pub file_name: Option<String>,
    #[serde(rename = "FILETYPE")]
    pub file_type: Option<String>,
    #[serde(rename = "TEXT")]
    pub text: String,
}

/// Text extracted from a single document, one row per line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextTable {
    rows: Vec<TextRow>,
}

impl TextTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from raw lines, dropping blank ones.
    pub fn from_lines<I, S>(file_name: Option<&str>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rows = lines
            .into_iter()
            .filter_map(|line| {
                let text = line.as_ref().trim();
                (!text.is_empty()).then(|| TextRow {
                    file_name: file_name.map(str::to_string),
                    file_type: None,
                    text: text.to_string(),
                })
            })
            .collect();
        Self { rows }
    }

    pub fn push(&mut self, row: TextRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[TextRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The TEXT column.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.text.as_str())
    }

    /// Move all rows of `other` to the end of this table.
    pub fn append(&mut self, other: TextTable) {
        self.rows.extend(other.rows);
    }

    /// CSV rendering (`FILE_NAME, FILETYPE, TEXT`).
    pub fn to_csv(&self) -> csv::Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        if self.rows.is_empty() {
            writer.write_record([FILE_NAME, FILETYPE, TEXT])?;
        }
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))
    }

    /// Set FILETYPE on rows that have none.
    pub fn fill_file_type(&mut self, extension: Option<&str>) {
        for row in &mut self.rows {
            if row.file_type.is_none() {
                row.file_type = extension.map(str::to_string);
            }
        }
    }
}

/// Spreadsheet data with named columns. Cells are kept as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, ignoring surrounding whitespace in headers.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Cell at `row` in column `column`; short rows read as empty cells.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        let row = self.rows.get(row)?;
        Some(row.get(column).map(String::as_str).unwrap_or(""))
    }

    /// All values of a column in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|r| r.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }
}
