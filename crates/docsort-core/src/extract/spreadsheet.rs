use anyhow::{Context, Result};

use crate::table::Table;

/// Parse CSV bytes into a [`Table`]. The first record is the header row.
///
/// Spreadsheet exports use `;` in locales where `,` is the decimal mark,
/// so the delimiter is picked from the header line.
pub fn read_spreadsheet(bytes: &[u8]) -> Result<Table> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let delimiter = sniff_delimiter(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read spreadsheet header")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read spreadsheet row {}", i + 1))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    tracing::debug!(
        columns = headers.len(),
        rows = rows.len(),
        delimiter = %(delimiter as char),
        "Read spreadsheet"
    );
    Ok(Table::new(headers, rows))
}

fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let header = bytes.split(|&b| b == b'\n').next().unwrap_or_default();
    let count = |d: u8| header.iter().filter(|&&b| b == d).count();
    if count(b';') > count(b',') {
        b';'
    } else {
        b','
    }
}
