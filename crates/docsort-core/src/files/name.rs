//! Filename helpers shared by records and resolvers.

/// Cell values that spreadsheet exports use to mean "no value".
const NULL_SENTINELS: &[&str] = &["", "nan", "NaN", "NaT", "NaD", "None", "none", "null"];

/// Characters that are not allowed in file names on common filesystems.
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Returns true if the string is empty or one of the null sentinels.
pub fn is_null_sentinel(value: &str) -> bool {
    NULL_SENTINELS.contains(&value.trim())
}

/// Normalize an extension to start with `.`; absent for empty or `nan`.
pub fn normalize_extension(extension: &str) -> Option<String> {
    let trimmed = extension.trim().trim_start_matches('.');
    if is_null_sentinel(trimmed) {
        return None;
    }
    Some(format!(".{}", trimmed))
}

/// Split `report.final.pdf` into (`report.final`, `Some(".pdf")`).
///
/// Dotfiles such as `.env` are treated as having no extension.
pub fn split_file_name(file_name: &str) -> (String, Option<String>) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => {
            let (stem, ext) = file_name.split_at(idx);
            (stem.to_string(), normalize_extension(ext))
        }
        _ => (file_name.to_string(), None),
    }
}

/// Make a name safe to use as a file name.
///
/// Removes illegal and control characters, collapses runs of whitespace to a
/// single space and strips trailing dots.
pub fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_whitespace() || (!ILLEGAL_CHARS.contains(c) && !c.is_control()))
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim_end_matches(&['.', ' '][..]).to_string()
}

/// Truncate to at most `max_chars` characters, on a char boundary.
pub fn truncate_chars(name: &str, max_chars: usize) -> String {
    if name.chars().count() > max_chars {
        name.chars().take(max_chars).collect::<String>().trim_end().to_string()
    } else {
        name.to_string()
    }
}
