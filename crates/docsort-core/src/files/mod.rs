//! File identity, origin/output pairing and name helpers.

mod name;
mod pair;
mod record;

pub use name::{is_null_sentinel, normalize_extension, sanitize, split_file_name, truncate_chars};
pub use pair::{CommitOutcome, KeyedFilePair};
pub use record::{DocumentKind, FileRecord};
