//! Archive entry model and archive-internal path rules.
//!
//! Pure data and string handling; the zip container itself lives in
//! `crate::infra::archive`.

use serde::Serialize;

/// One entry of an open archive.
///
/// Copying an entry between archives keeps all of its metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub data: Vec<u8>,
    pub directory: bool,
    pub compressed: bool,
    pub modified: Option<EntryTimestamp>,
    pub unix_mode: Option<u32>,
}

impl ArchiveEntry {
    /// A deflated file entry without timestamp or permissions.
    #[must_use]
    pub fn file(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            compressed: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn directory() -> Self {
        Self {
            directory: true,
            ..Self::default()
        }
    }
}

/// DOS-style modification time as stored in zip headers (two-second
/// resolution, years 1980 to 2107).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntryTimestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Normalize a path to archive form: `/` separators, no leading `/`.
#[must_use]
pub fn normalize_entry_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    unified.trim_start_matches('/').to_string()
}

/// The other spelling of `path`: `a/b/` for `a/b` and the reverse.
#[must_use]
pub fn alternate_form(path: &str) -> String {
    match path.strip_suffix('/') {
        Some(file) => file.to_string(),
        None => format!("{path}/"),
    }
}

/// Last path segment, ignoring a trailing `/`.
#[must_use]
pub fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Whether `path` can be stored as an entry name: relative, non-empty and
/// free of `.`/`..` segments.
#[must_use]
pub fn is_valid_entry_path(path: &str) -> bool {
    let trimmed = path.trim_end_matches('/');
    !trimmed.is_empty()
        && !path.starts_with('/')
        && !path.contains('\\')
        && trimmed
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}
