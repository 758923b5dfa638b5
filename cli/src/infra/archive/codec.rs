//! Zip container encoding for [`ArchiveEntry`] maps.

use std::io::{Read, Seek, Write};

use indexmap::IndexMap;
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::domain::archive::{ArchiveEntry, EntryTimestamp};
use crate::domain::error::EmbedError;

/// Ordered entry map of an open archive.
pub type Entries = IndexMap<String, ArchiveEntry>;

/// Read every entry of a zip container, in container order.
///
/// # Errors
///
/// Returns [`EmbedError::ArchiveIo`] if the container or an entry cannot be
/// read.
pub fn read_entries<R: Read + Seek>(reader: R, label: &str) -> Result<Entries, EmbedError> {
    let mut zip = ZipArchive::new(reader)
        .map_err(|e| EmbedError::archive_io(format!("cannot open archive {label}"), e))?;
    let mut entries = Entries::with_capacity(zip.len());
    for i in 0..zip.len() {
        let mut file = zip
            .by_index(i)
            .map_err(|e| EmbedError::archive_io(format!("cannot read entry #{i} of {label}"), e))?;
        let name = file.name().to_string();
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| EmbedError::archive_io(format!("cannot read '{name}' in {label}"), e))?;
        let entry = ArchiveEntry {
            data,
            directory: file.is_dir(),
            compressed: file.compression() != CompressionMethod::Stored,
            modified: Some(timestamp_from_zip(file.last_modified())),
            unix_mode: file.unix_mode(),
        };
        entries.insert(name, entry);
    }
    debug!(archive = label, entries = entries.len(), "Read archive");
    Ok(entries)
}

/// Write `entries` as a complete zip container.
///
/// # Errors
///
/// Returns [`EmbedError::ArchiveIo`] if an entry cannot be written.
pub fn write_entries<W: Write + Seek>(writer: W, entries: &Entries, label: &str) -> Result<W, EmbedError> {
    let mut zip = ZipWriter::new(writer);
    for (name, entry) in entries {
        let failed = |e: zip::result::ZipError| {
            EmbedError::archive_io(format!("cannot write '{name}' to {label}"), e)
        };
        let options = entry_options(entry);
        if entry.directory {
            zip.add_directory(name.as_str(), options).map_err(failed)?;
        } else {
            zip.start_file(name.as_str(), options).map_err(failed)?;
            zip.write_all(&entry.data)
                .map_err(|e| EmbedError::archive_io(format!("cannot write '{name}' to {label}"), e))?;
        }
    }
    zip.finish()
        .map_err(|e| EmbedError::archive_io(format!("cannot finish {label}"), e))
}

fn entry_options(entry: &ArchiveEntry) -> FileOptions {
    let method = if entry.compressed && !entry.directory {
        CompressionMethod::Deflated
    } else {
        CompressionMethod::Stored
    };
    let mut options = FileOptions::default().compression_method(method);
    if let Some(time) = entry.modified.and_then(timestamp_to_zip) {
        options = options.last_modified_time(time);
    }
    if let Some(mode) = entry.unix_mode {
        options = options.unix_permissions(mode);
    }
    options
}

fn timestamp_from_zip(time: DateTime) -> EntryTimestamp {
    EntryTimestamp {
        year: time.year(),
        month: time.month(),
        day: time.day(),
        hour: time.hour(),
        minute: time.minute(),
        second: time.second(),
    }
}

fn timestamp_to_zip(ts: EntryTimestamp) -> Option<DateTime> {
    DateTime::from_date_and_time(ts.year, ts.month, ts.day, ts.hour, ts.minute, ts.second).ok()
}
