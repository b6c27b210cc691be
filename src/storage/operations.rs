//! Storage operations
//!
//! Builds the directory listing sent over the data connection for LIST.

use std::fs::{self, Metadata};
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::warn;

/// Lists `path` as `ls -l` style lines, CRLF terminated and sorted by name.
///
/// A directory lists its entries; a file lists itself.
pub fn list_directory(path: &Path) -> io::Result<String> {
    let metadata = fs::metadata(path)?;

    if !metadata.is_dir() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(format_entry(&name, &metadata));
    }

    let mut entries: Vec<_> = fs::read_dir(path)?.flatten().collect();
    entries.sort_by_key(|entry| entry.file_name());

    let mut listing = String::new();
    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        match entry.metadata() {
            Ok(metadata) => listing.push_str(&format_entry(&name, &metadata)),
            Err(e) => warn!("Skipping {} in listing: {}", entry.path().display(), e),
        }
    }
    Ok(listing)
}

/// Formats one listing line:
/// `<type>rwxr-xr-x 1 ftp ftp <size> <Mon dd HH:MM> <name>\r\n`.
pub fn format_entry(name: &str, metadata: &Metadata) -> String {
    let kind = if metadata.is_dir() {
        'd'
    } else if metadata.file_type().is_symlink() {
        'l'
    } else {
        '-'
    };
    let modified: DateTime<Utc> = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_default();

    format!(
        "{kind}rwxr-xr-x 1 ftp ftp {:>12} {} {}\r\n",
        metadata.len(),
        modified.format("%b %d %H:%M"),
        name
    )
}
