//! Append-mode zip archive handling.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::Result;

/// Appends one file into the archive under `entry_name`, creating the
/// archive if it does not exist yet. Returns the number of bytes copied.
///
/// The writer is finished (central directory written) before returning, so
/// the archive on disk is readable after every single append. If the archive
/// already holds an entry with this name, the new entry gets a ` (n)` suffix
/// before the extension and the collision is logged; duplicate names are
/// rejected by the zip writer, and silently dropping bytes would break the
/// resume invariant.
///
/// # Errors
///
/// Returns an error if the archive cannot be opened or the entry cannot be
/// written.
pub fn append_file(archive_path: &Path, entry_name: &str, source: &Path) -> Result<u64> {
    let mut reader = File::open(source)?;

    let existing = existing_names(archive_path)?;
    let name = unique_entry_name(&existing, entry_name);
    if name != entry_name {
        log::warn!("archive already contains '{entry_name}'; storing as '{name}'");
    }

    let mut writer = open_writer(archive_path)?;
    writer.start_file(&name, SimpleFileOptions::default())?;
    let bytes = io::copy(&mut reader, &mut writer)?;
    writer.finish()?;
    Ok(bytes)
}

/// Entry names already present in the archive; empty when the archive does
/// not exist yet.
fn existing_names(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }
    let archive = zip::ZipArchive::new(File::open(path)?)?;
    Ok(archive.file_names().map(str::to_string).collect())
}

/// Picks `name`, or `stem (n).ext` for the first free `n >= 2`.
fn unique_entry_name(existing: &HashSet<String>, name: &str) -> String {
    if !existing.contains(name) {
        return name.to_string();
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };
    let mut n = 2_usize;
    loop {
        let candidate = ext.map_or_else(
            || format!("{stem} ({n})"),
            |ext| format!("{stem} ({n}).{ext}"),
        );
        if !existing.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn open_writer(path: &Path) -> Result<ZipWriter<File>> {
    if path.exists() {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(ZipWriter::new_append(file)?)
    } else {
        Ok(ZipWriter::new(File::create(path)?))
    }
}
