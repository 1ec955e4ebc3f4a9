//! Zip inspection and guarded extraction.
//!
//! Entry names are validated and the declared uncompressed size is capped before a single
//! byte is written. The size cap trusts the sizes recorded in the archive's central
//! directory; it is not a streaming byte count.

use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

use tracing::debug;
use zip::ZipArchive;

use crate::error::DownloadError;

/// Ceiling for the summed declared uncompressed size of an archive (512 MiB).
pub const MAX_UNCOMPRESSED_BYTES: u64 = 512 * 1024 * 1024;

fn open_archive(path: &Path) -> Result<ZipArchive<File>, DownloadError> {
    let file = File::open(path)?;
    ZipArchive::new(file).map_err(|err| {
        DownloadError::InvalidArchive {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    })
}

/// Checks that `path` opens as a zip archive and returns its entry count.
pub fn ensure_zip<P: AsRef<Path>>(path: P) -> Result<usize, DownloadError> {
    Ok(open_archive(path.as_ref())?.len())
}

/// Lists entry names in central directory order.
pub fn list_entries<P: AsRef<Path>>(path: P) -> Result<Vec<String>, DownloadError> {
    let mut archive = open_archive(path.as_ref())?;
    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        names.push(archive.by_index_raw(i)?.name().to_string());
    }
    Ok(names)
}

fn is_unsafe_entry(name: &str) -> bool {
    name.starts_with('/') || name.contains('\\') || name.split('/').any(|seg| seg == "..")
}

/// Rejects absolute names, backslashes and `..` segments. The first offender is reported.
pub fn validate_entries<S: AsRef<str>>(entries: &[S]) -> Result<(), DownloadError> {
    for entry in entries {
        let entry: &str = entry.as_ref();
        if is_unsafe_entry(entry) {
            return Err(DownloadError::UnsafeEntry {
                entry: entry.to_string(),
            });
        }
    }
    Ok(())
}

/// Sum of every entry's declared uncompressed size.
pub fn uncompressed_size<P: AsRef<Path>>(path: P) -> Result<u64, DownloadError> {
    let mut archive = open_archive(path.as_ref())?;
    let mut total = 0u64;
    for i in 0..archive.len() {
        total = total.saturating_add(archive.by_index_raw(i)?.size());
    }
    Ok(total)
}

/// Fails with [`DownloadError::ArchiveTooLarge`] when the declared size exceeds `max_bytes`.
pub fn enforce_limit<P: AsRef<Path>>(path: P, max_bytes: u64) -> Result<u64, DownloadError> {
    let actual = uncompressed_size(path)?;
    if actual > max_bytes {
        return Err(DownloadError::ArchiveTooLarge {
            actual,
            limit: max_bytes,
        });
    }
    Ok(actual)
}

/// Validates and extracts `archive_path` into `dest`, returning the files written.
pub fn extract_archive<P: AsRef<Path>, Q: AsRef<Path>>(
    archive_path: P,
    dest: Q,
    max_bytes: u64,
) -> Result<Vec<PathBuf>, DownloadError> {
    let archive_path = archive_path.as_ref();
    let dest = dest.as_ref();

    let entries = list_entries(archive_path)?;
    validate_entries(entries.as_slice())?;
    let declared = enforce_limit(archive_path, max_bytes)?;
    debug!(
        "Extracting {} entries ({declared} bytes) from {}",
        entries.len(),
        archive_path.display()
    );

    fs::create_dir_all(dest)?;
    let mut archive = open_archive(archive_path)?;
    let mut written = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let relative = entry.enclosed_name().ok_or_else(|| {
            DownloadError::UnsafeEntry {
                entry: entry.name().to_string(),
            }
        })?;
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
        written.push(out_path);
    }

    Ok(written)
}
