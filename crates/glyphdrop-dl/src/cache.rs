//! File-name keyed archive cache.
//!
//! The cache key is the last path segment of the download URL, so two releases that reuse
//! an archive name share a slot. Stale content under a reused name is only caught by the
//! zip structure check or, when published, the digest.

use std::{
    fs,
    path::{Path, PathBuf},
    process,
    time::{SystemTime, UNIX_EPOCH},
};

use glyphdrop_utils::{
    fs::{ensure_private_dir, restrict_to_owner, safe_remove, StagingFile},
    hash::calculate_checksum,
};
use tracing::{debug, info, warn};

use crate::{
    archive::ensure_zip, error::DownloadError, transport::Transport, trust::verify_file,
    utils::filename_from_url,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// An intact cached blob was reused.
    Hit,
    /// The archive was downloaded and stored.
    Downloaded,
}

pub struct ArchiveCache<T: Transport> {
    root: PathBuf,
    transport: T,
}

impl<T: Transport> ArchiveCache<T> {
    pub fn new(root: impl Into<PathBuf>, transport: T) -> Self {
        Self {
            root: root.into(),
            transport,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache slot for `url`: the URL's file name under the cache root.
    pub fn slot_for(&self, url: &str) -> Result<PathBuf, DownloadError> {
        let name = filename_from_url(url).ok_or(DownloadError::NoFilename)?;
        if name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(DownloadError::NoFilename);
        }
        Ok(self.root.join(name))
    }

    /// Places the archive behind `url` at `dest`, downloading it only when no intact copy
    /// is cached.
    ///
    /// `expected_hex` is the SHA-256 the archive must match; `None` skips the digest check.
    /// A cached blob that fails the zip or digest check is purged and fetched again. A fresh
    /// download that fails either check is deleted and the error returned; the cache slot is
    /// only written after validation.
    pub fn fetch(
        &self,
        url: &str,
        dest: &Path,
        expected_hex: Option<&str>,
    ) -> Result<CacheOutcome, DownloadError> {
        let slot = self.slot_for(url)?;

        if self.reuse(&slot, expected_hex)? {
            fs::copy(&slot, dest)?;
            info!("Using cached archive {}", slot.display());
            return Ok(CacheOutcome::Hit);
        }

        ensure_private_dir(&self.root)?;
        let staging = StagingFile::new(self.staging_path(&slot));

        info!("Downloading {url}");
        self.transport.download(url, staging.path())?;
        validate_download(staging.path(), expected_hex)?;

        fs::rename(staging.path(), &slot)?;
        restrict_to_owner(&slot)?;
        fs::copy(&slot, dest)?;

        debug!("Cached {url} at {}", slot.display());
        Ok(CacheOutcome::Downloaded)
    }

    /// Returns `true` when `slot` holds an intact archive; purges it when it does not.
    fn reuse(&self, slot: &Path, expected_hex: Option<&str>) -> Result<bool, DownloadError> {
        let len = match fs::metadata(slot) {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => return Ok(false),
        };

        if len == 0 {
            safe_remove(slot)?;
            return Ok(false);
        }

        if let Err(err) = ensure_zip(slot) {
            warn!("Cached archive is corrupt ({err}); downloading again");
            safe_remove(slot)?;
            return Ok(false);
        }

        if let Some(expected) = expected_hex {
            if !verify_file(slot, expected)? {
                warn!(
                    "Cached archive {} does not match the published digest; downloading again",
                    slot.display()
                );
                safe_remove(slot)?;
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// A temporary path beside `slot`, unique to this process and moment.
    fn staging_path(&self, slot: &Path) -> PathBuf {
        let name = slot
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or_default();
        self.root
            .join(format!(".{name}.{}.{nanos}.part", process::id()))
    }
}

fn validate_download(path: &Path, expected_hex: Option<&str>) -> Result<(), DownloadError> {
    ensure_zip(path)?;

    if let Some(expected) = expected_hex {
        let actual = calculate_checksum(path)?;
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(DownloadError::ChecksumMismatch {
                file: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                expected: expected.to_string(),
                actual,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, os::unix::fs::PermissionsExt as _};

    use glyphdrop_utils::fs::cleanup_staging_files;
    use serial_test::serial;
    use tempfile::tempdir;

    use super::*;
    use crate::archive::tests::write_zip;

    const URL: &str =
        "https://github.com/glyphdrop/glyphmono/releases/download/v1.0/GlyphMono_v1.0.zip";

    /// Serves a fixed file for every URL and counts transfers.
    struct FixtureTransport {
        source: PathBuf,
        transfers: Cell<usize>,
    }

    impl FixtureTransport {
        fn new(source: PathBuf) -> Self {
            Self {
                source,
                transfers: Cell::new(0),
            }
        }
    }

    impl Transport for FixtureTransport {
        fn download(&self, _url: &str, dest: &Path) -> Result<u64, DownloadError> {
            self.transfers.set(self.transfers.get() + 1);
            Ok(fs::copy(&self.source, dest)?)
        }
    }

    /// Writes part of a body, then runs the interrupt cleanup before failing.
    struct InterruptedTransport {
        seen_partial: Cell<bool>,
    }

    impl Transport for InterruptedTransport {
        fn download(&self, _url: &str, dest: &Path) -> Result<u64, DownloadError> {
            fs::write(dest, b"PK\x03\x04 partial")?;
            self.seen_partial.set(dest.is_file());
            cleanup_staging_files();
            Err(DownloadError::Io(std::io::Error::new(
                std::io::ErrorKind::Interrupted,
                "interrupted",
            )))
        }
    }

    fn fixture(dir: &Path) -> PathBuf {
        let path = dir.join("upstream.zip");
        write_zip(&path, &[("GlyphMono-Regular.ttf", "regular")]);
        path
    }

    fn staging_leftovers(root: &Path) -> usize {
        fs::read_dir(root)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
                    .count()
            })
            .unwrap_or(0)
    }

    #[test]
    #[serial]
    fn test_second_fetch_reuses_cache() {
        let dir = tempdir().unwrap();
        let transport = FixtureTransport::new(fixture(dir.path()));
        let cache = ArchiveCache::new(dir.path().join("cache"), &transport);

        let first = dir.path().join("first.zip");
        let second = dir.path().join("second.zip");

        assert_eq!(
            cache.fetch(URL, &first, None).unwrap(),
            CacheOutcome::Downloaded
        );
        let slot = cache.slot_for(URL).unwrap();
        let cached = fs::read(&slot).unwrap();

        assert_eq!(cache.fetch(URL, &second, None).unwrap(), CacheOutcome::Hit);
        assert_eq!(transport.transfers.get(), 1);
        assert_eq!(fs::read(&slot).unwrap(), cached);
        assert_eq!(fs::read(&second).unwrap(), cached);
    }

    #[test]
    #[serial]
    fn test_cache_permissions_are_owner_only() {
        let dir = tempdir().unwrap();
        let transport = FixtureTransport::new(fixture(dir.path()));
        let cache = ArchiveCache::new(dir.path().join("cache"), &transport);

        cache.fetch(URL, &dir.path().join("out.zip"), None).unwrap();

        let root_mode = fs::metadata(cache.root()).unwrap().permissions().mode();
        let slot_mode = fs::metadata(cache.slot_for(URL).unwrap())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(root_mode & 0o777, 0o700);
        assert_eq!(slot_mode & 0o777, 0o600);
    }

    #[test]
    #[serial]
    fn test_corrupt_cache_entry_is_refetched() {
        let dir = tempdir().unwrap();
        let transport = FixtureTransport::new(fixture(dir.path()));
        let cache = ArchiveCache::new(dir.path().join("cache"), &transport);

        fs::create_dir_all(cache.root()).unwrap();
        let slot = cache.slot_for(URL).unwrap();
        fs::write(&slot, b"truncated").unwrap();

        let out = dir.path().join("out.zip");
        assert_eq!(
            cache.fetch(URL, &out, None).unwrap(),
            CacheOutcome::Downloaded
        );
        assert_eq!(transport.transfers.get(), 1);
        assert!(ensure_zip(&slot).is_ok());
    }

    #[test]
    #[serial]
    fn test_digest_mismatch_on_cached_entry_is_refetched() {
        let dir = tempdir().unwrap();
        let upstream = fixture(dir.path());
        let digest = calculate_checksum(&upstream).unwrap();
        let transport = FixtureTransport::new(upstream);
        let cache = ArchiveCache::new(dir.path().join("cache"), &transport);

        fs::create_dir_all(cache.root()).unwrap();
        let stale = dir.path().join("stale.zip");
        write_zip(&stale, &[("GlyphMono-Bold.ttf", "old release")]);
        fs::copy(&stale, cache.slot_for(URL).unwrap()).unwrap();

        let out = dir.path().join("out.zip");
        assert_eq!(
            cache.fetch(URL, &out, Some(&digest)).unwrap(),
            CacheOutcome::Downloaded
        );
        assert_eq!(calculate_checksum(&out).unwrap(), digest);
    }

    #[test]
    #[serial]
    fn test_fresh_download_with_wrong_digest_fails_and_leaves_no_slot() {
        let dir = tempdir().unwrap();
        let transport = FixtureTransport::new(fixture(dir.path()));
        let cache = ArchiveCache::new(dir.path().join("cache"), &transport);

        let wrong = "0".repeat(64);
        let err = cache
            .fetch(URL, &dir.path().join("out.zip"), Some(&wrong))
            .unwrap_err();

        assert!(matches!(err, DownloadError::ChecksumMismatch { .. }));
        assert!(!cache.slot_for(URL).unwrap().exists());
        assert_eq!(staging_leftovers(cache.root()), 0);
    }

    #[test]
    #[serial]
    fn test_fresh_download_that_is_not_a_zip_fails() {
        let dir = tempdir().unwrap();
        let bogus = dir.path().join("bogus");
        fs::write(&bogus, b"<html>not found</html>").unwrap();
        let transport = FixtureTransport::new(bogus);
        let cache = ArchiveCache::new(dir.path().join("cache"), &transport);

        let err = cache
            .fetch(URL, &dir.path().join("out.zip"), None)
            .unwrap_err();

        assert!(matches!(err, DownloadError::InvalidArchive { .. }));
        assert!(!cache.slot_for(URL).unwrap().exists());
        assert_eq!(staging_leftovers(cache.root()), 0);
    }

    #[test]
    #[serial]
    fn test_interrupted_download_leaves_no_partial_file() {
        let dir = tempdir().unwrap();
        let transport = InterruptedTransport {
            seen_partial: Cell::new(false),
        };
        let cache = ArchiveCache::new(dir.path().join("cache"), &transport);

        assert!(cache.fetch(URL, &dir.path().join("out.zip"), None).is_err());
        assert!(transport.seen_partial.get());
        assert_eq!(staging_leftovers(cache.root()), 0);
        assert!(!cache.slot_for(URL).unwrap().exists());
    }

    #[test]
    #[serial]
    fn test_slot_for_rejects_unusable_names() {
        let dir = tempdir().unwrap();
        let transport = FixtureTransport::new(fixture(dir.path()));
        let cache = ArchiveCache::new(dir.path().join("cache"), &transport);

        assert!(cache
            .slot_for("https://github.com/glyphdrop/glyphmono/releases/download/v1/")
            .is_err());
        assert!(cache
            .slot_for("https://github.com/glyphdrop/glyphmono/releases/download/v1/..%2F..%2Fx.zip")
            .is_err());
        assert_eq!(
            cache.slot_for(URL).unwrap(),
            dir.path().join("cache").join("GlyphMono_v1.0.zip")
        );
    }
}
