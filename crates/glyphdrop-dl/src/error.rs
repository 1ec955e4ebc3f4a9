use std::path::PathBuf;

use glyphdrop_utils::error::{FileSystemError, HashError};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum DownloadError {
    #[error(transparent)]
    #[diagnostic(
        code(glyphdrop_dl::network),
        help("Check your internet connection or try again later")
    )]
    Network(#[from] Box<ureq::Error>),

    #[error("HTTP {status}: {url}")]
    #[diagnostic(code(glyphdrop_dl::http_error))]
    HttpError { status: u16, url: String },

    #[error("I/O error: {0}")]
    #[diagnostic(code(glyphdrop_dl::io))]
    Io(#[from] std::io::Error),

    #[error("Invalid response from server")]
    #[diagnostic(code(glyphdrop_dl::invalid_response))]
    InvalidResponse,

    #[error("File name could not be determined")]
    #[diagnostic(code(glyphdrop_dl::no_filename))]
    NoFilename,

    #[error("Giving up on {url} after {attempts} attempts: {last}")]
    #[diagnostic(
        code(glyphdrop_dl::retries_exhausted),
        help("Check your internet connection or try again later")
    )]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last: String,
    },

    #[error("Refusing to download from untrusted URL: {url}")]
    #[diagnostic(
        code(glyphdrop_dl::untrusted_url),
        help("Release metadata pointed outside the official release downloads; do not retry")
    )]
    UntrustedUrl { url: String },

    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    #[diagnostic(
        code(glyphdrop_dl::checksum_mismatch),
        help("The downloaded file may be corrupted or tampered with. Try again later.")
    )]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("`{}` is not a valid zip archive: {reason}", path.display())]
    #[diagnostic(code(glyphdrop_dl::invalid_archive))]
    InvalidArchive { path: PathBuf, reason: String },

    #[error("No SHA-256 digest published for {asset}")]
    #[diagnostic(
        code(glyphdrop_dl::missing_digest),
        help("Re-run without --require-verify to accept unverified downloads")
    )]
    MissingDigest { asset: String },

    #[error("Unsafe archive entry: {entry}")]
    #[diagnostic(
        code(glyphdrop_dl::unsafe_entry),
        help("The archive contains absolute or parent-relative paths and was not extracted")
    )]
    UnsafeEntry { entry: String },

    #[error("Archive expands to {actual} bytes, above the limit of {limit} bytes")]
    #[diagnostic(code(glyphdrop_dl::archive_too_large))]
    ArchiveTooLarge { actual: u64, limit: u64 },

    #[error("No zip archives found in the latest release")]
    #[diagnostic(
        code(glyphdrop_dl::no_archive_assets),
        help("Available assets:\n{}", .available.join("\n"))
    )]
    NoArchiveAssets { available: Vec<String> },

    #[error(transparent)]
    #[diagnostic(code(glyphdrop_dl::zip))]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    FileSystem(#[from] FileSystemError),
}

impl From<ureq::Error> for DownloadError {
    fn from(e: ureq::Error) -> Self {
        Self::Network(Box::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_http_error() {
        let err = DownloadError::HttpError {
            status: 404,
            url: "https://example.com/notfound".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404: https://example.com/notfound");
    }

    #[test]
    fn test_download_error_untrusted_url() {
        let err = DownloadError::UntrustedUrl {
            url: "https://evil.example/font.zip".to_string(),
        };
        assert!(err.to_string().contains("https://evil.example/font.zip"));
    }

    #[test]
    fn test_download_error_archive_too_large() {
        let err = DownloadError::ArchiveTooLarge {
            actual: 600,
            limit: 512,
        };
        let msg = err.to_string();
        assert!(msg.contains("600"));
        assert!(msg.contains("512"));
    }

    #[test]
    fn test_download_error_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = DownloadError::Io(io_err);
        assert!(err.to_string().contains("I/O error"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_from_ureq_error() {
        let download_err: DownloadError = ureq::Error::ConnectionFailed.into();
        assert!(matches!(download_err, DownloadError::Network(_)));
    }
}
