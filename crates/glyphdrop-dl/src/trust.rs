//! Source trust and content verification for release archives.

use std::path::Path;

use glyphdrop_utils::hash::verify_checksum;
use tracing::warn;

use crate::error::DownloadError;

/// Every archive download link must start with this prefix.
pub const TRUSTED_PREFIX: &str = "https://github.com/glyphdrop/glyphmono/releases/download/";

const DIGEST_ALGORITHM: &str = "sha256:";
const SHA256_HEX_LEN: usize = 64;

/// Returns `true` iff `url` lies under [`TRUSTED_PREFIX`].
pub fn is_trusted_url(url: &str) -> bool {
    url.starts_with(TRUSTED_PREFIX)
}

pub fn ensure_trusted(url: &str) -> Result<(), DownloadError> {
    if is_trusted_url(url) {
        Ok(())
    } else {
        Err(DownloadError::UntrustedUrl {
            url: url.to_string(),
        })
    }
}

/// Extracts a lowercase SHA-256 hex digest from an asset's `digest` field.
///
/// Only `sha256:` followed by exactly 64 hex characters is accepted; every other shape,
/// including a missing field, means no digest is available.
///
/// # Examples
///
/// ```
/// use glyphdrop_dl::trust::extract_digest;
///
/// let hex = "AB".repeat(32);
/// assert_eq!(extract_digest(Some(&format!("sha256:{hex}"))), Some("ab".repeat(32)));
/// assert_eq!(extract_digest(Some("md5:abc")), None);
/// assert_eq!(extract_digest(None), None);
/// ```
pub fn extract_digest(field: Option<&str>) -> Option<String> {
    let hex = field?.strip_prefix(DIGEST_ALGORITHM)?;
    (hex.len() == SHA256_HEX_LEN && hex.bytes().all(|b| b.is_ascii_hexdigit()))
        .then(|| hex.to_ascii_lowercase())
}

/// Computes the SHA-256 of `path` and compares it case-insensitively with `expected_hex`.
pub fn verify_file<P: AsRef<Path>>(path: P, expected_hex: &str) -> Result<bool, DownloadError> {
    Ok(verify_checksum(path, expected_hex)?)
}

/// How strictly downloaded archives are checked against published digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerifyPolicy {
    /// Never verify.
    Skip,
    /// Verify when a digest is published, warn when it is not.
    #[default]
    Default,
    /// A missing digest is fatal.
    Strict,
}

impl VerifyPolicy {
    /// Decides which digest, if any, the download of `asset` must match.
    ///
    /// # Errors
    ///
    /// [`DownloadError::MissingDigest`] under [`VerifyPolicy::Strict`] when no usable digest
    /// is published.
    pub fn expected_digest(
        self,
        asset: &str,
        digest_field: Option<&str>,
    ) -> Result<Option<String>, DownloadError> {
        if self == VerifyPolicy::Skip {
            warn!("Checksum verification disabled for {asset}");
            return Ok(None);
        }

        match extract_digest(digest_field) {
            Some(digest) => Ok(Some(digest)),
            None if self == VerifyPolicy::Strict => {
                Err(DownloadError::MissingDigest {
                    asset: asset.to_string(),
                })
            }
            None => {
                warn!("No SHA-256 digest published for {asset}; continuing without verification");
                Ok(None)
            }
        }
    }
}
