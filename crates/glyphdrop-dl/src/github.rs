use serde::Deserialize;
use tracing::debug;

use crate::{
    error::DownloadError,
    http::Http,
    transport::{with_retry, Attempt, RetryPolicy},
};

/// The single metadata endpoint consulted for releases.
pub const METADATA_URL: &str = "https://api.github.com/repos/glyphdrop/glyphmono/releases/latest";

#[derive(Debug, Clone, Deserialize)]
pub struct GithubRelease {
    pub name: Option<String>,
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<GithubAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubAsset {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    pub browser_download_url: String,
    /// Published digest, e.g. `sha256:<hex>`.
    #[serde(default)]
    pub digest: Option<String>,
}

/// Anything that can describe the latest upstream release.
pub trait ReleaseSource {
    fn latest_release(&self) -> Result<GithubRelease, DownloadError>;
}

impl<T: ReleaseSource + ?Sized> ReleaseSource for &T {
    fn latest_release(&self) -> Result<GithubRelease, DownloadError> {
        (**self).latest_release()
    }
}

/// [`ReleaseSource`] backed by the GitHub releases API.
pub struct Github {
    url: String,
    retry: RetryPolicy,
}

impl Github {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            url: METADATA_URL.to_string(),
            retry,
        }
    }
}

impl ReleaseSource for Github {
    fn latest_release(&self) -> Result<GithubRelease, DownloadError> {
        let release: GithubRelease =
            with_retry(&self.url, &self.retry, || Attempt::from(Http::json(&self.url)))?;
        debug!(
            "Latest release {} ({} assets)",
            release.tag_name,
            release.assets.len()
        );
        Ok(release)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_deserializes_with_and_without_digest() {
        let json = r#"{
            "name": "GlyphMono 1.2",
            "tag_name": "v1.2",
            "prerelease": false,
            "assets": [
                {
                    "name": "GlyphMono_v1.2.zip",
                    "size": 1024,
                    "browser_download_url": "https://github.com/glyphdrop/glyphmono/releases/download/v1.2/GlyphMono_v1.2.zip",
                    "digest": "sha256:0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef"
                },
                {
                    "name": "GlyphMono_NF_v1.2.zip",
                    "size": 2048,
                    "browser_download_url": "https://github.com/glyphdrop/glyphmono/releases/download/v1.2/GlyphMono_NF_v1.2.zip",
                    "digest": null
                },
                {
                    "name": "checksums.txt",
                    "browser_download_url": "https://github.com/glyphdrop/glyphmono/releases/download/v1.2/checksums.txt"
                }
            ]
        }"#;

        let release: GithubRelease = serde_json::from_str(json).unwrap();
        assert_eq!(release.tag_name, "v1.2");
        assert_eq!(release.assets.len(), 3);
        assert!(release.assets[0].digest.is_some());
        assert!(release.assets[1].digest.is_none());
        assert!(release.assets[2].digest.is_none());
        assert_eq!(release.assets[2].size, 0);
    }

    #[test]
    fn test_github_uses_fixed_endpoint() {
        let gh = Github::new(RetryPolicy::default());
        assert_eq!(gh.url, METADATA_URL);
        assert!(gh.url.starts_with("https://"));
    }
}
