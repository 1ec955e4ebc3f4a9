//! Archive asset selection from a release.

use std::{collections::HashSet, fmt, sync::LazyLock};

use glyphdrop_utils::string::normalize_token;
use regex::Regex;

use crate::{
    error::DownloadError, github::GithubRelease, trust::ensure_trusted,
    utils::filename_from_url,
};

/// Product name every archive and font file starts with.
pub const PRODUCT: &str = "GlyphMono";

pub const ARCHIVE_EXTENSION: &str = ".zip";

static BUNDLE_TEMPLATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^GlyphMono(?:_(NF|HS))?_v\d[\w.\-]*\.zip$")
        .expect("unable to compile bundle template regex")
});

static VERSION_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[_\-.]?v\d.*$").expect("unable to compile version suffix regex")
});

/// Font family grouping published as a separate archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BundleKey {
    Standard,
    Nf,
    Hs,
}

impl BundleKey {
    /// Default preference when nothing else decides.
    pub const PREFERENCE: [BundleKey; 3] = [BundleKey::Standard, BundleKey::Nf, BundleKey::Hs];

    pub fn as_str(&self) -> &'static str {
        match self {
            BundleKey::Standard => "standard",
            BundleKey::Nf => "nf",
            BundleKey::Hs => "hs",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "standard" => Some(BundleKey::Standard),
            "nf" => Some(BundleKey::Nf),
            "hs" => Some(BundleKey::Hs),
            _ => None,
        }
    }
}

impl fmt::Display for BundleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A zip asset of the release, already classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveAsset {
    pub url: String,
    pub file_name: String,
    pub digest: Option<String>,
    pub bundle: BundleKey,
}

/// Collects the release's zip assets, deduplicated by URL in order of first appearance.
///
/// # Errors
///
/// [`DownloadError::NoArchiveAssets`] when the release carries no zip asset at all.
pub fn collect_archive_assets(release: &GithubRelease) -> Result<Vec<ArchiveAsset>, DownloadError> {
    let mut seen = HashSet::new();
    let assets: Vec<ArchiveAsset> = release
        .assets
        .iter()
        .filter(|a| {
            a.browser_download_url
                .to_ascii_lowercase()
                .ends_with(ARCHIVE_EXTENSION)
        })
        .filter(|a| seen.insert(a.browser_download_url.clone()))
        .map(|a| {
            ArchiveAsset {
                url: a.browser_download_url.clone(),
                file_name: filename_from_url(&a.browser_download_url)
                    .unwrap_or_else(|| a.name.clone()),
                digest: a.digest.clone(),
                bundle: classify_bundle(&a.browser_download_url),
            }
        })
        .collect();

    if assets.is_empty() {
        return Err(DownloadError::NoArchiveAssets {
            available: release.assets.iter().map(|a| a.name.clone()).collect(),
        });
    }

    Ok(assets)
}

/// Every asset URL must be trusted; the first one that is not aborts resolution.
pub fn validate_asset_urls(assets: &[ArchiveAsset]) -> Result<(), DownloadError> {
    assets.iter().try_for_each(|a| ensure_trusted(&a.url))
}

/// Classifies an archive URL into exactly one bundle.
///
/// Known naming templates win; otherwise the name, stripped of the product prefix and the
/// version suffix, is searched for `nf` / `hs`. Names carrying both or neither are
/// [`BundleKey::Standard`].
pub fn classify_bundle(url: &str) -> BundleKey {
    let file_name = filename_from_url(url)
        .unwrap_or_else(|| url.rsplit('/').next().unwrap_or(url).to_string());

    if let Some(caps) = BUNDLE_TEMPLATE_RE.captures(&file_name) {
        return caps
            .get(1)
            .and_then(|m| BundleKey::from_token(&m.as_str().to_ascii_lowercase()))
            .unwrap_or(BundleKey::Standard);
    }

    let stem = strip_suffix_ignore_case(&file_name, ARCHIVE_EXTENSION);
    let stem = strip_prefix_ignore_case(stem, PRODUCT);
    let stem = VERSION_SUFFIX_RE.replace(stem, "");
    let token = normalize_token(&stem);

    match (token.contains("nf"), token.contains("hs")) {
        (true, false) => BundleKey::Nf,
        (false, true) => BundleKey::Hs,
        _ => BundleKey::Standard,
    }
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> &'a str {
    let cut = s.len().saturating_sub(suffix.len());
    match s.get(cut..) {
        Some(tail) if tail.eq_ignore_ascii_case(suffix) => &s[..cut],
        _ => s,
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> &'a str {
    match s.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => &s[prefix.len()..],
        _ => s,
    }
}

/// The standard bundle if published, else the first archive.
pub fn pick_default(assets: &[ArchiveAsset]) -> Option<&ArchiveAsset> {
    find_bundle(assets, BundleKey::Standard).or_else(|| assets.first())
}

pub fn find_bundle(assets: &[ArchiveAsset], bundle: BundleKey) -> Option<&ArchiveAsset> {
    assets.iter().find(|a| a.bundle == bundle)
}

/// One representative archive per distinct bundle, first-seen order.
pub fn bundle_choices(assets: &[ArchiveAsset]) -> Vec<&ArchiveAsset> {
    let mut seen = HashSet::new();
    assets.iter().filter(|a| seen.insert(a.bundle)).collect()
}
