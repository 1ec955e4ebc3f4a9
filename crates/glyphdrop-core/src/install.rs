use std::path::PathBuf;

use glyphdrop_dl::{
    archive::extract_archive,
    cache::{ArchiveCache, CacheOutcome},
    github::ReleaseSource,
    release::{
        bundle_choices, classify_bundle, collect_archive_assets, find_bundle, pick_default,
        validate_asset_urls, ArchiveAsset,
    },
    transport::Transport,
    trust::VerifyPolicy,
};
use glyphdrop_utils::fs::replace_file;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    error::GlyphError,
    font::FontListing,
    preset::{parse_preset, SelectionCriteria},
    reload::{ReloadStatus, Reloader},
    scratch::ScratchDir,
    select::{choose_option, resolve_font_name, select_font, Prompter},
    GlyphResult,
};

/// Maps the two verification flags onto a policy; setting both is an error.
pub fn verify_policy(no_verify: bool, require_verify: bool) -> GlyphResult<VerifyPolicy> {
    match (no_verify, require_verify) {
        (true, true) => {
            Err(GlyphError::ConfigurationConflict(
                "--no-verify and --require-verify cannot be combined".into(),
            ))
        }
        (true, false) => Ok(VerifyPolicy::Skip),
        (false, true) => Ok(VerifyPolicy::Strict),
        (false, false) => Ok(VerifyPolicy::Default),
    }
}

#[derive(Debug, Clone, Default)]
pub struct InstallRequest {
    /// Explicit font file name; wins over `preset`.
    pub font: Option<String>,
    pub preset: Option<String>,
    pub list_only: bool,
    pub assume_yes: bool,
    pub verify: VerifyPolicy,
}

#[derive(Debug)]
pub enum InstallOutcome {
    Installed {
        font: String,
        target: PathBuf,
        reload: ReloadStatus,
    },
    /// Fonts of the selected archive. Paths point into the removed scratch
    /// directory; only names and records are meaningful.
    Listed(FontListing),
    Cancelled,
}

pub struct Installer<S: ReleaseSource, T: Transport> {
    source: S,
    cache: ArchiveCache<T>,
    target: PathBuf,
    max_uncompressed_bytes: u64,
    reloader: Reloader,
}

impl<S: ReleaseSource, T: Transport> Installer<S, T> {
    pub fn new(config: &Config, source: S, transport: T) -> GlyphResult<Self> {
        Ok(Self {
            source,
            cache: ArchiveCache::new(config.cache_dir()?, transport),
            target: config.target_path()?,
            max_uncompressed_bytes: config.max_uncompressed_bytes(),
            reloader: Reloader::default(),
        })
    }

    pub fn with_reloader(mut self, reloader: Reloader) -> Self {
        self.reloader = reloader;
        self
    }

    pub fn run(
        &self,
        request: &InstallRequest,
        prompter: &mut dyn Prompter,
    ) -> GlyphResult<InstallOutcome> {
        let criteria = match (&request.font, &request.preset) {
            (Some(font), Some(preset)) => {
                warn!("Both --font and --preset given; installing '{font}' and ignoring preset '{preset}'");
                None
            }
            (None, Some(preset)) => Some(parse_preset(preset)?),
            _ => None,
        };

        if !request.list_only && !request.assume_yes && !prompter.is_interactive() {
            return Err(GlyphError::InteractiveUnavailable {
                what: "installation confirmation".into(),
            });
        }

        let release = self.source.latest_release()?;
        info!(
            "Latest release: {}",
            release.name.as_deref().unwrap_or(&release.tag_name)
        );

        let assets = collect_archive_assets(&release)?;
        validate_asset_urls(&assets)?;

        let asset = self.choose_archive(&assets, request, criteria.as_ref(), prompter)?;
        info!("Selected {} bundle: {}", asset.bundle, asset.file_name);

        let expected = request
            .verify
            .expected_digest(&asset.file_name, asset.digest.as_deref())?;

        let scratch = ScratchDir::new()?;
        let archive_path = scratch.path().join(&asset.file_name);
        match self
            .cache
            .fetch(&asset.url, &archive_path, expected.as_deref())?
        {
            CacheOutcome::Hit => debug!("cache hit for {}", asset.file_name),
            CacheOutcome::Downloaded => debug!("downloaded {}", asset.file_name),
        }

        let extract_dir = scratch.path().join("fonts");
        let extracted = extract_archive(&archive_path, &extract_dir, self.max_uncompressed_bytes)?;
        debug!("extracted {} entries", extracted.len());

        let listing = FontListing::discover(&extract_dir)?;
        if request.list_only {
            return Ok(InstallOutcome::Listed(listing));
        }
        if listing.is_empty() {
            return Err(GlyphError::FontNotResolved);
        }

        let font = match &request.font {
            Some(requested) => resolve_font_name(&listing, requested)?,
            None => select_font(&listing, criteria.as_ref(), prompter)?,
        };
        let source_path = listing
            .path_of(&font)
            .ok_or(GlyphError::FontNotResolved)?;

        if !request.assume_yes && !self.confirm(&font, prompter)? {
            info!("Installation cancelled");
            return Ok(InstallOutcome::Cancelled);
        }

        replace_file(source_path, &self.target)?;
        info!("Installed {font} to {}", self.target.display());

        let reload = self.reloader.notify();
        Ok(InstallOutcome::Installed {
            font,
            target: self.target.clone(),
            reload,
        })
    }

    fn choose_archive<'a>(
        &self,
        assets: &'a [ArchiveAsset],
        request: &InstallRequest,
        criteria: Option<&SelectionCriteria>,
        prompter: &mut dyn Prompter,
    ) -> GlyphResult<&'a ArchiveAsset> {
        let fallback = || pick_default(assets).ok_or(GlyphError::FontNotResolved);

        let wanted = match (criteria, &request.font) {
            (Some(criteria), _) => criteria.bundle,
            (None, Some(font)) => Some(classify_bundle(font)),
            (None, None) => None,
        };
        if let Some(bundle) = wanted {
            return match find_bundle(assets, bundle) {
                Some(asset) => Ok(asset),
                None => {
                    warn!("No {bundle} archive in this release; using the default bundle");
                    fallback()
                }
            };
        }

        let choices = bundle_choices(assets);
        if choices.len() > 1 && prompter.is_interactive() {
            let default = fallback()?;
            let default_idx = choices
                .iter()
                .position(|a| a.bundle == default.bundle)
                .unwrap_or(0);
            let labels: Vec<String> = choices
                .iter()
                .map(|a| format!("{} ({})", a.bundle, a.file_name))
                .collect();
            let idx = choose_option("bundle", &labels, default_idx, prompter)?;
            return Ok(choices[idx]);
        }

        fallback()
    }

    fn confirm(&self, font: &str, prompter: &mut dyn Prompter) -> GlyphResult<bool> {
        let answer = prompter.ask(&format!(
            "Install {font} to {}? [y/N]: ",
            self.target.display()
        ))?;
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }
}
