use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use glyphdrop_dl::{archive::MAX_UNCOMPRESSED_BYTES, transport::RetryPolicy};
use glyphdrop_utils::path::{expand_home, home_dir, xdg_cache_home, xdg_config_home};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{ErrorContext, GlyphError},
    GlyphResult,
};

pub const APP_NAME: &str = "glyphdrop";

/// Where the terminal loads its bundled font from.
pub const DEFAULT_TARGET: &str = ".config/glyphterm/fonts/GlyphMono.ttf";

/// Application's configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding downloaded release archives.
    /// Default: $XDG_CACHE_HOME/glyphdrop
    pub cache_dir: Option<String>,

    /// File the selected font is copied to.
    /// Default: $HOME/.config/glyphterm/fonts/GlyphMono.ttf
    pub target_path: Option<String>,

    /// Global HTTP request timeout in seconds.
    /// Default: 300
    pub timeout_secs: Option<u64>,

    /// Number of attempts per network request.
    /// Default: 3
    pub retries: Option<u32>,

    /// Seconds to wait between attempts.
    /// Default: 2
    pub retry_delay_secs: Option<u64>,

    /// Ceiling on the declared uncompressed size of an archive.
    /// Default: 536870912 (512 MiB)
    pub max_uncompressed_bytes: Option<u64>,
}

/// Default location of the configuration file.
pub fn default_config_path() -> GlyphResult<PathBuf> {
    xdg_config_home()
        .map(|dir| dir.join(APP_NAME).join("config.toml"))
        .ok_or(GlyphError::MissingHome)
}

impl Config {
    /// Loads the configuration from `path`, or from the default location.
    ///
    /// A missing file at the default location yields the defaults; an explicitly
    /// requested file must exist.
    pub fn load(path: Option<&Path>) -> GlyphResult<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (default_config_path()?, false),
        };

        if !explicit && !path.exists() {
            debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = Self::from_toml(&content).map_err(|source| {
            GlyphError::Config {
                path: path.clone(),
                source,
            }
        })?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn cache_dir(&self) -> GlyphResult<PathBuf> {
        match &self.cache_dir {
            Some(dir) => resolve(dir),
            None => {
                xdg_cache_home()
                    .map(|dir| dir.join(APP_NAME))
                    .ok_or(GlyphError::MissingHome)
            }
        }
    }

    pub fn target_path(&self) -> GlyphResult<PathBuf> {
        match &self.target_path {
            Some(path) => resolve(path),
            None => {
                home_dir()
                    .map(|home| home.join(DEFAULT_TARGET))
                    .ok_or(GlyphError::MissingHome)
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(300))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let default = RetryPolicy::default();
        RetryPolicy {
            attempts: self.retries.unwrap_or(default.attempts).max(1),
            delay: self
                .retry_delay_secs
                .map(Duration::from_secs)
                .unwrap_or(default.delay),
        }
    }

    pub fn max_uncompressed_bytes(&self) -> u64 {
        self.max_uncompressed_bytes
            .unwrap_or(MAX_UNCOMPRESSED_BYTES)
    }
}

fn resolve(path: &str) -> GlyphResult<PathBuf> {
    if path.starts_with('~') || path.starts_with("$HOME") || path.starts_with("${HOME}") {
        let home = home_dir().ok_or(GlyphError::MissingHome)?;
        return Ok(expand_home(path, &home));
    }
    Ok(PathBuf::from(path))
}
