//! Error types for glyphdrop-core.

use std::path::PathBuf;

use glyphdrop_dl::error::DownloadError;
use glyphdrop_utils::error::{FileSystemError, HashError};
use miette::Diagnostic;
use thiserror::Error;

/// Core error type for glyphdrop operations.
#[derive(Error, Diagnostic, Debug)]
pub enum GlyphError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    DownloadError(#[from] DownloadError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    FileSystemError(#[from] FileSystemError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    HashError(#[from] HashError),

    #[error("Error while {action}")]
    #[diagnostic(code(glyphdrop::io), help("Check file permissions and disk space"))]
    IoError {
        action: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration file `{}`", path.display())]
    #[diagnostic(code(glyphdrop::config), help("Check your configuration syntax"))]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("HOME is not set")]
    #[diagnostic(
        code(glyphdrop::env),
        help("glyphdrop keeps its cache and installs fonts under your home directory")
    )]
    MissingHome,

    #[error("Conflicting options: {0}")]
    #[diagnostic(code(glyphdrop::configuration_conflict))]
    ConfigurationConflict(String),

    #[error("Interactive input is required to choose the {what}, but no terminal is attached")]
    #[diagnostic(
        code(glyphdrop::interactive_unavailable),
        help("Re-run non-interactively with an explicit selection: --font <NAME> or --preset <PRESET>, plus --yes")
    )]
    InteractiveUnavailable { what: String },

    #[error("Preset '{preset}' asks for both the NF and HS bundles")]
    #[diagnostic(
        code(glyphdrop::conflicting_bundles),
        help("'nf' and 'hs' are mutually exclusive; keep one of them")
    )]
    ConflictingBundles { preset: String },

    #[error("Font name '{requested}' matches {} fonts", .candidates.len())]
    #[diagnostic(
        code(glyphdrop::ambiguous_selection),
        help("Candidates:\n{}", .candidates.join("\n"))
    )]
    AmbiguousSelection {
        requested: String,
        candidates: Vec<String>,
    },

    #[error("Could not resolve a font file from the archive")]
    #[diagnostic(
        code(glyphdrop::font_not_resolved),
        help("Run with --list to see the fonts this release ships")
    )]
    FontNotResolved,

    #[error("{0}")]
    #[diagnostic(code(glyphdrop::error))]
    Custom(String),
}

/// Trait for adding context to IO errors.
pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, GlyphError>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, GlyphError>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            GlyphError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}
