use std::{
    fmt,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use glyphdrop_dl::release::PRODUCT;
use glyphdrop_utils::string::normalize_token;
use regex::Regex;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::{error::GlyphError, GlyphResult};

pub const FONT_EXTENSIONS: [&str; 2] = ["ttf", "otf"];

/// Base name used when a file carries no family token.
pub const STANDARD_BASE: &str = "standard";

static FONT_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^{PRODUCT}(35)?([A-Za-z]*?)(LG)?[-_](Regular|Bold|Italic|BoldItalic)\.(?i:ttf|otf)$"
    ))
    .expect("unable to compile font name regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontSize {
    Normal,
    Compact35,
}

impl FontSize {
    pub const PREFERENCE: [FontSize; 2] = [FontSize::Normal, FontSize::Compact35];

    pub fn as_str(&self) -> &'static str {
        match self {
            FontSize::Normal => "normal",
            FontSize::Compact35 => "35",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontWidth {
    Normal,
    Lg,
}

impl FontWidth {
    pub const PREFERENCE: [FontWidth; 2] = [FontWidth::Normal, FontWidth::Lg];

    pub fn as_str(&self) -> &'static str {
        match self {
            FontWidth::Normal => "normal",
            FontWidth::Lg => "lg",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    pub const PREFERENCE: [FontStyle; 4] = [
        FontStyle::Regular,
        FontStyle::Bold,
        FontStyle::Italic,
        FontStyle::BoldItalic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FontStyle::Regular => "Regular",
            FontStyle::Bold => "Bold",
            FontStyle::Italic => "Italic",
            FontStyle::BoldItalic => "BoldItalic",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::PREFERENCE.into_iter().find(|s| s.as_str() == name)
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(FontSize, FontWidth, FontStyle);

/// A font file name decoded into its variant axes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontRecord {
    pub file_name: String,
    pub base: String,
    pub size: FontSize,
    pub width: FontWidth,
    pub style: FontStyle,
}

impl FontRecord {
    /// Parses `GlyphMono[35]<family>[LG][-_]<Style>.(ttf|otf)`.
    ///
    /// Returns `None` for names outside the grammar; those fonts stay
    /// installable by explicit name but take no part in variant selection.
    pub fn parse(file_name: &str) -> Option<Self> {
        let caps = FONT_NAME_RE.captures(file_name)?;

        let family = normalize_token(caps.get(2).map_or("", |m| m.as_str()));
        let base = if family.is_empty() {
            STANDARD_BASE.to_string()
        } else {
            family
        };

        Some(Self {
            file_name: file_name.to_string(),
            base,
            size: if caps.get(1).is_some() {
                FontSize::Compact35
            } else {
                FontSize::Normal
            },
            width: if caps.get(3).is_some() {
                FontWidth::Lg
            } else {
                FontWidth::Normal
            },
            style: FontStyle::from_name(&caps[4])?,
        })
    }

    pub fn is_ttf(&self) -> bool {
        self.file_name.to_ascii_lowercase().ends_with(".ttf")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFile {
    pub name: String,
    pub path: PathBuf,
}

/// Font files found in an extracted archive, sorted by name.
#[derive(Debug, Clone, Default)]
pub struct FontListing {
    files: Vec<FontFile>,
    records: Vec<FontRecord>,
}

impl FontListing {
    pub fn new(mut files: Vec<FontFile>) -> Self {
        files.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
        files.dedup_by(|later, first| {
            let dup = later.name == first.name;
            if dup {
                debug!(
                    "Ignoring duplicate font {} (keeping {})",
                    later.path.display(),
                    first.path.display()
                );
            }
            dup
        });

        let records = files
            .iter()
            .filter_map(|file| {
                let record = FontRecord::parse(&file.name);
                if record.is_none() {
                    trace!("{} does not follow the variant naming scheme", file.name);
                }
                record
            })
            .collect();

        Self { files, records }
    }

    /// Walks `dir` for `.ttf` and `.otf` files.
    pub fn discover<P: AsRef<Path>>(dir: P) -> GlyphResult<Self> {
        let dir = dir.as_ref();
        let mut files = Vec::new();

        for entry in WalkDir::new(dir).follow_links(false) {
            let entry = entry.map_err(|err| {
                GlyphError::Custom(format!("Failed to walk {}: {err}", dir.display()))
            })?;
            if !entry.file_type().is_file() || !is_font_file(entry.path()) {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                debug!("Skipping font with a non UTF-8 name: {}", entry.path().display());
                continue;
            };
            files.push(FontFile {
                name: name.to_string(),
                path: entry.path().to_path_buf(),
            });
        }

        debug!("found {} font files under {}", files.len(), dir.display());
        Ok(Self::new(files))
    }

    pub fn files(&self) -> &[FontFile] {
        &self.files
    }

    pub fn records(&self) -> &[FontRecord] {
        &self.records
    }

    pub fn names(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.iter().any(|f| f.name == name)
    }

    pub fn path_of(&self, name: &str) -> Option<&Path> {
        self.files
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.path.as_path())
    }

    pub fn record_of(&self, name: &str) -> Option<&FontRecord> {
        self.records.iter().find(|r| r.file_name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            FONT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
