use glyphdrop_dl::release::BundleKey;
use glyphdrop_utils::string::normalize_token;

use crate::{
    error::GlyphError,
    font::{FontRecord, FontSize, FontStyle, FontWidth},
    GlyphResult,
};

/// Constraints on the four variant axes; `None` matches anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionCriteria {
    pub bundle: Option<BundleKey>,
    pub size: Option<FontSize>,
    pub width: Option<FontWidth>,
    pub style: Option<FontStyle>,
}

impl SelectionCriteria {
    pub fn matches(&self, record: &FontRecord) -> bool {
        self.bundle.is_none_or(|b| b.as_str() == record.base)
            && self.size.is_none_or(|s| s == record.size)
            && self.width.is_none_or(|w| w == record.width)
            && self.style.is_none_or(|s| s == record.style)
    }
}

/// Parses a compact preset such as `nf`, `35nflg-bold` or `hs_bold_italic`.
///
/// Tokens are detected on the normalized string, so their order and any
/// separators are irrelevant. Every axis of the result is set.
pub fn parse_preset(preset: &str) -> GlyphResult<SelectionCriteria> {
    let token = normalize_token(preset);

    let has_nf = token.contains("nf");
    let has_hs = token.contains("hs");
    let bundle = match (has_nf, has_hs) {
        (true, true) => {
            return Err(GlyphError::ConflictingBundles {
                preset: preset.to_string(),
            })
        }
        (true, false) => BundleKey::Nf,
        (false, true) => BundleKey::Hs,
        (false, false) => BundleKey::Standard,
    };

    let size = if token.contains("35") {
        FontSize::Compact35
    } else {
        FontSize::Normal
    };

    let width = if token.contains("lg") {
        FontWidth::Lg
    } else {
        FontWidth::Normal
    };

    let bold = token.contains("bold");
    let italic = token.contains("italic");
    let style = match (bold, italic) {
        (true, true) => FontStyle::BoldItalic,
        (true, false) => FontStyle::Bold,
        (false, true) => FontStyle::Italic,
        (false, false) => FontStyle::Regular,
    };

    Ok(SelectionCriteria {
        bundle: Some(bundle),
        size: Some(size),
        width: Some(width),
        style: Some(style),
    })
}
