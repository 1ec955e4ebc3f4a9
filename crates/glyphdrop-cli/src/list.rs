use glyphdrop_core::font::FontListing;
use nu_ansi_term::Color::{Cyan, Green};
use tabled::{
    builder::Builder,
    settings::{themes::BorderCorrection, Panel, Style},
};
use tracing::info;

use crate::utils::Colored;

/// Rows for the listing table; fonts outside the naming scheme get dashes.
pub fn font_rows(listing: &FontListing) -> Vec<[String; 5]> {
    listing
        .files()
        .iter()
        .map(|file| {
            match listing.record_of(&file.name) {
                Some(record) => {
                    [
                        file.name.clone(),
                        record.base.clone(),
                        record.size.to_string(),
                        record.width.to_string(),
                        record.style.to_string(),
                    ]
                }
                None => {
                    [
                        file.name.clone(),
                        "-".into(),
                        "-".into(),
                        "-".into(),
                        "-".into(),
                    ]
                }
            }
        })
        .collect()
}

pub fn display_fonts(listing: &FontListing) {
    let mut builder = Builder::new();
    builder.push_record(["Font", "Base", "Size", "Width", "Style"]);
    for row in font_rows(listing) {
        builder.push_record(row);
    }

    let table = builder
        .build()
        .with(Panel::header("Fonts in archive"))
        .with(Style::rounded())
        .with(BorderCorrection {})
        .to_string();

    info!("\n{table}");
    info!(
        "{} fonts; install one with {} or {}",
        Colored(Cyan, listing.len()),
        Colored(Green, "--font <NAME>"),
        Colored(Green, "--preset <PRESET>")
    );
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use glyphdrop_core::font::FontFile;

    use super::*;

    #[test]
    fn test_rows_for_parsed_and_unparsed_fonts() {
        let listing = FontListing::new(
            ["GlyphMono35NF-Bold.ttf", "Extra.otf"]
                .iter()
                .map(|name| {
                    FontFile {
                        name: name.to_string(),
                        path: PathBuf::from(name),
                    }
                })
                .collect(),
        );

        let rows = font_rows(&listing);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ["Extra.otf", "-", "-", "-", "-"].map(String::from));
        assert_eq!(
            rows[1],
            ["GlyphMono35NF-Bold.ttf", "nf", "35", "normal", "Bold"].map(String::from)
        );
    }
}
