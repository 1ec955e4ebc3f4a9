use std::fmt::Display;

use glyphdrop_dl::release::BundleKey;
use tracing::{debug, info, warn};

use crate::{
    error::GlyphError,
    font::{FontListing, FontRecord, FontSize, FontStyle, FontWidth},
    preset::SelectionCriteria,
    GlyphResult,
};

/// Font installed when no variant can be resolved from the records.
pub const PLATFORM_DEFAULT_FONT: &str = "GlyphMono-Regular.ttf";

/// Source of answers for interactive questions.
pub trait Prompter {
    /// Whether a human can answer right now.
    fn is_interactive(&self) -> bool;

    /// Shows `question` and returns one line of input. End of input is an
    /// empty answer.
    fn ask(&mut self, question: &str) -> GlyphResult<String>;
}

/// Prompter for runs without a terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractive;

impl Prompter for NonInteractive {
    fn is_interactive(&self) -> bool {
        false
    }

    fn ask(&mut self, _question: &str) -> GlyphResult<String> {
        Err(GlyphError::InteractiveUnavailable {
            what: "answer".into(),
        })
    }
}

/// Presents `options` as a 1-based menu and returns the chosen index.
///
/// An empty answer picks `default`; anything that is not a listed number
/// is rejected and asked again.
pub fn choose_option<T: Display>(
    label: &str,
    options: &[T],
    default: usize,
    prompter: &mut dyn Prompter,
) -> GlyphResult<usize> {
    if !prompter.is_interactive() {
        return Err(GlyphError::InteractiveUnavailable {
            what: label.to_string(),
        });
    }
    if options.is_empty() {
        return Err(GlyphError::Custom(format!("No {label} options to choose from")));
    }
    let default = default.min(options.len() - 1);

    info!("Available {label} options:");
    for (idx, option) in options.iter().enumerate() {
        let marker = if idx == default { " (default)" } else { "" };
        info!("[{}] {option}{marker}", idx + 1);
    }

    loop {
        let answer = prompter.ask(&format!("Select {label} [{}]: ", default + 1))?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Ok(default);
        }

        match answer.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
            _ => {
                warn!(
                    "Invalid selection '{answer}', enter a number between 1 and {}",
                    options.len()
                )
            }
        }
    }
}

/// Resolves an explicitly requested font file name against the listing.
///
/// An exact case-insensitive match wins; otherwise the request must be a
/// substring of exactly one file name.
pub fn resolve_font_name(listing: &FontListing, requested: &str) -> GlyphResult<String> {
    let names = listing.names();

    if let Some(exact) = names.iter().find(|n| n.eq_ignore_ascii_case(requested)) {
        return Ok(exact.to_string());
    }

    let needle = requested.to_lowercase();
    let matches: Vec<&str> = names
        .iter()
        .copied()
        .filter(|n| n.to_lowercase().contains(&needle))
        .collect();

    match matches.as_slice() {
        [only] => Ok(only.to_string()),
        [] => {
            Err(GlyphError::AmbiguousSelection {
                requested: requested.to_string(),
                candidates: names.iter().map(|n| n.to_string()).collect(),
            })
        }
        _ => {
            Err(GlyphError::AmbiguousSelection {
                requested: requested.to_string(),
                candidates: matches.iter().map(|n| n.to_string()).collect(),
            })
        }
    }
}

/// Concrete value on each axis; `None` only when there was nothing to pick from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Choice {
    base: Option<String>,
    size: Option<FontSize>,
    width: Option<FontWidth>,
    style: Option<FontStyle>,
}

impl Choice {
    fn from_criteria(criteria: &SelectionCriteria) -> Self {
        Self {
            base: criteria.bundle.map(|b| b.as_str().to_string()),
            size: criteria.size,
            width: criteria.width,
            style: criteria.style,
        }
    }

    fn matches(&self, record: &FontRecord) -> bool {
        self.base.as_ref().is_none_or(|b| *b == record.base)
            && self.size.is_none_or(|s| s == record.size)
            && self.width.is_none_or(|w| w == record.width)
            && self.style.is_none_or(|s| s == record.style)
    }

    /// The fully constrained choice, then the two relaxations.
    fn relaxations(&self) -> [Choice; 3] {
        let regular = Choice {
            style: Some(FontStyle::Regular),
            ..self.clone()
        };
        let plain = Choice {
            base: self.base.clone(),
            size: Some(FontSize::Normal),
            width: Some(FontWidth::Normal),
            style: Some(FontStyle::Regular),
        };
        [self.clone(), regular, plain]
    }
}

/// Prefers `.ttf` over `.otf`, then name order.
fn pick_best<'a>(records: impl IntoIterator<Item = &'a FontRecord>) -> Option<&'a FontRecord> {
    let mut candidates: Vec<&FontRecord> = records.into_iter().collect();
    candidates.sort_by(|a, b| {
        b.is_ttf()
            .cmp(&a.is_ttf())
            .then_with(|| a.file_name.cmp(&b.file_name))
    });
    candidates.into_iter().next()
}

fn resolve_choice(records: &[&FontRecord], choice: &Choice) -> Option<String> {
    if choice.base.is_none() {
        return None;
    }
    for (step, candidate) in choice.relaxations().iter().enumerate() {
        if let Some(record) = pick_best(records.iter().copied().filter(|r| candidate.matches(r))) {
            if step > 0 {
                debug!("relaxed selection to {candidate:?}");
            }
            return Some(record.file_name.clone());
        }
    }
    None
}

fn asking(interactive: bool, prompter: &mut dyn Prompter) -> Option<&mut dyn Prompter> {
    if interactive {
        Some(prompter)
    } else {
        None
    }
}

/// Narrows `records` on one axis and returns the chosen value.
fn narrow_axis<V, F>(
    label: &str,
    records: &mut Vec<&FontRecord>,
    value_of: F,
    preferred: Option<V>,
    preference: &[V],
    prompter: Option<&mut dyn Prompter>,
) -> GlyphResult<Option<V>>
where
    V: Clone + PartialEq + Display,
    F: Fn(&FontRecord) -> V,
{
    let mut options: Vec<V> = Vec::new();
    for record in records.iter() {
        let value = value_of(record);
        if !options.contains(&value) {
            options.push(value);
        }
    }
    if options.is_empty() {
        return Ok(None);
    }
    options.sort_by_key(|v| {
        preference
            .iter()
            .position(|p| p == v)
            .unwrap_or(preference.len())
    });

    let default = preferred
        .and_then(|p| options.iter().position(|o| *o == p))
        .unwrap_or(0);

    let chosen = match prompter {
        Some(prompter) if options.len() > 1 => {
            let idx = choose_option(label, &options, default, prompter)?;
            options[idx].clone()
        }
        _ => options[default].clone(),
    };

    records.retain(|r| value_of(r) == chosen);
    Ok(Some(chosen))
}

/// Picks one font file out of `listing`.
///
/// A fully specified preset that names an existing record (directly or via
/// relaxation) is used as is. Otherwise the records are narrowed axis by axis
/// in the order base, size, width, style; the prompter is consulted only when
/// it is interactive and no preset was given.
pub fn select_font(
    listing: &FontListing,
    criteria: Option<&SelectionCriteria>,
    prompter: &mut dyn Prompter,
) -> GlyphResult<String> {
    let records: Vec<&FontRecord> = listing.records().iter().collect();

    if let Some(criteria) = criteria {
        if let Some(name) = resolve_choice(&records, &Choice::from_criteria(criteria)) {
            debug!("preset resolved to {name}");
            return Ok(name);
        }
    }

    let interactive = criteria.is_none() && prompter.is_interactive();
    let preset = criteria.copied().unwrap_or_default();
    let mut remaining = records.clone();

    let base_preference: Vec<String> = BundleKey::PREFERENCE
        .iter()
        .map(|b| b.as_str().to_string())
        .collect();
    let base = narrow_axis(
        "base",
        &mut remaining,
        |r| r.base.clone(),
        preset.bundle.map(|b| b.as_str().to_string()),
        &base_preference,
        asking(interactive, prompter),
    )?;
    let size = narrow_axis(
        "size",
        &mut remaining,
        |r| r.size,
        preset.size,
        &FontSize::PREFERENCE,
        asking(interactive, prompter),
    )?;
    let width = narrow_axis(
        "width",
        &mut remaining,
        |r| r.width,
        preset.width,
        &FontWidth::PREFERENCE,
        asking(interactive, prompter),
    )?;
    let style = narrow_axis(
        "style",
        &mut remaining,
        |r| r.style,
        preset.style,
        &FontStyle::PREFERENCE,
        asking(interactive, prompter),
    )?;

    let choice = Choice {
        base,
        size,
        width,
        style,
    };
    if let Some(name) = resolve_choice(&records, &choice) {
        return Ok(name);
    }

    if listing.contains(PLATFORM_DEFAULT_FONT) {
        warn!("No variant matched, falling back to {PLATFORM_DEFAULT_FONT}");
        return Ok(PLATFORM_DEFAULT_FONT.to_string());
    }

    Err(GlyphError::FontNotResolved)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::{font::tests::listing, preset::parse_preset};

    /// Replays canned answers and records every question asked.
    pub(crate) struct ScriptedPrompter {
        pub answers: VecDeque<String>,
        pub questions: Vec<String>,
        pub interactive: bool,
    }

    impl ScriptedPrompter {
        pub(crate) fn new(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().map(|a| a.to_string()).collect(),
                questions: Vec::new(),
                interactive: true,
            }
        }

        pub(crate) fn silent() -> Self {
            Self {
                interactive: false,
                ..Self::new(&[])
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn is_interactive(&self) -> bool {
            self.interactive
        }

        fn ask(&mut self, question: &str) -> GlyphResult<String> {
            self.questions.push(question.to_string());
            Ok(self.answers.pop_front().unwrap_or_default())
        }
    }

    #[test]
    fn test_choose_option_default_on_empty_answer() {
        let mut prompter = ScriptedPrompter::new(&[""]);
        let idx = choose_option("size", &["normal", "35"], 1, &mut prompter).unwrap();
        assert_eq!(idx, 1);
    }

    #[test]
    fn test_choose_option_reprompts_on_invalid_input() {
        let mut prompter = ScriptedPrompter::new(&["0", "abc", "9", " 2 "]);
        let idx = choose_option("style", &["Regular", "Bold"], 0, &mut prompter).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(prompter.questions.len(), 4);
    }

    #[test]
    fn test_choose_option_requires_terminal() {
        let mut prompter = ScriptedPrompter::silent();
        let err = choose_option("base", &["standard"], 0, &mut prompter).unwrap_err();
        assert!(matches!(err, GlyphError::InteractiveUnavailable { .. }));
    }

    #[test]
    fn test_resolve_exact_name_case_insensitive() {
        let fonts = listing(&["GlyphMono-Regular.ttf", "GlyphMonoNF-Regular.ttf"]);
        assert_eq!(
            resolve_font_name(&fonts, "glyphmono-regular.TTF").unwrap(),
            "GlyphMono-Regular.ttf"
        );
    }

    #[test]
    fn test_resolve_unique_substring() {
        let fonts = listing(&["GlyphMono-Regular.ttf", "GlyphMonoNF-Bold.ttf"]);
        assert_eq!(
            resolve_font_name(&fonts, "nf-bold").unwrap(),
            "GlyphMonoNF-Bold.ttf"
        );
    }

    #[test]
    fn test_resolve_ambiguous_lists_matches() {
        let fonts = listing(&[
            "GlyphMono-Regular.ttf",
            "GlyphMonoNF-Regular.ttf",
            "GlyphMonoHS-Regular.ttf",
            "GlyphMono-Bold.ttf",
        ]);
        match resolve_font_name(&fonts, "Regular.ttf").unwrap_err() {
            GlyphError::AmbiguousSelection {
                requested,
                candidates,
            } => {
                assert_eq!(requested, "Regular.ttf");
                assert_eq!(candidates.len(), 3);
                assert!(!candidates.contains(&"GlyphMono-Bold.ttf".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_no_match_lists_everything() {
        let fonts = listing(&["GlyphMono-Regular.ttf", "GlyphMono-Bold.ttf"]);
        match resolve_font_name(&fonts, "Light").unwrap_err() {
            GlyphError::AmbiguousSelection { candidates, .. } => assert_eq!(candidates.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_nf_preset_picks_regular() {
        let fonts = listing(&["GlyphMonoNF-Bold.ttf", "GlyphMonoNF-Regular.ttf"]);
        let criteria = parse_preset("nf").unwrap();
        let mut prompter = ScriptedPrompter::new(&[]);

        let name = select_font(&fonts, Some(&criteria), &mut prompter).unwrap();
        assert_eq!(name, "GlyphMonoNF-Regular.ttf");
        assert!(prompter.questions.is_empty());
    }

    #[test]
    fn test_full_preset_exact_match() {
        let fonts = listing(&[
            "GlyphMono35NFLG-Bold.ttf",
            "GlyphMono35NFLG-Regular.ttf",
            "GlyphMonoNF-Bold.ttf",
            "GlyphMonoNF-Regular.ttf",
        ]);
        let criteria = parse_preset("35nflg-bold").unwrap();
        let name = select_font(&fonts, Some(&criteria), &mut ScriptedPrompter::silent()).unwrap();
        assert_eq!(name, "GlyphMono35NFLG-Bold.ttf");
    }

    #[test]
    fn test_full_preset_relaxes_style_first() {
        let fonts = listing(&[
            "GlyphMono35NFLG-Regular.ttf",
            "GlyphMonoNF-Bold.ttf",
            "GlyphMonoNF-Regular.ttf",
        ]);
        let criteria = parse_preset("35nflg-bold").unwrap();
        let name = select_font(&fonts, Some(&criteria), &mut ScriptedPrompter::silent()).unwrap();
        assert_eq!(name, "GlyphMono35NFLG-Regular.ttf");
    }

    #[test]
    fn test_full_preset_relaxes_to_plain_regular() {
        let fonts = listing(&["GlyphMonoNF-Bold.ttf", "GlyphMonoNF-Regular.ttf"]);
        let criteria = parse_preset("35nflg-bold").unwrap();
        let name = select_font(&fonts, Some(&criteria), &mut ScriptedPrompter::silent()).unwrap();
        assert_eq!(name, "GlyphMonoNF-Regular.ttf");
    }

    #[test]
    fn test_preset_for_missing_bundle_uses_defaults() {
        let fonts = listing(&["GlyphMono-Bold.ttf", "GlyphMono-Regular.ttf"]);
        let criteria = parse_preset("hs-bold").unwrap();
        let mut prompter = ScriptedPrompter::new(&["2"]);

        let name = select_font(&fonts, Some(&criteria), &mut prompter).unwrap();
        assert_eq!(name, "GlyphMono-Bold.ttf");
        assert!(prompter.questions.is_empty());
    }

    #[test]
    fn test_non_interactive_uses_preferences() {
        let fonts = listing(&[
            "GlyphMono35-Regular.ttf",
            "GlyphMonoHS-Regular.ttf",
            "GlyphMono-Italic.ttf",
            "GlyphMono-Regular.ttf",
        ]);
        let name = select_font(&fonts, None, &mut ScriptedPrompter::silent()).unwrap();
        assert_eq!(name, "GlyphMono-Regular.ttf");
    }

    #[test]
    fn test_interactive_narrowing_asks_only_when_needed() {
        let fonts = listing(&[
            "GlyphMonoNF-Bold.ttf",
            "GlyphMonoNF-Regular.ttf",
            "GlyphMono-Regular.ttf",
        ]);
        // base: [standard, nf] -> 2; style within nf: [Regular, Bold] -> 2
        let mut prompter = ScriptedPrompter::new(&["2", "2"]);

        let name = select_font(&fonts, None, &mut prompter).unwrap();
        assert_eq!(name, "GlyphMonoNF-Bold.ttf");
        assert_eq!(prompter.questions.len(), 2);
        assert!(prompter.questions[0].starts_with("Select base"));
        assert!(prompter.questions[1].starts_with("Select style"));
    }

    #[test]
    fn test_ttf_preferred_over_otf() {
        let fonts = listing(&["GlyphMono-Regular.otf", "GlyphMono-Regular.ttf"]);
        let name = select_font(&fonts, None, &mut ScriptedPrompter::silent()).unwrap();
        assert_eq!(name, "GlyphMono-Regular.ttf");
    }

    #[test]
    fn test_unparseable_listing() {
        let fonts = listing(&["Other-Regular.ttf"]);
        let err = select_font(&fonts, None, &mut ScriptedPrompter::silent()).unwrap_err();
        assert!(matches!(err, GlyphError::FontNotResolved));
    }
}
