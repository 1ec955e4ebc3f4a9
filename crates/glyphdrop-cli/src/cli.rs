use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueHint};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}"
)]
pub struct Args {
    /// Install this font file (exact name or a unique part of it)
    #[arg(short, long)]
    pub font: Option<String>,

    /// Compact variant selection, e.g. `nf`, `hs-bold`, `35nflg-bolditalic`
    #[arg(short, long)]
    pub preset: Option<String>,

    /// List the fonts in the selected archive and exit
    #[arg(short, long)]
    pub list: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Skip checksum verification
    #[arg(long)]
    pub no_verify: bool,

    /// Fail when the release publishes no checksum
    #[arg(long)]
    pub require_verify: bool,

    /// Provide custom config file
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long)]
    pub quiet: bool,

    /// Output logs as json
    #[arg(short, long)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long)]
    pub no_color: bool,

    /// Set proxy
    #[arg(required = false, long, short = 'P')]
    pub proxy: Option<String>,

    /// Set user agent
    #[arg(required = false, long, short = 'A')]
    pub user_agent: Option<String>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_selection_flags() {
        let args = Args::parse_from([
            "glyphdrop",
            "-p",
            "35nflg-bold",
            "-y",
            "--require-verify",
            "-vv",
        ]);
        assert_eq!(args.preset.as_deref(), Some("35nflg-bold"));
        assert!(args.yes);
        assert!(args.require_verify);
        assert!(!args.no_verify);
        assert_eq!(args.verbose, 2);
        assert!(args.font.is_none());
    }

    #[test]
    fn test_parse_without_arguments() {
        let args = Args::parse_from(["glyphdrop"]);
        assert!(!args.list);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_both_verify_flags_parse() {
        // rejected later with a diagnostic, not by clap
        let args = Args::parse_from(["glyphdrop", "--no-verify", "--require-verify"]);
        assert!(args.no_verify && args.require_verify);
    }
}
