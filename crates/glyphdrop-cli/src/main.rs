use std::{io::IsTerminal, process::ExitCode};

use clap::Parser;
use cli::Args;
use glyphdrop_core::{
    config::Config,
    error::GlyphError,
    install::{verify_policy, InstallOutcome, InstallRequest, Installer},
    scratch::cleanup_scratch_dirs,
    GlyphResult,
};
use glyphdrop_dl::{
    github::Github, http_client::configure_http_client, release::PRODUCT,
    transport::HttpTransport,
};
use glyphdrop_utils::fs::cleanup_staging_files;
use list::display_fonts;
use logging::setup_logging;
use nu_ansi_term::Color::{Blue, Green};
use progress::download_reporter;
use tracing::{debug, info};
use ureq::Proxy;
use utils::{Colored, TerminalPrompter, COLOR, PROGRESS};

mod cli;
mod list;
mod logging;
mod progress;
mod utils;

/// Exit status used when the run is interrupted.
const INTERRUPTED: i32 = 130;

fn install_interrupt_handler() -> GlyphResult<()> {
    ctrlc::set_handler(|| {
        progress::stop();
        cleanup_scratch_dirs();
        cleanup_staging_files();
        eprintln!("Interrupted");
        std::process::exit(INTERRUPTED);
    })
    .map_err(|err| GlyphError::Custom(format!("Failed to install interrupt handler: {err}")))
}

fn handle_cli() -> GlyphResult<()> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        let mut color = COLOR.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        *color = false;
    }

    if args.quiet || args.json || !std::io::stderr().is_terminal() {
        let mut progress = PROGRESS.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        *progress = false;
    }

    let verify = verify_policy(args.no_verify, args.require_verify)?;
    let config = Config::load(args.config.as_deref())?;
    debug!("{config:?}");

    let proxy = args
        .proxy
        .as_deref()
        .map(|proxy| {
            Proxy::new(proxy)
                .map_err(|err| GlyphError::Custom(format!("Invalid proxy '{proxy}': {err}")))
        })
        .transpose()?;
    let user_agent = args.user_agent.clone();
    let timeout = config.timeout();

    configure_http_client(|client| {
        client.timeout = Some(timeout);
        if proxy.is_some() {
            client.proxy = proxy;
        }
        if let Some(user_agent) = user_agent {
            client.user_agent = Some(user_agent);
        }
    });

    install_interrupt_handler()?;

    let retry = config.retry_policy();
    let transport = HttpTransport::new(retry).progress(download_reporter(PRODUCT));
    let installer = Installer::new(&config, Github::new(retry), transport)?;

    let request = InstallRequest {
        font: args.font,
        preset: args.preset,
        list_only: args.list,
        assume_yes: args.yes,
        verify,
    };
    let mut prompter = TerminalPrompter::detect();

    match installer.run(&request, &mut prompter)? {
        InstallOutcome::Installed { font, target, .. } => {
            info!(
                "{} {} is now installed at {}",
                Colored(Green, "✓"),
                Colored(Blue, &font),
                target.display()
            );
        }
        InstallOutcome::Listed(listing) => display_fonts(&listing),
        InstallOutcome::Cancelled => {}
    }

    Ok(())
}

fn main() -> ExitCode {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    match handle_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            progress::stop();
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::FAILURE
        }
    }
}
