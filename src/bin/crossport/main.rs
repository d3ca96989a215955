//! Crossport CLI - module resolver and cross-target vcpkg driver

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use crossport::ops::InstallError;
use crossport::resolver::ResolveError;
use crossport::util::context::CatalogLookupError;
use crossport::util::diagnostic::{emit, suggestions, ConfigParseError, Diagnostic};
use crossport::vcpkg::triplet::TripletError;

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    if let Err(e) = run(cli, color) {
        report(&e, color);
        let code = e
            .downcast_ref::<InstallError>()
            .map(InstallError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn run(cli: Cli, color: bool) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("crossport=debug")
    } else {
        EnvFilter::new("crossport=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(color)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Fetch(args) => commands::fetch::execute(args),
        Commands::List(args) => commands::engine::list(args),
        Commands::Tree(args) => commands::engine::tree(args),
        Commands::Manifest(args) => commands::manifest::execute(args),
        Commands::Plan(args) => commands::plan::execute(args),
        Commands::Packages(args) => commands::packages::execute(args),
        Commands::Triplet(args) => commands::triplet::execute(args),
        Commands::CrossFile(args) => commands::cross_file::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Print an error, as a diagnostic when it is one of ours.
fn report(e: &anyhow::Error, color: bool) {
    if let Some(parse) = e.downcast_ref::<ConfigParseError>() {
        let mut out = String::new();
        let handler = if color {
            miette::GraphicalReportHandler::new()
        } else {
            miette::GraphicalReportHandler::new_themed(miette::GraphicalTheme::unicode_nocolor())
        };
        if handler.render_report(&mut out, parse).is_ok() {
            eprint!("{}", out);
            return;
        }
    }

    let diagnostic = if let Some(err) = e.downcast_ref::<ResolveError>() {
        Some(err.to_diagnostic())
    } else if let Some(err) = e.downcast_ref::<TripletError>() {
        Some(err.to_diagnostic())
    } else if let Some(err) = e.downcast_ref::<InstallError>() {
        Some(err.to_diagnostic())
    } else {
        e.downcast_ref::<CatalogLookupError>().map(|err| {
            Diagnostic::error(err.to_string()).with_suggestion(suggestions::NO_CATALOG)
        })
    };

    match diagnostic {
        Some(diagnostic) => {
            // Outer context (if any) still says where it happened.
            let diagnostic = if e.chain().count() > 1 {
                diagnostic.with_context(e.to_string())
            } else {
                diagnostic
            };
            emit(&diagnostic, color);
        }
        None => eprintln!("error: {:#}", e),
    }
}
