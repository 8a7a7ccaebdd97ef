use std::process::ExitCode;

use clap::Parser;
use owo_colors::{OwoColorize, Stream};

use crate::{
    cli::{Cli, Command},
    config::{PublicationsConfig, SitemapConfig, ThesesConfig},
    output::WriteOutcome,
};

mod cli;
mod config;
mod error;
mod logging;
mod output;
mod publications;
mod sitemap;
mod theses;

fn main() -> ExitCode {
    let args = Cli::parse();
    logging::init(
        args.verbosity.tracing_level_filter(),
        args.verbosity.is_present(),
    );

    match dispatch(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let prefix = "error:";
            eprintln!(
                "{} {e:#}",
                prefix.if_supports_color(Stream::Stderr, |t| t.red())
            );
            ExitCode::from(error::exit_code(&e))
        }
    }
}

fn dispatch(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Publications(args) => {
            let cfg = PublicationsConfig::from(args);
            match publications::run(&cfg)? {
                WriteOutcome::Written => println!("Wrote {}", cfg.out_path.display()),
                WriteOutcome::Unchanged => println!("No changes in publications."),
            }
        }
        Command::Theses(args) => {
            let cfg = ThesesConfig::try_from(args)?;
            let report = theses::run(&cfg)?;
            match report.outcome {
                WriteOutcome::Written => println!("Wrote {}", cfg.out_path.display()),
                WriteOutcome::Unchanged => println!("No changes in theses."),
            }
            let ok = format!("✓ {}", report.parsed);
            let failed = format!("✗ {}", report.failed);
            eprintln!(
                "{} {}",
                ok.if_supports_color(Stream::Stderr, |t| t.green()),
                failed.if_supports_color(Stream::Stderr, |t| t.red())
            );
        }
        Command::Sitemap(args) => {
            let cfg = SitemapConfig::from(args);
            match sitemap::run(&cfg)? {
                (WriteOutcome::Written, urls) => println!("Wrote sitemap.xml ({urls} urls)"),
                (WriteOutcome::Unchanged, _) => println!("No changes to sitemap."),
            }
        }
    }
    Ok(())
}
