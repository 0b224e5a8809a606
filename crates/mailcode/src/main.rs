//! `mailcode` - find the verification code in your latest email.
//!
//! Reads raw messages or JSON records, evaluates them newest first and prints
//! the first one-time code the extractor is confident about.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;
mod input;
mod report;

use std::cmp::Reverse;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mailcode_core::{Extractor, PatternTables, scan};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use report::{Explained, Found};

const DEFAULT_FILTER: &str = "mailcode=info,mailcode_core=info";
const VERBOSE_FILTER: &str = "mailcode=debug,mailcode_core=debug,mailcode_mime=debug";

#[derive(Parser)]
#[command(
    name = "mailcode",
    version,
    about = "Find the verification code in your latest email"
)]
struct Cli {
    /// Pattern tables JSON file (default: <config dir>/mailcode/patterns.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of plain text.
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the code from the newest message that carries one.
    ///
    /// Exits with status 1 when no message yields a code.
    Scan {
        /// `.eml` files, directories of them, or `.json` message records.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Show how every message was ranked, newest first.
    Explain {
        /// `.eml` files, directories of them, or `.json` message records.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Print the effective pattern tables.
    Patterns,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let tables = config::load_tables(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan { paths } => run_scan(&tables, &paths, cli.json),
        Commands::Explain { paths } => run_explain(&tables, &paths, cli.json),
        Commands::Patterns => {
            // Compile first so a broken config file is reported here too.
            Extractor::new(&tables)?;
            println!("{}", tables.to_json()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_scan(tables: &PatternTables, paths: &[PathBuf], json: bool) -> Result<ExitCode> {
    let extractor = Extractor::new(tables)?;
    let messages = input::load_messages(paths)?;

    let Some((message, found)) = scan::first_code(&extractor, &messages) else {
        info!(messages = messages.len(), "no verification code found");
        if json {
            println!("null");
        }
        return Ok(ExitCode::FAILURE);
    };

    if json {
        println!("{}", serde_json::to_string(&Found::new(message, &found))?);
    } else {
        println!("{}", found.code);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_explain(tables: &PatternTables, paths: &[PathBuf], json: bool) -> Result<ExitCode> {
    let extractor = Extractor::new(tables)?;
    let mut messages = input::load_messages(paths)?;
    messages.sort_by_key(|m| Reverse(m.timestamp));

    let rankings: Vec<_> = messages.iter().map(|m| extractor.rank(m)).collect();

    if json {
        let explained: Vec<Explained<'_>> = messages
            .iter()
            .zip(&rankings)
            .map(|(message, ranking)| Explained {
                id: &message.id,
                subject: &message.subject,
                ranking,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&explained)?);
    } else {
        for (message, ranking) in messages.iter().zip(&rankings) {
            print!("{}", report::explain_text(message, ranking));
        }
    }
    Ok(ExitCode::SUCCESS)
}
