// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Command-line interface for chatgpt2md.
//!
//! This binary provides the `chatgpt2md` command for converting ChatGPT
//! conversation exports from JSON to dated Markdown files.

use chatgpt2md::convert::{self, Outcome};
use lexopt::prelude::*;
use snafu::prelude::*;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

struct Cli {
    options: convert::Options,
    quiet: bool,
    verbose: u8,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("{source}"))]
    Convert { source: convert::Error },
}

fn print_help() {
    println!(
        "\
{name} {version}
Convert ChatGPT conversation exports to Markdown

Usage: {name} [OPTIONS] [INPUT]...

Arguments:
  [INPUT]...  Export JSON files or directories to search (default: .)

Options:
  -o, --output <DIR>  Output directory (default: {output})
  -n, --dry-run       Show what would be written without writing
  -q, --quiet         Suppress progress messages and the summary
  -v, --verbose       Show diagnostics (repeat for more detail)
  -h, --help          Print help
  -V, --version       Print version

Files named {account} are never converted.",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        output = convert::DEFAULT_OUTPUT_DIR,
        account = convert::ACCOUNT_FILE_NAME,
    );
}

fn parse_args() -> Result<Cli, lexopt::Error> {
    let mut options = convert::Options::default();
    let mut inputs = Vec::new();
    let mut quiet = false;
    let mut verbose: u8 = 0;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('o') | Long("output") => options.output_dir = parser.value()?.parse()?,
            Short('n') | Long("dry-run") => options.dry_run = true,
            Short('q') | Long("quiet") => quiet = true,
            Short('v') | Long("verbose") => verbose = verbose.saturating_add(1),
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            Value(val) => inputs.push(val.parse::<PathBuf>()?),
            _ => return Err(arg.unexpected()),
        }
    }

    if !inputs.is_empty() {
        options.inputs = inputs;
    }

    Ok(Cli {
        options,
        quiet,
        verbose,
    })
}

/// Installs the log subscriber; `RUST_LOG` overrides the flag-derived level.
fn setup_logging(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false).without_time())
        .with(filter)
        .init();
}

fn main() -> Result<(), Error> {
    let cli = parse_args().context(ParseArgsSnafu)?;
    setup_logging(cli.quiet, cli.verbose);

    let quiet = cli.quiet;
    let summary = convert::run(&cli.options, |outcome| {
        if quiet {
            return;
        }
        match outcome {
            Outcome::Written(path) => eprintln!("Wrote {}", path.display()),
            Outcome::WouldWrite(path) => eprintln!("Would write {}", path.display()),
            Outcome::Empty => {}
        }
    })
    .context(ConvertSnafu)?;

    if !quiet {
        println!("{summary}");
    }
    Ok(())
}
