mod cli;
mod client;
mod commands;
mod progress;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;

/// How much the commands print, derived from the global flags.
pub struct Verbosity {
    pub level: u8,
    pub quiet: bool,
}

/// Route log output through env_logger. Each `-v` raises the filter one
/// level; `--quiet` drops everything below errors regardless.
fn init_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        log::LevelFilter::Error
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };

    env_logger::Builder::new()
        .filter_level(filter)
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let verbosity = Verbosity {
        level: cli.verbose,
        quiet: cli.quiet,
    };

    match cli.command {
        Command::Plan(args) => commands::plan::run(&verbosity, &args),
        Command::Apply(args) => commands::apply::run(&verbosity, &args),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}
