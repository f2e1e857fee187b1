mod cli;
mod commands;
mod config;
mod report;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::Config;
use std::io;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    pub config: Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(log_level(cli.verbose, cli.quiet))
        .format_timestamp(None)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

/// Log level for the `-v` count; `--quiet` wins
fn log_level(verbose: u8, quiet: bool) -> log::LevelFilter {
    if quiet {
        return log::LevelFilter::Error;
    }
    match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "ide-sync", &mut io::stdout());
        return Ok(());
    }

    let ctx = Context {
        quiet: cli.quiet,
        config: Config::load(cli.config.as_deref())?,
    };

    match cli.command {
        Command::Mahara(args) => commands::mahara::run(&ctx, args),
        Command::MaharaCsv(args) => commands::mahara_csv::run(&ctx, args),
        Command::MoodleCsv(args) => commands::moodle_csv::run(&ctx, args),
        Command::Completions { .. } => Ok(()),
    }
}

/// Print the error chain, plus advice when the cause is categorized
fn report_error(err: &anyhow::Error) {
    ui::error(&format!("{err:#}"));

    let cause = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<mahara::Error>());
    if let Some(cause) = cause {
        ui::dim(&format!("{}: {}", cause.category(), cause.advice()));
    }
}
