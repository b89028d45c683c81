mod app;
mod cli;
mod config;
mod effects;
mod persistence;
mod report;

use std::process::ExitCode;

use anyhow::Context;
use batch_logging::{batch_info, batch_warn};
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Command};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }
    if let Some(token) = cli.token {
        config.api.auth_token = Some(token);
    }

    let level_name = cli.log_level.as_deref().unwrap_or(&config.log.level);
    let level = batch_logging::parse_level(level_name).unwrap_or(LevelFilter::Info);
    batch_logging::initialize(&config.log.destination.to_destination(), level);

    match cli.command {
        Command::Send(args) => {
            let interrupt = app::spawn_interrupt_listener();
            let summary = app::run_send(&config, &args, &interrupt)?;
            if summary.is_complete() {
                batch_info!("All {} items sent", summary.finished);
                Ok(ExitCode::SUCCESS)
            } else {
                batch_warn!(
                    "{} failed, {} not attempted; rerun with --resume to retry",
                    summary.failed,
                    summary.left
                );
                Ok(ExitCode::from(2))
            }
        }
        Command::Check(args) => {
            let items = app::load_items(&args.input)?;
            print!("{}", report::render_parsed(&items));
            Ok(ExitCode::SUCCESS)
        }
        Command::Templates(args) => {
            let templates = app::list_templates(&config, args.user_id)?;
            print!("{}", report::render_templates(&templates));
            Ok(ExitCode::SUCCESS)
        }
    }
}
