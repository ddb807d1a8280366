mod cli;
mod config;
mod harvest;

use anyhow::Context;
use clap::Parser;

use crate::cli::{Cli, Command};
use crate::config::AppConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(&cli.config)?;

    match cli.command {
        Command::Config(args) => {
            args.apply(&mut config);
            println!("{}", config.to_ron()?);
        }
        Command::Harvest(args) => {
            args.apply(&mut config);
            engine_logging::initialize(
                config.log.destination(),
                config.log.level_filter(),
                &config.log.file,
            );

            let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
            let run = runtime.block_on(harvest::run(&config))?;
            println!("{}", run.tally());
        }
    }
    Ok(())
}
