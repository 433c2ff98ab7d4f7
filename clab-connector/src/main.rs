use std::fs::File;

use anyhow::Context;
use clap::Parser;
use cli::{Commands, GlobalArgs, LogLevel};
use commands::{
    check_sync::check_sync, export_lab::export_lab, generate_crs::generate_crs, health::health,
    integrate::integrate, remove::remove,
};
use config::ConnectorConfig;
use env_logger::Target;
use log::LevelFilter;

use crate::cli::Cli;

mod cli;
mod commands;
mod config;
mod output;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    configure_logging(&cli.global_args)?;

    let config = ConnectorConfig::load(cli.global_args.config.as_deref())
        .context("Couldn't load the connector config!")?;

    match cli.command {
        Commands::Integrate(args) => integrate(cli.global_args, args, config).await?,
        Commands::Remove(args) => remove(args, config).await?,
        Commands::ExportLab(args) => export_lab(cli.global_args, args).await?,
        Commands::GenerateCrs(args) => generate_crs(args)?,
        Commands::CheckSync(args) => check_sync(args, config).await?,
        Commands::Health(args) => health(cli.global_args, args, config).await?,
    }

    Ok(())
}

fn configure_logging(global_args: &GlobalArgs) -> anyhow::Result<()> {
    let log_level = global_args.log_level;
    let mut logger = env_logger::builder();

    logger
        .format_timestamp(None)
        .format_module_path(matches!(log_level, LogLevel::Debug))
        .format_target(false)
        .target(Target::Stderr);

    match log_level {
        LogLevel::Debug => logger.filter(None, LevelFilter::Warn).filter(
            Some("clab_connector"),
            LevelFilter::Debug,
        ),
        LogLevel::Info => logger.filter(Some("clab_connector"), LevelFilter::Info),
        LogLevel::Warning => logger.filter(Some("clab_connector"), LevelFilter::Warn),
        LogLevel::Error | LogLevel::Critical => {
            logger.filter(Some("clab_connector"), LevelFilter::Error)
        }
    };

    if let Some(path) = &global_args.log_file {
        let file = File::create(path)
            .context(format!("Couldn't create log file '{}'!", path.display()))?;
        logger.target(Target::Pipe(Box::new(file)));
    }

    logger.init();

    Ok(())
}
