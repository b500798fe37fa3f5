use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use jobindex::cli::commands::{
    handle_collection, handle_config, handle_export, handle_ingest, handle_status, handle_verify,
};
use jobindex::cli::{Cli, Commands};
use jobindex::models::{Config, OutputFormat};

/// Log to stderr at `info`, or `debug` with `--verbose`. `RUST_LOG` wins when set.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "jobindex=debug,info" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .try_init()
        .ok();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let format = cli.format;
    let verbose = cli.verbose;

    // Commands that hold a connection stop on Ctrl+C themselves and close it
    // before returning `Interrupted`.
    run_command(cli, format, verbose).await
}

async fn run_command(cli: Cli, format: OutputFormat, verbose: bool) -> Result<()> {
    let config_path = cli.config.as_deref();
    let load = || Config::load(config_path);

    match cli.command {
        Commands::Ingest(args) => {
            handle_ingest(args, load()?, format, verbose).await?;
        }
        Commands::Export(args) => {
            handle_export(args, load()?, format, verbose).await?;
        }
        Commands::Verify => {
            handle_verify(load()?, format, verbose).await?;
        }
        Commands::Status => {
            handle_status(load()?, format, verbose).await?;
        }
        Commands::Collection(cmd) => {
            handle_collection(cmd, load()?, format, verbose).await?;
        }
        Commands::Config(cmd) => {
            handle_config(cmd, config_path, format, verbose).await?;
        }
    }

    Ok(())
}
