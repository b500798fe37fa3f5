//! Collection management commands.

use anyhow::{Result, bail};
use clap::Subcommand;

use crate::cli::output::{CollectionReport, get_formatter};
use crate::models::{CollectionSchema, Config, OutputFormat};
use crate::services::{open_connection, reset, shutdown_signal, until_shutdown};

#[derive(Debug, Subcommand)]
pub enum CollectionCommand {
    #[command(about = "Delete the collection and all its objects, then recreate it empty")]
    Reset {
        #[arg(long, help = "Confirm deletion")]
        force: bool,
    },
    #[command(about = "Show the configured schema and whether the collection exists")]
    Info,
}

pub async fn handle_collection(
    cmd: CollectionCommand,
    config: Config,
    format: OutputFormat,
    _verbose: bool,
) -> Result<()> {
    let formatter = get_formatter(format);
    let schema = CollectionSchema::from_config(&config.collection);

    match cmd {
        CollectionCommand::Reset { force } => {
            if !force {
                bail!(
                    "This deletes every object in '{}'.\nUse --force to confirm.",
                    schema.name
                );
            }

            let connection = open_connection(&config).await?;
            let result = until_shutdown(reset(connection.index(), &schema), shutdown_signal())
                .await
                .map(|provisioned| provisioned.status);
            connection.close().await;

            let status = result?;
            println!(
                "{}",
                formatter.format_message(&format!("Collection '{}' reset ({status})", schema.name))
            );
        }
        CollectionCommand::Info => {
            let connection = open_connection(&config).await?;
            let result = until_shutdown(
                connection.index().get_collection(&schema.name),
                shutdown_signal(),
            )
            .await;
            connection.close().await;

            let existing = result?;
            let report = CollectionReport {
                exists: existing.is_some(),
                remote_vectorizer: existing.and_then(|info| info.vectorizer),
                schema,
            };
            print!("{}", formatter.format_collection(&report));
        }
    }

    Ok(())
}
