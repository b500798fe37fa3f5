//! Export command implementation.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use super::progress_bar;
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::{
    ParquetPartWriter, open_connection, pipeline, shutdown_signal, until_shutdown,
};

/// Arguments for the export command.
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Output path prefix; parts are written as <prefix>_<n>.parquet
    #[arg(long)]
    pub prefix: Option<PathBuf>,

    /// Rows per part-file
    #[arg(long)]
    pub batch_size: Option<usize>,
}

/// Handle the export command.
pub async fn handle_export(
    args: ExportArgs,
    mut config: Config,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    if let Some(prefix) = args.prefix {
        config.export.prefix = prefix;
    }
    if let Some(batch_size) = args.batch_size {
        config.export.batch_size = batch_size;
    }
    config.validate()?;
    let formatter = get_formatter(format);

    if verbose {
        eprintln!(
            "Exporting {} to {}_<n>.parquet ({} rows per part)",
            config.collection.name,
            config.export.prefix.display(),
            config.export.batch_size
        );
    }

    let connection = open_connection(&config).await?;
    let mut writer = ParquetPartWriter::new(&config.export.prefix);

    let progress = progress_bar(format);
    let result = until_shutdown(
        pipeline::export(&connection, &config, &mut writer, &progress),
        shutdown_signal(),
    )
    .await;
    connection.close().await;

    let summary = result.context("export failed")?;
    print!("{}", formatter.format_export(&summary));
    Ok(())
}
