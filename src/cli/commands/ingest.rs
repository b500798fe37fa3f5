//! Ingest command implementation.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use super::progress_bar;
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::{KaggleSource, open_connection, pipeline, shutdown_signal, until_shutdown};

/// Arguments for the ingest command.
#[derive(Debug, Args)]
pub struct IngestArgs {
    /// CSV file to load instead of the configured dataset file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Records per bulk insert
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Load only the first N rows
    #[arg(long)]
    pub max_rows: Option<usize>,

    /// Derive object ids from job_id so re-runs overwrite instead of duplicating
    #[arg(long)]
    pub dedup: bool,
}

impl IngestArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(ref file) = self.file {
            config.dataset.file = file.clone();
        }
        if let Some(chunk_size) = self.chunk_size {
            config.ingest.chunk_size = chunk_size;
        }
        if self.max_rows.is_some() {
            config.ingest.max_rows = self.max_rows;
        }
        if self.dedup {
            config.ingest.dedup = true;
        }
    }
}

/// Handle the ingest command.
pub async fn handle_ingest(
    args: IngestArgs,
    mut config: Config,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    args.apply(&mut config);
    config.validate()?;
    let formatter = get_formatter(format);

    if verbose {
        eprintln!(
            "Loading {} into {} (chunk size {})",
            config.dataset.file.display(),
            config.collection.name,
            config.ingest.chunk_size
        );
    }

    let source = KaggleSource::new(config.service.timeout_secs)
        .context("failed to build dataset client")?;
    let connection = open_connection(&config).await?;

    let progress = progress_bar(format);
    let result = until_shutdown(
        pipeline::ingest(&connection, &config, &source, &progress),
        shutdown_signal(),
    )
    .await;
    connection.close().await;

    let report = result.context("ingest failed")?;
    print!("{}", formatter.format_ingest(&report));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_config() {
        let args = IngestArgs {
            file: Some(PathBuf::from("other.csv")),
            chunk_size: Some(250),
            max_rows: Some(5),
            dedup: true,
        };
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.dataset.file, PathBuf::from("other.csv"));
        assert_eq!(config.ingest.chunk_size, 250);
        assert_eq!(config.ingest.max_rows, Some(5));
        assert!(config.ingest.dedup);
    }

    #[test]
    fn test_absent_args_keep_config() {
        let args = IngestArgs {
            file: None,
            chunk_size: None,
            max_rows: None,
            dedup: false,
        };
        let mut config = Config::default();
        config.ingest.dedup = true;
        config.ingest.max_rows = Some(7);
        args.apply(&mut config);

        assert_eq!(config.ingest.chunk_size, 1000);
        assert_eq!(config.ingest.max_rows, Some(7));
        assert!(config.ingest.dedup);
    }
}
