use anyhow::Result;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::{open_connection, open_existing, shutdown_signal, until_shutdown, verify};

pub async fn handle_verify(config: Config, format: OutputFormat, verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);
    let connection = open_connection(&config).await?;

    let body = async {
        let collection = open_existing(connection.index(), &config.collection.name).await?;
        verify(&collection, config.export.page_size).await
    };
    let result = until_shutdown(body, shutdown_signal()).await;
    connection.close().await;

    let report = result?;
    if verbose && report.missing_vectors > 0 {
        eprintln!("Warning: {} objects have no vector", report.missing_vectors);
    }
    print!("{}", formatter.format_verify(&report));
    Ok(())
}
