use anyhow::Result;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::error::AppError;
use crate::models::{Config, ENV_SERVICE_URL, OutputFormat};
use crate::services::{
    Connection, collection_status, open_connection, shutdown_signal, until_shutdown,
};

pub async fn handle_status(config: Config, format: OutputFormat, _verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);
    let endpoint = std::env::var(ENV_SERVICE_URL).unwrap_or_default();
    let opened = open_connection(&config).await;
    let status = collect_status(opened, endpoint, config.collection.name.clone()).await?;
    print!("{}", formatter.format_status(&status));

    if !status.ready {
        eprintln!();
        eprintln!("Warning: vector index is not reachable. Check WEAVIATE_URL and the API key.");
    } else if status.collection_exists == Some(false) {
        eprintln!();
        eprintln!("Hint: collection not created yet. Run: jobindex ingest");
    }

    Ok(())
}

/// Turn a connection attempt into a status report, closing the connection if it opened.
///
/// Missing configuration is an error. Service failures are recorded in
/// `StatusInfo::error`.
async fn collect_status(
    opened: Result<Connection, AppError>,
    endpoint: String,
    collection: String,
) -> Result<StatusInfo, AppError> {
    let connection = match opened {
        Ok(connection) => connection,
        Err(e @ AppError::Config(_)) => return Err(e),
        Err(e) => {
            return Ok(StatusInfo {
                endpoint,
                ready: false,
                collection,
                collection_exists: None,
                objects: None,
                error: Some(e.to_string()),
            });
        }
    };

    let result = until_shutdown(
        collection_status(connection.index(), &collection),
        shutdown_signal(),
    )
    .await;
    let endpoint = connection.endpoint().to_string();
    connection.close().await;

    let status = match result {
        Ok(found) => StatusInfo {
            endpoint,
            ready: true,
            collection,
            collection_exists: Some(found.exists),
            objects: found.objects,
            error: None,
        },
        Err(AppError::Interrupted) => return Err(AppError::Interrupted),
        Err(e) => StatusInfo {
            endpoint,
            ready: true,
            collection,
            collection_exists: None,
            objects: None,
            error: Some(e.to_string()),
        },
    };
    Ok(status)
}
