//! End-to-end ingest and export runs over an open connection.

use indicatif::ProgressBar;
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

use super::connection::{Connection, Connector, WeaviateConnector};
use super::dataset::{Acquisition, DatasetSource, ensure_dataset};
use super::exporter::{PartWriter, VectorExporter};
use super::loader::{BatchLoader, LoadReport, read_postings};
use super::provisioner::{open_existing, provision};
use crate::error::AppError;
use crate::models::{CollectionSchema, Config, Credentials, ExportSummary, ProvisionStatus};

/// Everything an ingest run did.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub collection: String,
    pub provision: ProvisionStatus,
    pub downloaded: bool,
    pub load: LoadReport,
    pub duration_ms: u64,
}

/// Read credentials from the environment and connect to Weaviate.
pub async fn open_connection(config: &Config) -> Result<Connection, AppError> {
    open_connection_with(|name| std::env::var(name).ok(), config, &WeaviateConnector).await
}

/// Resolve credentials through `lookup`, then connect.
///
/// Credentials are checked before the connector runs, so a missing variable
/// stops the run with nothing sent to the service.
pub async fn open_connection_with<F>(
    lookup: F,
    config: &Config,
    connector: &dyn Connector,
) -> Result<Connection, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let credentials = Credentials::from_lookup(lookup)?;
    let connection = connector.connect(&credentials, &config.service).await?;
    Ok(connection)
}

/// Provision the collection, fetch the dataset if needed, and load it.
pub async fn ingest(
    connection: &Connection,
    config: &Config,
    source: &dyn DatasetSource,
    progress: &ProgressBar,
) -> Result<IngestReport, AppError> {
    let start = Instant::now();
    let schema = CollectionSchema::from_config(&config.collection);
    let provisioned = provision(connection.index(), &schema).await?;

    let acquisition = ensure_dataset(
        source,
        &config.dataset.source,
        &config.dataset.data_dir,
        &config.dataset.file,
    )
    .await?;

    let postings = read_postings(&config.dataset.file, config.ingest.max_rows)?;
    let loader = BatchLoader::from_config(&config.ingest);
    info!(
        records = postings.len(),
        chunk_size = loader.chunk_size(),
        batches = loader.batch_count(postings.len()),
        "loading postings"
    );

    progress.set_length(postings.len() as u64);
    let load = loader
        .load(&provisioned.collection, &postings, |_, rows| {
            progress.inc(rows as u64)
        })
        .await?;
    progress.finish_and_clear();

    Ok(IngestReport {
        collection: schema.name.clone(),
        provision: provisioned.status,
        downloaded: acquisition == Acquisition::Downloaded,
        load,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Export `(job_id, embedding)` rows of an existing collection.
pub async fn export<W: PartWriter>(
    connection: &Connection,
    config: &Config,
    writer: &mut W,
    progress: &ProgressBar,
) -> Result<ExportSummary, AppError> {
    let collection = open_existing(connection.index(), &config.collection.name).await?;

    match collection.count().await {
        Ok(count) => progress.set_length(count),
        Err(e) => warn!(error = %e, "could not count objects, progress length unknown"),
    }

    let exporter = VectorExporter::from_config(&config.export);
    let summary = exporter
        .export(&collection, writer, |n| progress.set_position(n as u64))
        .await?;
    progress.finish_and_clear();

    info!(
        parts = summary.parts.len(),
        rows = summary.total_rows,
        "export finished"
    );
    Ok(summary)
}
