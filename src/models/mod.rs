mod collection;
mod config;
mod export;
mod job;
mod output;

pub use collection::{CollectionInfo, CollectionSchema, ProvisionStatus};
pub use config::{
    CollectionConfig, Config, Credentials, DEFAULT_CHUNK_SIZE, DEFAULT_COLLECTION,
    DEFAULT_DATASET_FILE, DEFAULT_DATASET_SOURCE, DEFAULT_EMBEDDING_MODEL,
    DEFAULT_EXPORT_BATCH_SIZE, DEFAULT_EXPORT_PREFIX, DatasetConfig, ENV_EMBEDDING_API_KEY,
    ENV_SERVICE_API_KEY, ENV_SERVICE_URL, ExportConfig, IngestConfig, ServiceConfig,
};
pub use export::{ExportRow, ExportSummary, PART_FILE_EXTENSION, PartFile, part_file_path};
pub use job::{JOB_COLUMNS, JobPosting};
pub use output::OutputFormat;
