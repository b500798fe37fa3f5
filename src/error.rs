//! Error types for the job index pipeline.

use thiserror::Error;

/// Errors related to configuration and credentials.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable not set: {0}")]
    MissingVar(&'static str),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Errors raised while fetching or reading the source dataset.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("invalid dataset reference: {0}")]
    InvalidSource(String),

    #[error("dataset download failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("dataset server returned {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("archive extraction failed: {0}")]
    ArchiveError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("dataset file not found after download: {0}")]
    MissingFile(String),
}

/// Errors returned by the vector index service client.
#[derive(Debug, Error)]
pub enum VectorIndexError {
    #[error("failed to connect to vector index: {0}")]
    ConnectionError(String),

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("collection already exists: {0}")]
    AlreadyExists(String),

    #[error("collection not found: {0}")]
    NotFound(String),

    #[error("server returned {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors from ensuring the collection exists.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("failed to provision collection {name}: {source}")]
    Failed {
        name: String,
        #[source]
        source: VectorIndexError,
    },

    #[error("collection {0} disappeared after create reported it exists")]
    Vanished(String),
}

/// Errors raised by a bulk insert.
#[derive(Debug, Error)]
pub enum InsertionError {
    #[error("batch {batch} insert failed: {source}")]
    Request {
        batch: usize,
        #[source]
        source: VectorIndexError,
    },

    #[error("batch {batch}: {failed} of {total} objects rejected, first error: {message}")]
    Rejected {
        batch: usize,
        failed: usize,
        total: usize,
        message: String,
    },

    #[error("failed to serialize record {job_id}: {source}")]
    Serialize {
        job_id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while exporting embeddings.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("iteration failed: {0}")]
    Iteration(#[from] VectorIndexError),

    #[error("item {id} has no job_id property")]
    MissingJobId { id: String },

    #[error("item {id} has no '{vector}' vector")]
    MissingVector { id: String, vector: String },

    #[error("failed to write part {part}: {message}")]
    Write { part: u32, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("acquisition error: {0}")]
    Acquisition(#[from] AcquisitionError),

    #[error("provisioning error: {0}")]
    Provisioning(#[from] ProvisioningError),

    #[error("insertion error: {0}")]
    Insertion(#[from] InsertionError),

    #[error("export error: {0}")]
    Export(#[from] ExportError),

    #[error("vector index error: {0}")]
    VectorIndex(#[from] VectorIndexError),

    #[error("interrupted by shutdown signal")]
    Interrupted,
}
