pub mod connection;
pub mod dataset;
pub mod exporter;
pub mod inspect;
pub mod loader;
pub mod pipeline;
pub mod provisioner;
pub mod shutdown;
pub mod vector_index;

pub use connection::{Connection, Connector, WeaviateConnector};
pub use dataset::{Acquisition, DatasetSource, KaggleSource, ensure_dataset};
pub use exporter::{ParquetPartWriter, PartWriter, VectorExporter};
pub use inspect::{CollectionStatus, VerifyReport, collection_status, verify};
pub use loader::{BatchLoader, LoadReport, read_postings};
pub use pipeline::{IngestReport, open_connection, open_connection_with};
pub use provisioner::{Provisioned, open_existing, provision, reset};
pub use shutdown::{shutdown_signal, until_shutdown};
pub use vector_index::{Collection, ObjectCursor, VectorIndex, WeaviateClient};
