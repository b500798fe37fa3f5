//! Explicit lifecycle for the hosted index connection.

use async_trait::async_trait;
use tracing::info;

use super::vector_index::{Collection, VectorIndex, WeaviateClient};
use crate::error::VectorIndexError;
use crate::models::{Credentials, ServiceConfig};

/// An open connection to the vector index.
///
/// Opened once per command and passed by reference to each component.
/// [`Connection::close`] consumes it; callers close it on both the success
/// and the failure path.
pub struct Connection {
    index: Box<dyn VectorIndex>,
    endpoint: String,
}

impl Connection {
    /// Connect and wait for the service to report ready.
    pub async fn open(
        credentials: &Credentials,
        config: &ServiceConfig,
    ) -> Result<Self, VectorIndexError> {
        let client = WeaviateClient::new(credentials, config)?;
        let endpoint = client.base_url().to_string();

        if !client.health_check().await? {
            return Err(VectorIndexError::ConnectionError(format!(
                "{endpoint} is not ready"
            )));
        }

        info!(%endpoint, "connected to vector index");
        Ok(Self {
            index: Box::new(client),
            endpoint,
        })
    }

    /// Wrap an already-constructed index.
    pub fn from_index(index: Box<dyn VectorIndex>, endpoint: impl Into<String>) -> Self {
        Self {
            index,
            endpoint: endpoint.into(),
        }
    }

    pub fn index(&self) -> &dyn VectorIndex {
        self.index.as_ref()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Handle to a collection without checking that it exists.
    pub fn collection<'a>(&'a self, name: &'a str) -> Collection<'a> {
        Collection::new(self.index.as_ref(), name)
    }

    pub async fn close(self) {
        self.index.close().await;
        info!(endpoint = %self.endpoint, "closed vector index connection");
    }
}

/// Opens a [`Connection`] from resolved credentials.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        credentials: &Credentials,
        config: &ServiceConfig,
    ) -> Result<Connection, VectorIndexError>;
}

/// Connects to the hosted Weaviate service.
pub struct WeaviateConnector;

#[async_trait]
impl Connector for WeaviateConnector {
    async fn connect(
        &self,
        credentials: &Credentials,
        config: &ServiceConfig,
    ) -> Result<Connection, VectorIndexError> {
        Connection::open(credentials, config).await
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::vector_index::memory::MemoryIndex;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_close_releases_index() {
        let index = Arc::new(MemoryIndex::new(2));
        let connection = Connection::from_index(Box::new(Arc::clone(&index)), "memory");
        assert!(connection.index().health_check().await.unwrap());
        assert_eq!(connection.collection("jobs").name(), "jobs");

        connection.close().await;
        assert!(index.is_closed());
    }
}
