//! Vector index abstraction layer.
//!
//! The hosted service owns embedding computation, storage and search. This
//! module only describes the calls the pipeline makes against it, so the
//! loader and exporter can run against the Weaviate backend or an in-memory
//! stand-in.

mod weaviate;

#[cfg(test)]
pub(crate) mod memory;

pub use weaviate::{WeaviateClient, class_name};

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};

use crate::error::VectorIndexError;
use crate::models::{CollectionInfo, CollectionSchema};

/// Name of the vector the service computes for an unnamed vectorizer.
pub const DEFAULT_VECTOR: &str = "default";

/// An object submitted in a bulk insert.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertObject {
    pub id: Option<uuid::Uuid>,
    pub properties: Map<String, Value>,
}

/// Per-call result of a bulk insert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResult {
    pub inserted: usize,
    pub errors: Vec<String>,
}

/// An object read back from the index, with its computed vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedItem {
    pub id: String,
    pub properties: Map<String, Value>,
    pub vectors: HashMap<String, Vec<f32>>,
}

impl IndexedItem {
    pub fn vector(&self, name: &str) -> Option<&[f32]> {
        self.vectors.get(name).map(Vec::as_slice)
    }

    /// Read a property as text. Integral numbers are rendered without a
    /// fractional part so ids stored as numbers round-trip.
    pub fn property_text(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(i.to_string())
                } else if let Some(f) = n.as_f64() {
                    if f.fract() == 0.0 && f.abs() < 9.0e15 {
                        Some(format!("{}", f as i64))
                    } else {
                        Some(f.to_string())
                    }
                } else {
                    Some(n.to_string())
                }
            }
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Cursor position for one page of iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub after: Option<String>,
    pub limit: u32,
    pub include_vector: bool,
}

/// Operations the pipeline needs from the hosted index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Check if the service is ready to accept requests.
    async fn health_check(&self) -> Result<bool, VectorIndexError>;

    /// Look up a collection. Returns None if it does not exist.
    async fn get_collection(&self, name: &str) -> Result<Option<CollectionInfo>, VectorIndexError>;

    /// Create a collection. Fails with `AlreadyExists` on a name collision.
    async fn create_collection(&self, schema: &CollectionSchema) -> Result<(), VectorIndexError>;

    /// Delete a collection and all its objects.
    async fn delete_collection(&self, name: &str) -> Result<(), VectorIndexError>;

    /// Submit one bulk insert.
    async fn insert_many(
        &self,
        collection: &str,
        objects: Vec<InsertObject>,
    ) -> Result<BatchResult, VectorIndexError>;

    /// Fetch the page of objects following `request.after`.
    async fn fetch_page(
        &self,
        collection: &str,
        request: PageRequest,
    ) -> Result<Vec<IndexedItem>, VectorIndexError>;

    /// Number of objects in a collection.
    async fn count(&self, collection: &str) -> Result<u64, VectorIndexError>;

    /// Release the connection. Further calls are not expected.
    async fn close(&self) {}
}

/// Handle to one named collection.
#[derive(Clone, Copy)]
pub struct Collection<'a> {
    index: &'a dyn VectorIndex,
    name: &'a str,
}

impl<'a> Collection<'a> {
    pub fn new(index: &'a dyn VectorIndex, name: &'a str) -> Self {
        Self { index, name }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub async fn insert_many(
        &self,
        objects: Vec<InsertObject>,
    ) -> Result<BatchResult, VectorIndexError> {
        self.index.insert_many(self.name, objects).await
    }

    pub async fn count(&self) -> Result<u64, VectorIndexError> {
        self.index.count(self.name).await
    }

    /// Lazily iterate every object in the collection, one page at a time.
    pub fn iterate(&self, include_vector: bool, page_size: u32) -> ObjectCursor<'a> {
        ObjectCursor {
            index: self.index,
            collection: self.name,
            page_size: page_size.max(1),
            include_vector,
            after: None,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }
}

impl std::fmt::Debug for Collection<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection").field("name", &self.name).finish()
    }
}

/// Finite, restartable sequence over a collection's objects.
///
/// Delivery order is whatever the service pages in; it need not match
/// insertion order.
pub struct ObjectCursor<'a> {
    index: &'a dyn VectorIndex,
    collection: &'a str,
    page_size: u32,
    include_vector: bool,
    after: Option<String>,
    buffer: VecDeque<IndexedItem>,
    exhausted: bool,
}

impl ObjectCursor<'_> {
    pub async fn next(&mut self) -> Result<Option<IndexedItem>, VectorIndexError> {
        if self.buffer.is_empty() && !self.exhausted {
            self.fill().await?;
        }
        Ok(self.buffer.pop_front())
    }

    /// Start again from the first page.
    pub fn restart(&mut self) {
        self.after = None;
        self.buffer.clear();
        self.exhausted = false;
    }

    async fn fill(&mut self) -> Result<(), VectorIndexError> {
        let request = PageRequest {
            after: self.after.clone(),
            limit: self.page_size,
            include_vector: self.include_vector,
        };
        let page = self.index.fetch_page(self.collection, request).await?;

        if page.len() < self.page_size as usize {
            self.exhausted = true;
        }
        match page.last() {
            Some(last) => self.after = Some(last.id.clone()),
            None => self.exhausted = true,
        }

        self.buffer.extend(page);
        Ok(())
    }
}
