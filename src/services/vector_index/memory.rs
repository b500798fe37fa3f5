//! In-memory index used by tests in place of the hosted service.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{BatchResult, DEFAULT_VECTOR, IndexedItem, InsertObject, PageRequest, VectorIndex};
use crate::error::VectorIndexError;
use crate::models::{CollectionInfo, CollectionSchema};

#[derive(Default)]
struct State {
    collections: HashMap<String, Vec<IndexedItem>>,
    schemas: HashMap<String, CollectionSchema>,
    insert_calls: Vec<Vec<InsertObject>>,
    create_calls: usize,
    page_fetches: usize,
    next_id: u64,
    closed: bool,
}

/// Failure to inject into the next matching call.
#[derive(Debug, Clone)]
pub enum Fault {
    /// Fail the nth insert call (0-based) with a server error.
    InsertCall(usize),
    /// Reject one object in the nth insert call.
    RejectObject(usize),
    /// Fail every create call with a server error.
    Create,
    /// Report `AlreadyExists` from create but never show the collection.
    CreateConflictWithoutCollection,
    /// Fail every collection lookup as unauthorized.
    GetCollection,
}

pub struct MemoryIndex {
    state: Mutex<State>,
    dim: usize,
    faults: Vec<Fault>,
}

impl MemoryIndex {
    pub fn new(dim: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            dim,
            faults: Vec::new(),
        }
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }

    /// A collection pre-populated with `count` objects carrying a job_id.
    pub fn with_objects(name: &str, count: usize, dim: usize) -> Self {
        let index = Self::new(dim);
        {
            let mut state = index.state.lock().unwrap();
            let items = (0..count)
                .map(|i| {
                    let mut properties = Map::new();
                    properties.insert("job_id".to_string(), Value::String(format!("job-{i}")));
                    IndexedItem {
                        id: Self::format_id(i as u64),
                        properties,
                        vectors: HashMap::from([(
                            DEFAULT_VECTOR.to_string(),
                            vec![i as f32; dim],
                        )]),
                    }
                })
                .collect();
            state.collections.insert(name.to_string(), items);
            state.next_id = count as u64;
        }
        index
    }

    fn format_id(n: u64) -> String {
        format!("00000000-0000-0000-0000-{n:012x}")
    }

    pub fn insert_call_sizes(&self) -> Vec<usize> {
        let state = self.state.lock().unwrap();
        state.insert_calls.iter().map(Vec::len).collect()
    }

    pub fn inserted_job_ids(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .insert_calls
            .iter()
            .flatten()
            .filter_map(|o| o.properties.get("job_id"))
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    pub fn object_count(&self, name: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.collections.get(name).map_or(0, Vec::len)
    }

    pub fn collection_count(&self) -> usize {
        self.state.lock().unwrap().collections.len()
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    pub fn page_fetches(&self) -> usize {
        self.state.lock().unwrap().page_fetches
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn health_check(&self) -> Result<bool, VectorIndexError> {
        Ok(true)
    }

    async fn get_collection(&self, name: &str) -> Result<Option<CollectionInfo>, VectorIndexError> {
        if self.faults.iter().any(|f| matches!(f, Fault::GetCollection)) {
            return Err(VectorIndexError::ServerError {
                status: 401,
                message: "unauthorized".to_string(),
            });
        }
        let state = self.state.lock().unwrap();
        Ok(state.collections.contains_key(name).then(|| CollectionInfo {
            name: name.to_string(),
            vectorizer: state.schemas.get(name).map(|s| s.vectorizer.clone()),
        }))
    }

    async fn create_collection(&self, schema: &CollectionSchema) -> Result<(), VectorIndexError> {
        let mut state = self.state.lock().unwrap();
        state.create_calls += 1;

        for fault in &self.faults {
            match fault {
                Fault::Create => {
                    return Err(VectorIndexError::ServerError {
                        status: 500,
                        message: "vectorizer module not enabled".to_string(),
                    });
                }
                Fault::CreateConflictWithoutCollection => {
                    return Err(VectorIndexError::AlreadyExists(schema.name.clone()));
                }
                _ => {}
            }
        }

        if state.collections.contains_key(&schema.name) {
            return Err(VectorIndexError::AlreadyExists(schema.name.clone()));
        }
        state.collections.insert(schema.name.clone(), Vec::new());
        state.schemas.insert(schema.name.clone(), schema.clone());
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), VectorIndexError> {
        let mut state = self.state.lock().unwrap();
        state.schemas.remove(name);
        state
            .collections
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| VectorIndexError::NotFound(name.to_string()))
    }

    async fn insert_many(
        &self,
        collection: &str,
        objects: Vec<InsertObject>,
    ) -> Result<BatchResult, VectorIndexError> {
        let mut state = self.state.lock().unwrap();
        let call = state.insert_calls.len();
        state.insert_calls.push(objects.clone());

        for fault in &self.faults {
            if let Fault::InsertCall(n) = fault
                && *n == call
            {
                return Err(VectorIndexError::ServerError {
                    status: 503,
                    message: "service unavailable".to_string(),
                });
            }
        }
        let reject = self
            .faults
            .iter()
            .any(|f| matches!(f, Fault::RejectObject(n) if *n == call));

        let dim = self.dim;
        let mut next_id = state.next_id;
        let items = state
            .collections
            .get_mut(collection)
            .ok_or_else(|| VectorIndexError::NotFound(collection.to_string()))?;

        let mut result = BatchResult::default();
        for (i, object) in objects.into_iter().enumerate() {
            if reject && i == 0 {
                result
                    .errors
                    .push("invalid text property 'title'".to_string());
                continue;
            }
            let id = object.id.map(|u| u.to_string()).unwrap_or_else(|| {
                next_id += 1;
                Self::format_id(next_id)
            });
            let item = IndexedItem {
                id: id.clone(),
                properties: object.properties,
                vectors: HashMap::from([(DEFAULT_VECTOR.to_string(), vec![0.5; dim])]),
            };
            match items.iter_mut().find(|existing| existing.id == id) {
                Some(existing) => *existing = item,
                None => items.push(item),
            }
            result.inserted += 1;
        }
        state.next_id = next_id;
        Ok(result)
    }

    async fn fetch_page(
        &self,
        collection: &str,
        request: PageRequest,
    ) -> Result<Vec<IndexedItem>, VectorIndexError> {
        let mut state = self.state.lock().unwrap();
        state.page_fetches += 1;
        let items = state
            .collections
            .get(collection)
            .ok_or_else(|| VectorIndexError::NotFound(collection.to_string()))?;

        let start = match &request.after {
            Some(after) => items
                .iter()
                .position(|item| &item.id == after)
                .map_or(items.len(), |p| p + 1),
            None => 0,
        };

        Ok(items
            .iter()
            .skip(start)
            .take(request.limit as usize)
            .cloned()
            .map(|mut item| {
                if !request.include_vector {
                    item.vectors.clear();
                }
                item
            })
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<u64, VectorIndexError> {
        Ok(self.object_count(collection) as u64)
    }

    async fn close(&self) {
        self.state.lock().unwrap().closed = true;
    }
}

/// Lets a test keep inspecting the index after handing it to a connection.
#[async_trait]
impl VectorIndex for Arc<MemoryIndex> {
    async fn health_check(&self) -> Result<bool, VectorIndexError> {
        self.as_ref().health_check().await
    }

    async fn get_collection(&self, name: &str) -> Result<Option<CollectionInfo>, VectorIndexError> {
        self.as_ref().get_collection(name).await
    }

    async fn create_collection(&self, schema: &CollectionSchema) -> Result<(), VectorIndexError> {
        self.as_ref().create_collection(schema).await
    }

    async fn delete_collection(&self, name: &str) -> Result<(), VectorIndexError> {
        self.as_ref().delete_collection(name).await
    }

    async fn insert_many(
        &self,
        collection: &str,
        objects: Vec<InsertObject>,
    ) -> Result<BatchResult, VectorIndexError> {
        self.as_ref().insert_many(collection, objects).await
    }

    async fn fetch_page(
        &self,
        collection: &str,
        request: PageRequest,
    ) -> Result<Vec<IndexedItem>, VectorIndexError> {
        self.as_ref().fetch_page(collection, request).await
    }

    async fn count(&self, collection: &str) -> Result<u64, VectorIndexError> {
        self.as_ref().count(collection).await
    }

    async fn close(&self) {
        self.as_ref().close().await
    }
}
