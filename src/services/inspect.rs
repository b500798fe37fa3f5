//! Sanity checks over a populated collection.

use serde::Serialize;

use super::vector_index::{Collection, DEFAULT_VECTOR, VectorIndex};
use crate::error::VectorIndexError;

/// What a full pass over the collection found.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerifyReport {
    pub collection: String,
    pub items: usize,
    /// Length of the default vector on the last item seen.
    pub vector_dim: Option<usize>,
    /// Property names of the last item seen, sorted.
    pub property_keys: Vec<String>,
    pub missing_vectors: usize,
}

/// Whether a collection exists and how many objects it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionStatus {
    pub exists: bool,
    pub objects: Option<u64>,
}

/// Look up `name` and count its objects. Lookup and count errors are returned.
pub async fn collection_status(
    index: &dyn VectorIndex,
    name: &str,
) -> Result<CollectionStatus, VectorIndexError> {
    if index.get_collection(name).await?.is_none() {
        return Ok(CollectionStatus {
            exists: false,
            objects: None,
        });
    }
    let objects = index.count(name).await?;
    Ok(CollectionStatus {
        exists: true,
        objects: Some(objects),
    })
}

/// Walk every object with its vectors and summarize what came back.
pub async fn verify(
    collection: &Collection<'_>,
    page_size: u32,
) -> Result<VerifyReport, VectorIndexError> {
    let mut report = VerifyReport {
        collection: collection.name().to_string(),
        ..Default::default()
    };

    let mut cursor = collection.iterate(true, page_size);
    while let Some(item) = cursor.next().await? {
        report.items += 1;
        match item.vector(DEFAULT_VECTOR) {
            Some(vector) => report.vector_dim = Some(vector.len()),
            None => report.missing_vectors += 1,
        }
        let mut keys: Vec<String> = item.properties.keys().cloned().collect();
        keys.sort();
        report.property_keys = keys;
    }

    Ok(report)
}
