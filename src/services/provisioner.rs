//! Ensure the job collection exists before loading or exporting.

use tracing::{info, warn};

use super::vector_index::{Collection, VectorIndex};
use crate::error::{ProvisioningError, VectorIndexError};
use crate::models::{CollectionSchema, ProvisionStatus};

/// A collection handle plus how it was obtained.
#[derive(Debug)]
pub struct Provisioned<'a> {
    pub collection: Collection<'a>,
    pub status: ProvisionStatus,
}

/// Create the collection unless it already exists.
///
/// Existence is checked first. A create that still reports a name collision
/// (another writer got there first) is resolved by fetching again; any other
/// create failure is returned rather than treated as "exists".
pub async fn provision<'a>(
    index: &'a dyn VectorIndex,
    schema: &'a CollectionSchema,
) -> Result<Provisioned<'a>, ProvisioningError> {
    let name = schema.name.as_str();
    let failed = |source: VectorIndexError| ProvisioningError::Failed {
        name: name.to_string(),
        source,
    };

    if index.get_collection(name).await.map_err(failed)?.is_some() {
        info!(collection = name, "collection already exists");
        return Ok(Provisioned {
            collection: Collection::new(index, name),
            status: ProvisionStatus::AlreadyExists,
        });
    }

    match index.create_collection(schema).await {
        Ok(()) => {
            info!(
                collection = name,
                model = %schema.embedding_model,
                generative = schema.generative,
                "created collection"
            );
            Ok(Provisioned {
                collection: Collection::new(index, name),
                status: ProvisionStatus::Created,
            })
        }
        Err(VectorIndexError::AlreadyExists(_)) => {
            warn!(collection = name, "collection created concurrently, fetching it");
            match index.get_collection(name).await.map_err(failed)? {
                Some(_) => Ok(Provisioned {
                    collection: Collection::new(index, name),
                    status: ProvisionStatus::AlreadyExists,
                }),
                None => Err(ProvisioningError::Vanished(name.to_string())),
            }
        }
        Err(e) => Err(failed(e)),
    }
}

/// Handle to a collection that must already exist.
pub async fn open_existing<'a>(
    index: &'a dyn VectorIndex,
    name: &'a str,
) -> Result<Collection<'a>, VectorIndexError> {
    match index.get_collection(name).await? {
        Some(_) => Ok(Collection::new(index, name)),
        None => Err(VectorIndexError::NotFound(name.to_string())),
    }
}

/// Drop the collection with all its objects and create it empty.
pub async fn reset<'a>(
    index: &'a dyn VectorIndex,
    schema: &'a CollectionSchema,
) -> Result<Provisioned<'a>, ProvisioningError> {
    match index.delete_collection(&schema.name).await {
        Ok(()) => info!(collection = %schema.name, "deleted collection"),
        Err(VectorIndexError::NotFound(_)) => {}
        Err(source) => {
            return Err(ProvisioningError::Failed {
                name: schema.name.clone(),
                source,
            });
        }
    }
    provision(index, schema).await
}
