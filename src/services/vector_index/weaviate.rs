//! Weaviate REST backend.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use super::{BatchResult, DEFAULT_VECTOR, IndexedItem, InsertObject, PageRequest, VectorIndex};
use crate::error::VectorIndexError;
use crate::models::{CollectionInfo, CollectionSchema, Credentials, ServiceConfig};

const EMBEDDING_KEY_HEADER: &str = "X-OpenAI-Api-Key";

/// Class name as the service stores it: first letter upper-cased.
pub fn class_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn normalize_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// Weaviate client over its REST and GraphQL endpoints.
#[derive(Debug, Clone)]
pub struct WeaviateClient {
    client: Client,
    base_url: String,
}

impl WeaviateClient {
    pub fn new(credentials: &Credentials, config: &ServiceConfig) -> Result<Self, VectorIndexError> {
        let mut headers = HeaderMap::new();

        let bearer = HeaderValue::from_str(&format!("Bearer {}", credentials.service_api_key))
            .map_err(|e| VectorIndexError::ConnectionError(format!("invalid API key: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);

        let embedding_key = HeaderValue::from_str(&credentials.embedding_api_key).map_err(|e| {
            VectorIndexError::ConnectionError(format!("invalid embedding API key: {e}"))
        })?;
        headers.insert(EMBEDDING_KEY_HEADER, embedding_key);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| VectorIndexError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(&credentials.service_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{}", self.base_url, path)
    }
}

#[async_trait]
impl VectorIndex for WeaviateClient {
    async fn health_check(&self) -> Result<bool, VectorIndexError> {
        let response = self
            .client
            .get(self.url("/.well-known/ready"))
            .send()
            .await
            .map_err(|e| VectorIndexError::ConnectionError(e.to_string()))?;
        Ok(response.status().is_success())
    }

    async fn get_collection(&self, name: &str) -> Result<Option<CollectionInfo>, VectorIndexError> {
        let class = class_name(name);
        let response = self
            .client
            .get(self.url(&format!("/schema/{class}")))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(response).await?;
        let body: ClassResponse = response
            .json()
            .await
            .map_err(|e| VectorIndexError::InvalidResponse(e.to_string()))?;

        // Some versions answer 200 with an empty body for unknown classes.
        match body.class {
            Some(class) => Ok(Some(CollectionInfo {
                name: class,
                vectorizer: body.vectorizer,
            })),
            None => Ok(None),
        }
    }

    async fn create_collection(&self, schema: &CollectionSchema) -> Result<(), VectorIndexError> {
        let body = create_class_body(schema);
        let response = self
            .client
            .post(self.url("/schema"))
            .json(&body)
            .send()
            .await?;

        match ensure_success(response).await {
            Ok(_) => Ok(()),
            Err(VectorIndexError::ServerError { status, message })
                if status == StatusCode::UNPROCESSABLE_ENTITY.as_u16()
                    && message.contains("already exists") =>
            {
                Err(VectorIndexError::AlreadyExists(class_name(&schema.name)))
            }
            Err(e) => Err(e),
        }
    }

    async fn delete_collection(&self, name: &str) -> Result<(), VectorIndexError> {
        let class = class_name(name);
        let response = self
            .client
            .delete(self.url(&format!("/schema/{class}")))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(VectorIndexError::NotFound(class));
        }
        ensure_success(response).await?;
        Ok(())
    }

    async fn insert_many(
        &self,
        collection: &str,
        objects: Vec<InsertObject>,
    ) -> Result<BatchResult, VectorIndexError> {
        if objects.is_empty() {
            return Ok(BatchResult::default());
        }

        let body = batch_body(&class_name(collection), objects);
        let response = self
            .client
            .post(self.url("/batch/objects"))
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let results: Vec<BatchObjectResponse> = response
            .json()
            .await
            .map_err(|e| VectorIndexError::InvalidResponse(e.to_string()))?;

        Ok(summarize_batch(results))
    }

    async fn fetch_page(
        &self,
        collection: &str,
        request: PageRequest,
    ) -> Result<Vec<IndexedItem>, VectorIndexError> {
        let mut query: Vec<(&str, String)> = vec![
            ("class", class_name(collection)),
            ("limit", request.limit.to_string()),
        ];
        if request.include_vector {
            query.push(("include", "vector".to_string()));
        }
        if let Some(after) = request.after {
            query.push(("after", after));
        }

        let response = self
            .client
            .get(self.url("/objects"))
            .query(&query)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let page: ObjectsResponse = response
            .json()
            .await
            .map_err(|e| VectorIndexError::InvalidResponse(e.to_string()))?;

        debug!(collection, objects = page.objects.len(), "fetched page");
        Ok(page.objects.into_iter().map(IndexedItem::from).collect())
    }

    async fn count(&self, collection: &str) -> Result<u64, VectorIndexError> {
        let class = class_name(collection);
        let query = format!("{{ Aggregate {{ {class} {{ meta {{ count }} }} }} }}");
        let response = self
            .client
            .post(self.url("/graphql"))
            .json(&json!({ "query": query }))
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| VectorIndexError::InvalidResponse(e.to_string()))?;

        parse_aggregate_count(&body, &class)
    }

    async fn close(&self) {
        debug!(url = %self.base_url, "closing vector index client");
    }
}

async fn ensure_success(response: Response) -> Result<Response, VectorIndexError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = parse_error_message(&body).unwrap_or(body);
    Err(VectorIndexError::ServerError {
        status: status.as_u16(),
        message,
    })
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Vec<ErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

fn parse_error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    if parsed.error.is_empty() {
        return None;
    }
    Some(
        parsed
            .error
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; "),
    )
}

#[derive(Debug, Deserialize)]
struct ClassResponse {
    class: Option<String>,
    vectorizer: Option<String>,
}

#[derive(Debug, Serialize)]
struct BatchObject {
    class: String,
    properties: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<uuid::Uuid>,
}

#[derive(Debug, Serialize)]
struct BatchBody {
    objects: Vec<BatchObject>,
}

#[derive(Debug, Deserialize)]
struct BatchObjectResponse {
    #[serde(default)]
    result: Option<BatchObjectResult>,
}

#[derive(Debug, Deserialize)]
struct BatchObjectResult {
    #[serde(default)]
    errors: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ObjectsResponse {
    #[serde(default)]
    objects: Vec<ObjectResponse>,
}

#[derive(Debug, Deserialize)]
struct ObjectResponse {
    id: String,
    #[serde(default)]
    properties: Map<String, Value>,
    #[serde(default)]
    vector: Option<Vec<f32>>,
    #[serde(default)]
    vectors: Option<HashMap<String, Vec<f32>>>,
}

impl From<ObjectResponse> for IndexedItem {
    fn from(object: ObjectResponse) -> Self {
        let mut vectors = object.vectors.unwrap_or_default();
        if let Some(vector) = object.vector
            && !vector.is_empty()
        {
            vectors.entry(DEFAULT_VECTOR.to_string()).or_insert(vector);
        }
        IndexedItem {
            id: object.id,
            properties: object.properties,
            vectors,
        }
    }
}

fn create_class_body(schema: &CollectionSchema) -> Value {
    let mut module_config = Map::new();
    module_config.insert(
        schema.vectorizer.clone(),
        json!({ "model": schema.embedding_model }),
    );
    if schema.generative {
        module_config.insert("generative-openai".to_string(), json!({}));
    }

    let properties: Vec<Value> = schema
        .properties
        .iter()
        .map(|name| json!({ "name": name, "dataType": ["text"] }))
        .collect();

    json!({
        "class": class_name(&schema.name),
        "vectorizer": schema.vectorizer,
        "moduleConfig": module_config,
        "properties": properties,
    })
}

fn batch_body(class: &str, objects: Vec<InsertObject>) -> BatchBody {
    BatchBody {
        objects: objects
            .into_iter()
            .map(|o| BatchObject {
                class: class.to_string(),
                properties: o.properties,
                id: o.id,
            })
            .collect(),
    }
}

fn summarize_batch(results: Vec<BatchObjectResponse>) -> BatchResult {
    let mut summary = BatchResult::default();
    for object in results {
        let errors = object
            .result
            .and_then(|r| r.errors)
            .map(|e| e.error)
            .unwrap_or_default();
        if errors.is_empty() {
            summary.inserted += 1;
        } else {
            summary
                .errors
                .extend(errors.into_iter().map(|e| e.message));
        }
    }
    summary
}

fn parse_aggregate_count(body: &Value, class: &str) -> Result<u64, VectorIndexError> {
    if let Some(errors) = body.get("errors").and_then(Value::as_array)
        && let Some(first) = errors.first()
    {
        let message = first
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown GraphQL error");
        return Err(VectorIndexError::InvalidResponse(message.to_string()));
    }

    body.pointer(&format!("/data/Aggregate/{class}/0/meta/count"))
        .and_then(Value::as_u64)
        .ok_or_else(|| VectorIndexError::InvalidResponse(format!("no count for {class}")))
}
