use serde::Serialize;

use super::config::CollectionConfig;
use super::job::JOB_COLUMNS;

/// Schema the index is asked to create.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionSchema {
    pub name: String,
    pub vectorizer: String,
    pub embedding_model: String,
    pub generative: bool,
    pub properties: Vec<String>,
}

impl CollectionSchema {
    pub fn from_config(config: &CollectionConfig) -> Self {
        Self {
            name: config.name.clone(),
            vectorizer: config.vectorizer.clone(),
            embedding_model: config.embedding_model.clone(),
            generative: config.generative,
            properties: JOB_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
        }
    }
}

/// What the index reports about an existing collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionInfo {
    pub name: String,
    pub vectorizer: Option<String>,
}

/// How a provisioning call found the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionStatus {
    Created,
    AlreadyExists,
}

impl std::fmt::Display for ProvisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProvisionStatus::Created => write!(f, "created"),
            ProvisionStatus::AlreadyExists => write!(f, "already exists"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_from_default_config() {
        let schema = CollectionSchema::from_config(&CollectionConfig::default());
        assert_eq!(schema.name, "linkedin_jobs");
        assert_eq!(schema.embedding_model, "text-embedding-3-small");
        assert!(schema.generative);
        assert_eq!(schema.properties.len(), 5);
        assert!(schema.properties.iter().any(|p| p == "job_id"));
    }
}
