use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_COLLECTION: &str = "linkedin_jobs";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_VECTORIZER: &str = "text2vec-openai";
pub const DEFAULT_DATASET_SOURCE: &str = "https://www.kaggle.com/arshkon/linkedin-job-postings";
pub const DEFAULT_DATASET_FILE: &str = "data/linkedin-job-postings/postings.csv";
pub const DEFAULT_EXPORT_PREFIX: &str = "data/linkedin-job-embeddings";
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_EXPORT_BATCH_SIZE: usize = 50_000;

pub const ENV_SERVICE_URL: &str = "WEAVIATE_URL";
pub const ENV_SERVICE_API_KEY: &str = "WCD_DEMO_RO_KEY";
pub const ENV_EMBEDDING_API_KEY: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub collection: CollectionConfig,

    #[serde(default)]
    pub dataset: DatasetConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub service: ServiceConfig,
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("jobindex").join("config.toml"))
    }

    /// Load from an explicit path, or the default location if present.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::load_from(path)?,
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::load_from(&path)?,
                _ => Self::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "collection.name must not be empty".to_string(),
            ));
        }
        if self.ingest.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "ingest.chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.export.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "export.batch_size must be greater than 0".to_string(),
            ));
        }
        if self.export.page_size == 0 {
            return Err(ConfigError::ValidationError(
                "export.page_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    #[serde(default = "default_collection")]
    pub name: String,

    #[serde(default = "default_vectorizer")]
    pub vectorizer: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Enable the generative-search module on the collection.
    #[serde(default = "default_true")]
    pub generative: bool,
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_vectorizer() -> String {
    DEFAULT_VECTORIZER.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            name: default_collection(),
            vectorizer: default_vectorizer(),
            embedding_model: default_embedding_model(),
            generative: default_true(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "default_dataset_source")]
    pub source: String,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_dataset_file")]
    pub file: PathBuf,
}

fn default_dataset_source() -> String {
    DEFAULT_DATASET_SOURCE.to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_dataset_file() -> PathBuf {
    PathBuf::from(DEFAULT_DATASET_FILE)
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            source: default_dataset_source(),
            data_dir: default_data_dir(),
            file: default_dataset_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<usize>,

    /// Derive object ids from job_id so re-ingestion overwrites.
    #[serde(default)]
    pub dedup: bool,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_rows: None,
            dedup: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_export_prefix")]
    pub prefix: PathBuf,

    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_export_batch_size() -> usize {
    DEFAULT_EXPORT_BATCH_SIZE
}

fn default_export_prefix() -> PathBuf {
    PathBuf::from(DEFAULT_EXPORT_PREFIX)
}

fn default_page_size() -> u32 {
    100
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            batch_size: default_export_batch_size(),
            prefix: default_export_prefix(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    120
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

/// Secrets required to talk to the hosted index.
///
/// Built by [`Credentials::from_env`] or [`Credentials::from_lookup`], which
/// reject missing or blank values.
#[derive(Clone)]
pub struct Credentials {
    pub service_url: String,
    pub service_api_key: String,
    pub embedding_api_key: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingVar(name))
        };

        Ok(Self {
            service_url: require(ENV_SERVICE_URL)?,
            service_api_key: require(ENV_SERVICE_API_KEY)?,
            embedding_api_key: require(ENV_EMBEDDING_API_KEY)?,
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("service_url", &self.service_url)
            .field("service_api_key", &"***")
            .field("embedding_api_key", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.collection.name, DEFAULT_COLLECTION);
        assert_eq!(config.ingest.chunk_size, 1000);
        assert_eq!(config.export.batch_size, 50_000);
        assert!(config.collection.generative);
        assert!(!config.ingest.dedup);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [export]
            batch_size = 10

            [collection]
            name = "jobs_test"
            "#,
        )
        .unwrap();
        assert_eq!(config.export.batch_size, 10);
        assert_eq!(config.export.page_size, 100);
        assert_eq!(config.collection.name, "jobs_test");
        assert_eq!(config.collection.embedding_model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(config.ingest.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_config_rejects_zero_sizes() {
        let mut config = Config::default();
        config.ingest.chunk_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        let mut config = Config::default();
        config.export.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.ingest.max_rows = Some(100);
        config.save_to(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.ingest.max_rows, Some(100));
        assert_eq!(loaded.dataset.file, PathBuf::from(DEFAULT_DATASET_FILE));
    }

    #[test]
    fn test_credentials_all_present() {
        let vars = env(&[
            (ENV_SERVICE_URL, "https://cluster.example.net"),
            (ENV_SERVICE_API_KEY, "wcd-key"),
            (ENV_EMBEDDING_API_KEY, "sk-test"),
        ]);
        let creds = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(creds.service_url, "https://cluster.example.net");
        assert!(!format!("{creds:?}").contains("sk-test"));
    }

    #[test]
    fn test_credentials_missing_var() {
        let vars = env(&[
            (ENV_SERVICE_URL, "https://cluster.example.net"),
            (ENV_EMBEDDING_API_KEY, "sk-test"),
        ]);
        let err = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ENV_SERVICE_API_KEY)));
    }

    #[test]
    fn test_credentials_empty_var_is_missing() {
        let vars = env(&[
            (ENV_SERVICE_URL, "  "),
            (ENV_SERVICE_API_KEY, "wcd-key"),
            (ENV_EMBEDDING_API_KEY, "sk-test"),
        ]);
        let err = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ENV_SERVICE_URL)));
    }
}
