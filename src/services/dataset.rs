//! Fetch the job postings dataset into local storage.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::AcquisitionError;

const KAGGLE_API_BASE: &str = "https://www.kaggle.com/api/v1";

/// Where a dataset archive comes from.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Fetch `source_id` and materialize its files under `dest_dir`.
    async fn download(&self, source_id: &str, dest_dir: &Path) -> Result<(), AcquisitionError>;
}

/// Whether the acquirer had to fetch anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    AlreadyPresent,
    Downloaded,
}

/// Make sure `target` exists, downloading `source_id` into `dest_dir` if not.
pub async fn ensure_dataset(
    source: &dyn DatasetSource,
    source_id: &str,
    dest_dir: &Path,
    target: &Path,
) -> Result<Acquisition, AcquisitionError> {
    if target.is_file() {
        debug!(path = %target.display(), "dataset already present");
        return Ok(Acquisition::AlreadyPresent);
    }

    info!(source = source_id, dest = %dest_dir.display(), "downloading dataset");
    source.download(source_id, dest_dir).await?;

    if !target.is_file() {
        return Err(AcquisitionError::MissingFile(target.display().to_string()));
    }
    Ok(Acquisition::Downloaded)
}

/// `owner/slug` reference to a Kaggle dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRef {
    pub owner: String,
    pub slug: String,
}

impl FromStr for DatasetRef {
    type Err = AcquisitionError;

    /// Accepts `owner/slug`, `kaggle.com/owner/slug` and
    /// `https://www.kaggle.com/datasets/owner/slug`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_start_matches("www.")
            .trim_start_matches("kaggle.com/")
            .trim_start_matches("datasets/");

        let mut parts = trimmed.split('/').filter(|p| !p.is_empty());
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(slug), None) => Ok(Self {
                owner: owner.to_string(),
                slug: slug.to_string(),
            }),
            _ => Err(AcquisitionError::InvalidSource(s.to_string())),
        }
    }
}

#[derive(Clone, Deserialize)]
struct KaggleCredentials {
    username: String,
    key: String,
}

/// Downloads dataset archives from the Kaggle API.
///
/// Credentials come from `KAGGLE_USERNAME`/`KAGGLE_KEY`, or a `kaggle.json`
/// in the working directory or `~/.kaggle/`. Without them the request is
/// sent anonymously and the server decides.
pub struct KaggleSource {
    client: Client,
    api_base: String,
    credentials: Option<KaggleCredentials>,
}

impl KaggleSource {
    pub fn new(timeout_secs: u64) -> Result<Self, AcquisitionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_base: KAGGLE_API_BASE.to_string(),
            credentials: discover_credentials(),
        })
    }

    fn download_url(&self, dataset: &DatasetRef) -> String {
        format!(
            "{}/datasets/download/{}/{}",
            self.api_base, dataset.owner, dataset.slug
        )
    }
}

#[async_trait]
impl DatasetSource for KaggleSource {
    async fn download(&self, source_id: &str, dest_dir: &Path) -> Result<(), AcquisitionError> {
        let dataset: DatasetRef = source_id.parse()?;
        let url = self.download_url(&dataset);

        let mut request = self.client.get(&url);
        if let Some(ref creds) = self.credentials {
            request = request.basic_auth(&creds.username, Some(&creds.key));
        }
        let mut response = request.send().await?;
        if !response.status().is_success() {
            return Err(AcquisitionError::HttpStatus {
                status: response.status().as_u16(),
                url,
            });
        }

        tokio::fs::create_dir_all(dest_dir).await?;
        let archive = dest_dir.join(format!("{}.zip.part", dataset.slug));
        let written = match save_body(&mut response, &archive).await {
            Ok(written) => written,
            Err(e) => {
                discard_archive(&archive).await;
                return Err(e);
            }
        };
        debug!(bytes = written, archive = %archive.display(), "archive downloaded");

        unpack_archive(&archive, &dest_dir.join(&dataset.slug)).await?;
        info!(dataset = %dataset.slug, bytes = written, "dataset extracted");
        Ok(())
    }
}

async fn save_body(response: &mut reqwest::Response, path: &Path) -> Result<u64, AcquisitionError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

/// Extract `archive` into `target` off the async runtime. The archive is
/// removed whether or not extraction succeeds.
async fn unpack_archive(archive: &Path, target: &Path) -> Result<(), AcquisitionError> {
    let (archive_path, target) = (archive.to_path_buf(), target.to_path_buf());
    let result = tokio::task::spawn_blocking(move || extract_archive(&archive_path, &target))
        .await
        .map_err(|e| AcquisitionError::IoError(std::io::Error::other(e)))
        .and_then(|extracted| extracted);

    discard_archive(archive).await;
    result
}

async fn discard_archive(archive: &Path) {
    if let Err(e) = tokio::fs::remove_file(archive).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(archive = %archive.display(), error = %e, "failed to remove partial archive");
    }
}

/// Unpack a zip archive into `dest`.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<(), AcquisitionError> {
    let file = std::fs::File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)?;
    std::fs::create_dir_all(dest)?;
    zip.extract(dest)?;
    Ok(())
}

fn discover_credentials() -> Option<KaggleCredentials> {
    if let (Ok(username), Ok(key)) = (
        std::env::var("KAGGLE_USERNAME"),
        std::env::var("KAGGLE_KEY"),
    ) && !username.is_empty()
        && !key.is_empty()
    {
        return Some(KaggleCredentials { username, key });
    }

    let mut candidates = vec![PathBuf::from("kaggle.json")];
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".kaggle").join("kaggle.json"));
    }
    candidates
        .iter()
        .find_map(|path| read_kaggle_json(path).ok())
}

fn read_kaggle_json(path: &Path) -> Result<KaggleCredentials, AcquisitionError> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| AcquisitionError::InvalidSource(format!("{}: {e}", path.display())))
}
