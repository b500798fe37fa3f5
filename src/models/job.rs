use serde::{Deserialize, Serialize};

/// Columns projected from the source dataset, in payload order.
pub const JOB_COLUMNS: [&str; 5] = ["title", "description", "company_name", "location", "job_id"];

/// One job posting as submitted to the index.
///
/// Deserializing from the source CSV keeps only these columns; any others in
/// the header row are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    pub job_id: String,
}

impl JobPosting {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            title: None,
            description: None,
            company_name: None,
            location: None,
            job_id: job_id.into(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Stable object id for this posting, used when re-ingestion should
    /// overwrite instead of duplicate.
    pub fn object_id(&self) -> uuid::Uuid {
        let name = format!("job:{}", self.job_id);
        uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, name.as_bytes())
    }
}
