//! Read the postings CSV and bulk-insert it in fixed-size chunks.

use serde::Serialize;
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use super::vector_index::{Collection, InsertObject};
use crate::error::{AcquisitionError, InsertionError};
use crate::models::{IngestConfig, JobPosting};

/// Read postings from a CSV file, keeping only the indexed columns.
pub fn read_postings(path: &Path, max_rows: Option<usize>) -> Result<Vec<JobPosting>, AcquisitionError> {
    let file = std::fs::File::open(path)?;
    let postings = read_postings_from(file, max_rows)?;
    debug!(path = %path.display(), rows = postings.len(), "read postings");
    Ok(postings)
}

pub fn read_postings_from<R: Read>(
    reader: R,
    max_rows: Option<usize>,
) -> Result<Vec<JobPosting>, AcquisitionError> {
    let mut csv = csv::Reader::from_reader(reader);
    let rows = csv.deserialize::<JobPosting>();

    let postings = match max_rows {
        Some(limit) => rows.take(limit).collect::<Result<Vec<_>, _>>()?,
        None => rows.collect::<Result<Vec<_>, _>>()?,
    };
    Ok(postings)
}

/// Totals for one load run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub records: usize,
    pub batches: usize,
    pub inserted: usize,
}

/// Submits records to a collection one chunk per bulk insert, in source order.
#[derive(Debug, Clone)]
pub struct BatchLoader {
    chunk_size: usize,
    dedup: bool,
}

impl BatchLoader {
    pub fn new(chunk_size: usize, dedup: bool) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            dedup,
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.chunk_size, config.dedup)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of insert calls `records` will take.
    pub fn batch_count(&self, records: usize) -> usize {
        records.div_ceil(self.chunk_size)
    }

    /// Insert every record. Stops at the first failed chunk; chunks already
    /// sent stay in the collection.
    pub async fn load<F>(
        &self,
        collection: &Collection<'_>,
        records: &[JobPosting],
        mut on_batch: F,
    ) -> Result<LoadReport, InsertionError>
    where
        F: FnMut(usize, usize),
    {
        let mut report = LoadReport {
            records: records.len(),
            ..Default::default()
        };

        for (batch, chunk) in records.chunks(self.chunk_size).enumerate() {
            info!(batch, rows = chunk.len(), "inserting batch");

            let objects = chunk
                .iter()
                .map(|record| self.to_object(record))
                .collect::<Result<Vec<_>, _>>()?;
            let total = objects.len();

            let result = collection
                .insert_many(objects)
                .await
                .map_err(|source| InsertionError::Request { batch, source })?;

            if let Some(message) = result.errors.first() {
                return Err(InsertionError::Rejected {
                    batch,
                    failed: result.errors.len(),
                    total,
                    message: message.clone(),
                });
            }

            report.batches += 1;
            report.inserted += result.inserted;
            on_batch(batch, chunk.len());
        }

        Ok(report)
    }

    fn to_object(&self, record: &JobPosting) -> Result<InsertObject, InsertionError> {
        let value = serde_json::to_value(record).map_err(|source| InsertionError::Serialize {
            job_id: record.job_id.clone(),
            source,
        })?;

        Ok(InsertObject {
            id: self.dedup.then(|| record.object_id()),
            properties: into_properties(&record.job_id, value)?,
        })
    }
}

/// Object properties of a serialized record. Anything but a JSON object is rejected.
fn into_properties(job_id: &str, value: Value) -> Result<Map<String, Value>, InsertionError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(InsertionError::Serialize {
            job_id: job_id.to_string(),
            source: <serde_json::Error as serde::ser::Error>::custom(format!(
                "expected an object, got {other}"
            )),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::vector_index::memory::{Fault, MemoryIndex};
    use crate::services::vector_index::VectorIndex;
    use crate::models::{CollectionConfig, CollectionSchema};
    use serde_json::json;

    fn postings(n: usize) -> Vec<JobPosting> {
        (0..n)
            .map(|i| JobPosting::new(i.to_string()).with_title(format!("Job {i}")))
            .collect()
    }

    async fn index_with_collection(index: MemoryIndex) -> MemoryIndex {
        let schema = CollectionSchema::from_config(&CollectionConfig::default());
        index.create_collection(&schema).await.unwrap();
        index
    }

    #[tokio::test]
    async fn test_load_2500_in_chunks_of_1000() {
        let index = index_with_collection(MemoryIndex::new(2)).await;
        let collection = Collection::new(&index, "linkedin_jobs");
        let loader = BatchLoader::new(1000, false);
        let records = postings(2500);

        let mut seen = Vec::new();
        let report = loader
            .load(&collection, &records, |batch, rows| seen.push((batch, rows)))
            .await
            .unwrap();

        assert_eq!(index.insert_call_sizes(), vec![1000, 1000, 500]);
        assert_eq!(seen, vec![(0, 1000), (1, 1000), (2, 500)]);
        assert_eq!(report.batches, 3);
        assert_eq!(report.inserted, 2500);
        assert_eq!(loader.batch_count(2500), 3);

        let expected: Vec<String> = (0..2500).map(|i| i.to_string()).collect();
        assert_eq!(index.inserted_job_ids(), expected);
    }

    #[tokio::test]
    async fn test_load_chunk_counts() {
        for (n, chunk, calls) in [(0usize, 10usize, 0usize), (1, 10, 1), (10, 10, 1), (11, 10, 2), (95, 7, 14)] {
            let index = index_with_collection(MemoryIndex::new(2)).await;
            let collection = Collection::new(&index, "linkedin_jobs");
            let loader = BatchLoader::new(chunk, false);
            let report = loader.load(&collection, &postings(n), |_, _| {}).await.unwrap();

            let sizes = index.insert_call_sizes();
            assert_eq!(sizes.len(), calls, "n={n} chunk={chunk}");
            assert!(sizes.iter().all(|s| *s <= chunk));
            assert_eq!(sizes.iter().sum::<usize>(), n);
            assert_eq!(report.records, n);
        }
    }

    #[tokio::test]
    async fn test_load_aborts_on_failed_insert() {
        let index =
            index_with_collection(MemoryIndex::new(2).with_fault(Fault::InsertCall(1))).await;
        let collection = Collection::new(&index, "linkedin_jobs");
        let loader = BatchLoader::new(1000, false);

        let err = loader
            .load(&collection, &postings(2500), |_, _| {})
            .await
            .unwrap_err();
        assert!(matches!(err, InsertionError::Request { batch: 1, .. }));
        // first chunk is not rolled back, third never sent
        assert_eq!(index.object_count("linkedin_jobs"), 1000);
        assert_eq!(index.insert_call_sizes().len(), 2);
    }

    #[tokio::test]
    async fn test_load_aborts_on_rejected_objects() {
        let index =
            index_with_collection(MemoryIndex::new(2).with_fault(Fault::RejectObject(0))).await;
        let collection = Collection::new(&index, "linkedin_jobs");
        let loader = BatchLoader::new(10, false);

        let err = loader
            .load(&collection, &postings(25), |_, _| {})
            .await
            .unwrap_err();
        match err {
            InsertionError::Rejected {
                batch,
                failed,
                total,
                ..
            } => {
                assert_eq!(batch, 0);
                assert_eq!(failed, 1);
                assert_eq!(total, 10);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(index.insert_call_sizes().len(), 1);
    }

    #[tokio::test]
    async fn test_reload_duplicates_without_dedup() {
        let index = index_with_collection(MemoryIndex::new(2)).await;
        let collection = Collection::new(&index, "linkedin_jobs");
        let loader = BatchLoader::new(4, false);
        let records = postings(10);

        loader.load(&collection, &records, |_, _| {}).await.unwrap();
        loader.load(&collection, &records, |_, _| {}).await.unwrap();
        assert_eq!(index.object_count("linkedin_jobs"), 20);
    }

    #[tokio::test]
    async fn test_reload_with_dedup_overwrites() {
        let index = index_with_collection(MemoryIndex::new(2)).await;
        let collection = Collection::new(&index, "linkedin_jobs");
        let loader = BatchLoader::new(4, true);
        let records = postings(10);

        loader.load(&collection, &records, |_, _| {}).await.unwrap();
        loader.load(&collection, &records, |_, _| {}).await.unwrap();
        assert_eq!(index.object_count("linkedin_jobs"), 10);
    }

    #[test]
    fn test_read_postings_projects_columns() {
        let csv = "job_id,company_name,title,description,max_salary,location,views\n\
                   921716,Corcoran Sawyer Smith,Marketing Coordinator,\"Job descriptionA leading\nreal estate firm\",20.0,\"Princeton, NJ\",20\n\
                   1829192,,Mental Health Therapist,At Aspen,50.0,\"Fort Collins, CO\",1\n";
        let postings = read_postings_from(csv.as_bytes(), None).unwrap();

        assert_eq!(postings.len(), 2);
        assert_eq!(postings[0].job_id, "921716");
        assert_eq!(postings[0].location.as_deref(), Some("Princeton, NJ"));
        assert!(postings[0].description.as_deref().unwrap().contains('\n'));
        assert_eq!(postings[1].company_name, None);
        assert_eq!(postings[1].title.as_deref(), Some("Mental Health Therapist"));
    }

    #[test]
    fn test_read_postings_max_rows() {
        let mut csv = String::from("job_id,title\n");
        for i in 0..50 {
            csv.push_str(&format!("{i},Title {i}\n"));
        }
        let postings = read_postings_from(csv.as_bytes(), Some(20)).unwrap();
        assert_eq!(postings.len(), 20);
        assert_eq!(postings[19].job_id, "19");
    }

    #[test]
    fn test_read_postings_requires_job_id() {
        let csv = "title,location\nEngineer,Remote\n";
        let err = read_postings_from(csv.as_bytes(), None).unwrap_err();
        assert!(matches!(err, AcquisitionError::CsvError(_)));
    }

    #[test]
    fn test_read_postings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("postings.csv");
        std::fs::write(&path, "job_id,title\n1,A\n2,B\n").unwrap();
        let postings = read_postings(&path, None).unwrap();
        assert_eq!(postings.len(), 2);
    }

    #[test]
    fn test_into_properties_rejects_non_object() {
        let err = into_properties("42", json!("just a string")).unwrap_err();
        match err {
            InsertionError::Serialize { job_id, source } => {
                assert_eq!(job_id, "42");
                assert!(source.to_string().contains("expected an object"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let map = into_properties("42", json!({"job_id": "42"})).unwrap();
        assert_eq!(map["job_id"], "42");
    }
}
