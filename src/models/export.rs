use serde::Serialize;
use std::path::{Path, PathBuf};

/// File extension of exported part-files.
pub const PART_FILE_EXTENSION: &str = "parquet";

/// One exported (job_id, embedding) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub job_id: String,
    pub embedding: Vec<f32>,
}

/// A part-file written by the exporter.
#[derive(Debug, Clone, Serialize)]
pub struct PartFile {
    pub part_number: u32,
    pub path: PathBuf,
    pub rows: usize,
}

/// Build the path of part `part_number` from an unchanging prefix.
///
/// `data/embeddings` with part 2 becomes `data/embeddings_2.parquet`.
pub fn part_file_path(prefix: &Path, part_number: u32) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(format!("_{part_number}.{PART_FILE_EXTENSION}"));
    PathBuf::from(name)
}

/// Outcome of a complete export run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportSummary {
    pub parts: Vec<PartFile>,
    pub total_rows: usize,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_file_path() {
        let prefix = Path::new("data/linkedin-job-embeddings");
        assert_eq!(
            part_file_path(prefix, 1),
            PathBuf::from("data/linkedin-job-embeddings_1.parquet")
        );
        assert_eq!(
            part_file_path(prefix, 12),
            PathBuf::from("data/linkedin-job-embeddings_12.parquet")
        );
    }

    #[test]
    fn test_part_file_path_does_not_accumulate() {
        let prefix = PathBuf::from("out/emb");
        let first = part_file_path(&prefix, 1);
        let second = part_file_path(&prefix, 2);
        assert_eq!(second, PathBuf::from("out/emb_2.parquet"));
        assert!(!second.to_string_lossy().contains("_1"));
        assert_ne!(first, second);
    }
}
