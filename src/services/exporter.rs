//! Export computed embeddings to numbered Parquet part-files.

use arrow::array::{ArrayRef, Float32Builder, ListBuilder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use super::vector_index::{Collection, DEFAULT_VECTOR, IndexedItem};
use crate::error::ExportError;
use crate::models::{ExportConfig, ExportRow, ExportSummary, PartFile, part_file_path};

/// Destination for flushed batches of rows.
pub trait PartWriter {
    /// Persist `rows` as part `part_number` and return where it went.
    fn write_part(&mut self, part_number: u32, rows: &[ExportRow]) -> Result<PathBuf, ExportError>;
}

/// Arrow schema of every part-file: `job_id` text, `embedding` float list.
pub fn export_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("job_id", DataType::Utf8, false),
        Field::new(
            "embedding",
            DataType::List(Arc::new(Field::new("item", DataType::Float32, true))),
            false,
        ),
    ]))
}

/// Writes `<prefix>_<part>.parquet` files.
#[derive(Debug, Clone)]
pub struct ParquetPartWriter {
    prefix: PathBuf,
    schema: SchemaRef,
}

impl ParquetPartWriter {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            schema: export_schema(),
        }
    }

    fn record_batch(&self, part: u32, rows: &[ExportRow]) -> Result<RecordBatch, ExportError> {
        let mut ids = StringBuilder::with_capacity(rows.len(), rows.len() * 12);
        let mut embeddings = ListBuilder::new(Float32Builder::new());
        for row in rows {
            ids.append_value(&row.job_id);
            embeddings.values().append_slice(&row.embedding);
            embeddings.append(true);
        }

        let columns: Vec<ArrayRef> = vec![Arc::new(ids.finish()), Arc::new(embeddings.finish())];
        RecordBatch::try_new(self.schema.clone(), columns).map_err(|e| ExportError::Write {
            part,
            message: e.to_string(),
        })
    }
}

impl PartWriter for ParquetPartWriter {
    fn write_part(&mut self, part_number: u32, rows: &[ExportRow]) -> Result<PathBuf, ExportError> {
        let path = part_file_path(&self.prefix, part_number);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let batch = self.record_batch(part_number, rows)?;
        let write_err = |e: parquet::errors::ParquetError| ExportError::Write {
            part: part_number,
            message: e.to_string(),
        };

        let file = std::fs::File::create(&path)?;
        let mut writer = ArrowWriter::try_new(file, self.schema.clone(), None).map_err(write_err)?;
        writer.write(&batch).map_err(write_err)?;
        writer.close().map_err(write_err)?;

        Ok(path)
    }
}

/// Iterates a collection with vectors and rolls rows over into part-files.
///
/// Rows accumulate until `batch_size` is reached, then the batch is written
/// as the next part (numbered from 1) and the accumulator is reset. Whatever
/// remains when iteration ends is written as one final, possibly shorter,
/// part. An empty collection writes nothing.
#[derive(Debug, Clone)]
pub struct VectorExporter {
    batch_size: usize,
    page_size: u32,
    vector_name: String,
}

impl VectorExporter {
    pub fn new(batch_size: usize, page_size: u32) -> Self {
        Self {
            batch_size: batch_size.max(1),
            page_size: page_size.max(1),
            vector_name: DEFAULT_VECTOR.to_string(),
        }
    }

    pub fn from_config(config: &ExportConfig) -> Self {
        Self::new(config.batch_size, config.page_size)
    }

    pub async fn export<W, F>(
        &self,
        collection: &Collection<'_>,
        writer: &mut W,
        mut on_row: F,
    ) -> Result<ExportSummary, ExportError>
    where
        W: PartWriter,
        F: FnMut(usize),
    {
        let start = Instant::now();
        let mut cursor = collection.iterate(true, self.page_size);
        let mut rows: Vec<ExportRow> = Vec::new();
        let mut part_number = 1u32;
        let mut summary = ExportSummary::default();

        while let Some(item) = cursor.next().await? {
            rows.push(self.to_row(item)?);
            summary.total_rows += 1;
            on_row(summary.total_rows);

            if rows.len() == self.batch_size {
                summary.parts.push(flush(writer, part_number, &mut rows)?);
                part_number += 1;
            }
        }

        if !rows.is_empty() {
            summary.parts.push(flush(writer, part_number, &mut rows)?);
        }

        summary.duration_ms = start.elapsed().as_millis() as u64;
        Ok(summary)
    }

    fn to_row(&self, item: IndexedItem) -> Result<ExportRow, ExportError> {
        let job_id = item
            .property_text("job_id")
            .ok_or_else(|| ExportError::MissingJobId {
                id: item.id.clone(),
            })?;

        let mut vectors = item.vectors;
        let embedding = vectors
            .remove(&self.vector_name)
            .ok_or_else(|| ExportError::MissingVector {
                id: item.id,
                vector: self.vector_name.clone(),
            })?;

        Ok(ExportRow { job_id, embedding })
    }
}

fn flush<W: PartWriter>(
    writer: &mut W,
    part_number: u32,
    rows: &mut Vec<ExportRow>,
) -> Result<PartFile, ExportError> {
    let path = writer.write_part(part_number, rows)?;
    let part = PartFile {
        part_number,
        path,
        rows: rows.len(),
    };
    info!(part = part.part_number, rows = part.rows, path = %part.path.display(), "wrote part file");
    rows.clear();
    Ok(part)
}
