use serde::Serialize;
use std::fmt::Write as FmtWrite;

use crate::models::{CollectionSchema, ExportSummary, OutputFormat};
use crate::services::{IngestReport, VerifyReport};

pub trait Formatter {
    fn format_ingest(&self, report: &IngestReport) -> String;
    fn format_export(&self, summary: &ExportSummary) -> String;
    fn format_verify(&self, report: &VerifyReport) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_collection(&self, info: &CollectionReport) -> String;
    fn format_message(&self, message: &str) -> String;
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub endpoint: String,
    pub ready: bool,
    pub collection: String,
    /// `None` when the service could not be asked.
    pub collection_exists: Option<bool>,
    pub objects: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionReport {
    pub schema: CollectionSchema,
    pub exists: bool,
    /// Vectorizer the service reports for the existing collection.
    pub remote_vectorizer: Option<String>,
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_ingest(&self, report: &IngestReport) -> String {
        let mut output = String::new();
        writeln!(output, "Ingest Complete").unwrap();
        writeln!(output, "---------------").unwrap();
        writeln!(
            output,
            "Collection:  {} ({})",
            report.collection, report.provision
        )
        .unwrap();
        let dataset = if report.downloaded {
            "downloaded"
        } else {
            "already present"
        };
        writeln!(output, "Dataset:     {}", dataset).unwrap();
        writeln!(output, "Records:     {}", report.load.records).unwrap();
        writeln!(output, "Batches:     {}", report.load.batches).unwrap();
        writeln!(output, "Inserted:    {}", report.load.inserted).unwrap();
        writeln!(output, "Duration:    {}ms", report.duration_ms).unwrap();
        output
    }

    fn format_export(&self, summary: &ExportSummary) -> String {
        if summary.parts.is_empty() {
            return "Collection is empty, no part-files written.\n".to_string();
        }

        let mut output = String::new();
        writeln!(output, "Export Complete").unwrap();
        writeln!(output, "---------------").unwrap();
        for part in &summary.parts {
            writeln!(
                output,
                "  {:>3}. {} ({} rows)",
                part.part_number,
                part.path.display(),
                part.rows
            )
            .unwrap();
        }
        writeln!(output, "Total rows:  {}", summary.total_rows).unwrap();
        writeln!(output, "Duration:    {}ms", summary.duration_ms).unwrap();
        output
    }

    fn format_verify(&self, report: &VerifyReport) -> String {
        let mut output = String::new();
        writeln!(output, "Collection:  {}", report.collection).unwrap();
        writeln!(output, "Items:       {}", report.items).unwrap();
        match report.vector_dim {
            Some(dim) => writeln!(output, "Vector dim:  {}", dim).unwrap(),
            None => writeln!(output, "Vector dim:  -").unwrap(),
        }
        if !report.property_keys.is_empty() {
            writeln!(output, "Properties:  {}", report.property_keys.join(", ")).unwrap();
        }
        if report.missing_vectors > 0 {
            writeln!(output, "Missing vectors: {}", report.missing_vectors).unwrap();
        }
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();

        let ready = if status.ready { "[READY]" } else { "[NOT READY]" };
        writeln!(output, "Vector Index:  {}", ready).unwrap();
        writeln!(output, "  URL:         {}", status.endpoint).unwrap();

        let exists = match status.collection_exists {
            Some(true) => "exists",
            Some(false) => "missing",
            None => "unknown",
        };
        writeln!(output, "  Collection:  {} ({})", status.collection, exists).unwrap();
        if let Some(objects) = status.objects {
            writeln!(output, "  Objects:     {}", objects).unwrap();
        }
        if let Some(ref error) = status.error {
            writeln!(output, "  Error:       {}", error).unwrap();
        }
        output
    }

    fn format_collection(&self, info: &CollectionReport) -> String {
        let mut output = String::new();
        let state = if info.exists { "exists" } else { "not created" };
        writeln!(output, "Collection:  {} ({})", info.schema.name, state).unwrap();
        writeln!(output, "  Vectorizer:  {}", info.schema.vectorizer).unwrap();
        writeln!(output, "  Model:       {}", info.schema.embedding_model).unwrap();
        writeln!(output, "  Generative:  {}", info.schema.generative).unwrap();
        writeln!(output, "  Properties:  {}", info.schema.properties.join(", ")).unwrap();
        if let Some(ref remote) = info.remote_vectorizer
            && remote != &info.schema.vectorizer
        {
            writeln!(output, "  Remote vectorizer differs: {}", remote).unwrap();
        }
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: Serialize>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|e| serde_json::json!({"error": e.to_string()}).to_string())
    }
}

impl Formatter for JsonFormatter {
    fn format_ingest(&self, report: &IngestReport) -> String {
        self.render(report)
    }

    fn format_export(&self, summary: &ExportSummary) -> String {
        self.render(summary)
    }

    fn format_verify(&self, report: &VerifyReport) -> String {
        self.render(report)
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        self.render(status)
    }

    fn format_collection(&self, info: &CollectionReport) -> String {
        self.render(info)
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}
