mod collection;
mod config;
mod export;
mod ingest;
mod status;
mod verify;

use indicatif::{ProgressBar, ProgressStyle};

use crate::models::OutputFormat;

pub use collection::CollectionCommand;
pub use config::ConfigCommand;
pub use export::ExportArgs;
pub use ingest::IngestArgs;

pub use collection::handle_collection;
pub use config::handle_config;
pub use export::handle_export;
pub use ingest::handle_ingest;
pub use status::handle_status;
pub use verify::handle_verify;

/// Progress bar on stderr, hidden for JSON output so stdout stays parseable.
fn progress_bar(format: OutputFormat) -> ProgressBar {
    if format == OutputFormat::Json {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}
