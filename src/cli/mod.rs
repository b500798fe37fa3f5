//! CLI module for the job index pipeline.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::OutputFormat;

/// Load job postings into a hosted vector index and export their embeddings.
#[derive(Debug, Parser)]
#[command(name = "jobindex")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        default_value = "text",
        help = "Output format: text or json"
    )]
    pub format: OutputFormat,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, short = 'c', global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Provision the collection, fetch the dataset, and load it
    Ingest(commands::IngestArgs),

    /// Write (job_id, embedding) pairs to Parquet part-files
    Export(commands::ExportArgs),

    /// Iterate the collection and report what it holds
    Verify,

    /// Check service readiness and collection state
    Status,

    /// Manage the job collection
    #[command(subcommand)]
    Collection(commands::CollectionCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}
