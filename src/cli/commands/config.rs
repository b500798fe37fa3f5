use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};

use crate::cli::output::get_formatter;
use crate::models::{
    Config, ENV_EMBEDDING_API_KEY, ENV_SERVICE_API_KEY, ENV_SERVICE_URL, OutputFormat,
};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Write a config file with default values")]
    Init {
        #[arg(long, help = "Force overwrite existing config")]
        force: bool,
    },
    #[command(about = "Show current configuration")]
    Show,
    #[command(about = "Show configuration file path")]
    Path,
}

pub async fn handle_config(
    cmd: ConfigCommand,
    config_path: Option<&Path>,
    format: OutputFormat,
    _verbose: bool,
) -> Result<()> {
    match cmd {
        ConfigCommand::Init { force } => handle_init(config_path, force, format),
        ConfigCommand::Show => handle_show(config_path, format),
        ConfigCommand::Path => handle_path(config_path, format),
    }
}

fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::config_path()
            .ok_or_else(|| anyhow::anyhow!("could not determine config directory")),
    }
}

fn handle_init(explicit: Option<&Path>, force: bool, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let path = resolve_path(explicit)?;

    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    Config::default()
        .save_to(&path)
        .context("failed to write config")?;
    println!(
        "{}",
        formatter.format_message(&format!("Created config at: {}", path.display()))
    );
    Ok(())
}

fn handle_show(explicit: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = Config::load(explicit)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    print!("{}", toml::to_string_pretty(&config)?);
    println!();
    println!("# Credentials (environment)");
    for var in [ENV_SERVICE_URL, ENV_SERVICE_API_KEY, ENV_EMBEDDING_API_KEY] {
        let state = match std::env::var(var) {
            Ok(value) if !value.is_empty() => "set",
            _ => "not set",
        };
        println!("# {var}: {state}");
    }
    Ok(())
}

fn handle_path(explicit: Option<&Path>, format: OutputFormat) -> Result<()> {
    let path = resolve_path(explicit)?;
    let exists = path.exists();

    if format == OutputFormat::Json {
        let output = serde_json::json!({ "path": path, "exists": exists });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let state = if exists { "active" } else { "would be" };
    println!("Config ({state}): {}", path.display());

    if let Ok(cwd) = std::env::current_dir() {
        let env_path = cwd.join(".env");
        if env_path.exists() {
            println!(".env file (active): {}", env_path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_writes_defaults_and_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        handle_config(ConfigCommand::Init { force: false }, Some(&path), OutputFormat::Json, false)
            .await
            .unwrap();
        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.collection.name, "linkedin_jobs");

        let again =
            handle_config(ConfigCommand::Init { force: false }, Some(&path), OutputFormat::Json, false)
                .await;
        assert!(again.is_err());

        handle_config(ConfigCommand::Init { force: true }, Some(&path), OutputFormat::Json, false)
            .await
            .unwrap();
    }

    #[test]
    fn test_resolve_explicit_path() {
        let path = PathBuf::from("custom.toml");
        assert_eq!(resolve_path(Some(&path)).unwrap(), path);
    }
}
