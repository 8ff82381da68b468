//! Config command - manage configuration.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use docuparse_core::DocuparseConfig;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Initialize a new configuration file
    Init(InitArgs),

    /// Show configuration file path
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Output path for configuration file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(),
        ConfigCommand::Init(init_args) => init_config(init_args),
        ConfigCommand::Path => show_path(),
    }
}

pub(crate) fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docuparse")
        .join("config.json")
}

fn show_config() -> anyhow::Result<()> {
    let config_path = default_config_path();

    let config = if config_path.exists() {
        DocuparseConfig::from_file(&config_path)?
    } else {
        println!(
            "{} No config file found, showing defaults.",
            style("ℹ").blue()
        );
        DocuparseConfig::default()
    };

    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn init_config(args: InitArgs) -> anyhow::Result<()> {
    let output = args.output.unwrap_or_else(default_config_path);

    if output.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {} (use --force to overwrite)",
            output.display()
        );
    }

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }

    DocuparseConfig::default().save(&output)?;
    println!(
        "{} Wrote default configuration to {}",
        style("✓").green(),
        output.display()
    );
    println!(
        "  Secrets are read from the environment: ANTHROPIC_API_KEY, PAPERLESS_URL, PAPERLESS_API_TOKEN"
    );
    Ok(())
}

fn show_path() -> anyhow::Result<()> {
    println!("{}", default_config_path().display());
    Ok(())
}
