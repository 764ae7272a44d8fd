//! Command-line viewer for annotated datasets.
//!
//! # Responsibility
//! - Load a dataset JSON file and print its annotation projection.
//! - Optionally print the normalized attributes back as JSON.

use annotree_core::{default_log_level, init_logging, AnnotationTree, Dataset, DEFAULT_ATTRS_KEY};
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "annotree")]
#[command(about = "Show the annotation tree of a dataset JSON file", version)]
struct Cli {
    /// Dataset JSON file (an object of attributes)
    path: PathBuf,

    /// Attribute holding the annotation list
    #[arg(short, long, default_value = DEFAULT_ATTRS_KEY)]
    key: String,

    /// Log level: trace, debug, info, warn, error
    #[arg(long)]
    log_level: Option<String>,

    /// Absolute directory for rotated log files; logging is off without it
    #[arg(long)]
    log_dir: Option<String>,

    /// Print normalized attributes as JSON instead of the tree
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).map_err(anyhow::Error::msg)?;
    }

    let text = std::fs::read_to_string(&cli.path)
        .with_context(|| format!("failed to read `{}`", cli.path.display()))?;
    let name = cli
        .path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());
    let dataset = Dataset::from_json_str(name, &text)
        .with_context(|| format!("failed to decode `{}`", cli.path.display()))?;

    let mut projection = AnnotationTree::new();
    let root = projection
        .build(dataset, &cli.key)
        .with_context(|| format!("failed to project attribute `{}`", cli.key))?;
    info!(
        "event=cli_show module=cli status=ok format={}",
        if cli.json { "json" } else { "tree" }
    );

    if cli.json {
        let encoded = match projection.container(root) {
            Some(dataset) => dataset.to_json()?,
            None => serde_json::Value::Null,
        };
        println!("{}", serde_json::to_string_pretty(&encoded)?);
    } else {
        println!("{}", projection.text_repr(root));
    }
    Ok(())
}
