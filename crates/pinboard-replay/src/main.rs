//! Replays a scripted scene against the Pinboard core and prints the result.

mod scene;

use clap::Parser;
use pinboard_core::{ConfigError, ItemError};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "pinboard-replay")]
#[command(about = "Replay pointer gestures from a JSON scene against a Pinboard board", long_about = None)]
struct Args {
    /// Scene file (use "-" for stdin)
    #[arg(value_name = "SCENE")]
    scene: PathBuf,

    /// Write the report here instead of stdout
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Include every host notification in the report
    #[arg(long)]
    events: bool,
}

/// Replay errors.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid scene JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid items: {0}")]
    Item(#[from] ItemError),
}

fn read_scene(path: &Path) -> Result<String, ReplayError> {
    let read_error = |source| ReplayError::Read {
        path: path.to_path_buf(),
        source,
    };
    if path.as_os_str() == "-" {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input).map_err(read_error)?;
        Ok(input)
    } else {
        std::fs::read_to_string(path).map_err(read_error)
    }
}

fn run(args: &Args) -> Result<(), ReplayError> {
    let scene: scene::Scene = serde_json::from_str(&read_scene(&args.scene)?)?;
    log::info!(
        "Loaded scene with {} items and {} steps",
        scene.items.len(),
        scene.steps.len()
    );

    let report = scene::replay(scene, args.events)?;
    let json = serde_json::to_string_pretty(&report)?;

    match &args.output {
        Some(path) => std::fs::write(path, json).map_err(|source| ReplayError::Write {
            path: path.clone(),
            source,
        })?,
        None => println!("{json}"),
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Replay failed: {}", e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
