//! Batch analysis CLI.
//!
//! Reads JSON-lines provider log files (one fight per file), runs the
//! analysis pipeline for the requested actor and job config, and prints
//! the findings. Independent fights share nothing, so files are analyzed
//! in parallel.

mod render;

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use rayon::prelude::*;
use tomestone_core::analysis::{BuffUptime, CooldownDowntime, Deaths};
use tomestone_core::combat_log::ProviderRecord;
use tomestone_core::game_data::{GameData, default_custom_dir, load_game_data};
use tomestone_core::{ModuleRegistry, Normalizer, Pipeline};
use tomestone_types::{JobConfig, Severity};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Combat-log performance analysis")]
struct Cli {
    /// JSON-lines provider log files, one fight per file
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Per-job analysis config (TOML)
    #[arg(short, long)]
    job: PathBuf,

    /// Directory with builtin game-data definition files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Player id to analyze
    #[arg(short, long)]
    actor: i64,

    /// Lowest severity to print: info, warning, error
    #[arg(long, default_value = "info")]
    min_severity: String,
}

fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let min_severity = parse_severity(&cli.min_severity)?;

    let job: JobConfig = toml::from_str(
        &fs::read_to_string(&cli.job).map_err(|e| format!("cannot read {:?}: {e}", cli.job))?,
    )
    .map_err(|e| format!("invalid job config {:?}: {e}", cli.job))?;

    let data = load_game_data(cli.data_dir.as_deref(), default_custom_dir().as_deref())
        .map_err(|e| e.to_string())?;

    let outputs: Vec<Result<String, String>> = cli
        .files
        .par_iter()
        .map(|file| analyze_file(file, &data, &job, cli.actor, min_severity))
        .collect();

    let mut failed = false;
    for (file, output) in cli.files.iter().zip(outputs) {
        match output {
            Ok(text) => {
                println!("== {} ==", file.display());
                print!("{text}");
            }
            Err(e) => {
                failed = true;
                eprintln!("{}: {e}", file.display());
            }
        }
    }

    if failed { Err("one or more files failed".to_string()) } else { Ok(()) }
}

/// One independent analysis run: parse, normalize, dispatch, render.
fn analyze_file(
    path: &Path,
    data: &GameData,
    job: &JobConfig,
    actor: i64,
    min_severity: Severity,
) -> Result<String, String> {
    let contents = fs::read_to_string(path).map_err(|e| e.to_string())?;

    let records = contents.lines().enumerate().filter_map(|(n, line)| {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str::<ProviderRecord>(line) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(file = %path.display(), line = n + 1, error = %e, "skipping unparseable line");
                None
            }
        }
    });

    let timeline = Normalizer::new(data).normalize(records);

    let mut registry = ModuleRegistry::new();
    registry
        .register(Box::new(CooldownDowntime::new(job.cooldowns.clone())))
        .map_err(|e| e.to_string())?;
    registry
        .register(Box::new(BuffUptime::new(job.buffs.clone())))
        .map_err(|e| e.to_string())?;
    registry
        .register(Box::new(Deaths::new()))
        .map_err(|e| e.to_string())?;

    let report = Pipeline::new(data)
        .run(registry, &timeline, actor)
        .map_err(|e| e.to_string())?;

    Ok(render::render_report(&report, min_severity))
}

fn parse_severity(s: &str) -> Result<Severity, String> {
    match s {
        "info" => Ok(Severity::Info),
        "warning" => Ok(Severity::Warning),
        "error" => Ok(Severity::Error),
        other => Err(format!("unknown severity `{other}`")),
    }
}
