use clap::{CommandFactory, Parser};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Transform raw app-store dumps into catalogs and review metrics
#[derive(Parser, Debug, Clone)]
#[command(
    name = "review-pipeline",
    about = "Transform raw app-store dumps into catalogs and review metrics",
    version
)]
pub struct Settings {
    /// Directory holding `{app_id}_meta.json` and `{app_id}_reviews.jsonl`
    #[arg(long, env = "REVIEW_PIPELINE_RAW_DIR", default_value = "data/raw")]
    pub raw_dir: PathBuf,

    /// Directory receiving the normalized and summary tables
    #[arg(
        long,
        env = "REVIEW_PIPELINE_PROCESSED_DIR",
        default_value = "data/processed"
    )]
    pub processed_dir: PathBuf,

    /// Skip the transform step (requires a previous transform)
    #[arg(long)]
    pub no_transform: bool,

    /// Skip the serving step
    #[arg(long)]
    pub no_serve: bool,

    /// JSON file with default values for the options above
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── ConfigFile ─────────────────────────────────────────────────────────────────

/// Optional JSON config file, e.g.
///
/// ```json
/// { "raw_dir": "dumps/raw", "processed_dir": "dumps/out", "log_level": "DEBUG" }
/// ```
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct ConfigFile {
    #[serde(default)]
    pub raw_dir: Option<PathBuf>,
    #[serde(default)]
    pub processed_dir: Option<PathBuf>,
    #[serde(default)]
    pub log_level: Option<String>,
}

impl ConfigFile {
    /// Load a config file. Unlike last-run state, an explicitly requested
    /// config that is missing or malformed is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| PipelineError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse process arguments and merge the optional config file.
    pub fn load() -> Result<Self> {
        Self::load_from_args(std::env::args_os().collect())
    }

    /// Same as [`Settings::load`] with an explicit argument list.
    ///
    /// Config-file values apply only to options that were not given on the
    /// command line or through the environment.
    pub fn load_from_args(args: Vec<std::ffi::OsString>) -> Result<Self> {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if let Some(path) = settings.config.clone() {
            let file = ConfigFile::load_from(&path)?;
            if !is_arg_explicitly_set(&matches, "raw_dir") {
                if let Some(v) = file.raw_dir {
                    settings.raw_dir = v;
                }
            }
            if !is_arg_explicitly_set(&matches, "processed_dir") {
                if let Some(v) = file.processed_dir {
                    settings.processed_dir = v;
                }
            }
            if !is_arg_explicitly_set(&matches, "log_level") {
                if let Some(v) = file.log_level {
                    settings.log_level = v.to_uppercase();
                }
            }
        }

        // --debug overrides log level.
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        Ok(settings)
    }
}

/// Returns `true` when `name` was supplied on the command line or through its
/// environment variable (anything other than the default).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(clap::parser::ValueSource::CommandLine) | Some(clap::parser::ValueSource::EnvVariable)
    )
}

// ── Tests ──────────────────────────────────────────────────────────────────────
