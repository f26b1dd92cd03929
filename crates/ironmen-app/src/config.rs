// Configuration loading and validation (config/pipeline.toml).

use chrono::{Datelike, Local, NaiveDate};
use ironmen_core::config::ModelConfig;
use ironmen_core::season::{recent_seasons, season_id_for};
use serde::Deserialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the pipeline configuration inside `config/` and `defaults/`.
pub const PIPELINE_FILE: &str = "pipeline.toml";

/// Regular seasons tip off in October; earlier months belong to the
/// season that started the previous calendar year.
const SEASON_START_MONTH: u32 = 10;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error(transparent)]
    Model(#[from] ironmen_core::config::ConfigError),

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Assembled config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    /// Season ids to pull, most recent first.
    pub seasons: Vec<String>,
    pub data_paths: DataPaths,
    pub output: OutputConfig,
    pub model: ModelConfig,
}

// ---------------------------------------------------------------------------
// pipeline.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct PipelineFile {
    seasons: SeasonsSection,
    data_paths: DataPaths,
    output: OutputConfig,
    #[serde(default)]
    model: ModelConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct SeasonsSection {
    /// Latest season id, e.g. "2024-25". Omitted means the current season.
    #[serde(default)]
    latest: Option<String>,
    count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub season_stats: String,
    pub roster: String,
    /// Draft analysis is optional; without it every ADP is absent.
    #[serde(default)]
    pub draft_analysis: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/pipeline.toml` relative to `base_dir`.
///
/// Does not copy defaults; see [`load_config`].
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(PIPELINE_FILE);
    let text = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
        path: path.clone(),
    })?;
    let file: PipelineFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;
    assemble(file, Local::now().date_naive())
}

/// Resolve the season list and validate the parsed file.
fn assemble(file: PipelineFile, today: NaiveDate) -> Result<Config, ConfigError> {
    if file.seasons.count == 0 {
        return Err(ConfigError::ValidationError {
            field: "seasons.count".into(),
            message: "must be greater than 0".into(),
        });
    }

    let latest = file
        .seasons
        .latest
        .unwrap_or_else(|| current_season(today));
    let seasons =
        recent_seasons(&latest, file.seasons.count).ok_or_else(|| ConfigError::ValidationError {
            field: "seasons.latest".into(),
            message: format!("expected a season id like \"2024-25\", got \"{latest}\""),
        })?;

    let required: &[(&str, &str)] = &[
        ("data_paths.season_stats", file.data_paths.season_stats.as_str()),
        ("data_paths.roster", file.data_paths.roster.as_str()),
        ("output.path", file.output.path.as_str()),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: field.to_string(),
                message: "must not be empty".into(),
            });
        }
    }

    file.model.validate()?;

    Ok(Config {
        seasons,
        data_paths: file.data_paths,
        output: file.output,
        model: file.model,
    })
}

/// Season id in progress (or most recently finished) on `today`.
pub fn current_season(today: NaiveDate) -> String {
    let start_year = if today.month() >= SEASON_START_MONTH {
        today.year()
    } else {
        today.year() - 1
    };
    season_id_for(start_year)
}

/// Copy any file in `defaults/` that is missing from `config/`. Returns the
/// paths that were written. Existing config files are never overwritten.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ found in {}",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    let copy_err = |message: String| ConfigError::DefaultsCopyError { message };

    std::fs::create_dir_all(&config_dir)
        .map_err(|e| copy_err(format!("failed to create config directory: {e}")))?;
    let entries = std::fs::read_dir(&defaults_dir)
        .map_err(|e| copy_err(format!("failed to read defaults directory: {e}")))?;

    let mut copied = Vec::new();
    for entry in entries {
        let source = entry
            .map_err(|e| copy_err(format!("failed to read defaults entry: {e}")))?
            .path();
        let Some(file_name) = source.file_name().filter(|_| source.is_file()) else {
            continue;
        };
        let target = config_dir.join(file_name);

        // An existing target, even one created after the listing, is left as is.
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&source)
                    .map_err(|e| copy_err(format!("failed to read {}: {e}", source.display())))?;
                dest.write_all(&content)
                    .map_err(|e| copy_err(format!("failed to write {}: {e}", target.display())))?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(copy_err(format!(
                    "failed to create {}: {e}",
                    target.display()
                )));
            }
        }
    }
    Ok(copied)
}

/// Load config relative to the current working directory, copying defaults
/// first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
