// Snapshot loaders for the three upstream feeds.
//
// Each feed arrives as a CSV export: league season totals, the fantasy
// platform's player list, and its draft analysis. Every numeric field is
// read as text and coerced here, once, so the core only ever sees typed
// rows: unparseable numbers become `None` (or 0 for GP/MIN) instead of
// failing the run.

use crate::config::DataPaths;
use ironmen_core::pipeline::PipelineInputs;
use ironmen_core::roster::{DraftAnalysis, RosterRecord};
use ironmen_core::season::{CountingStats, SeasonStatRow};
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

/// League season-totals row. Columns missing from the export deserialize to
/// `None`; extra columns are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
#[allow(non_snake_case)]
struct RawSeasonTotals {
    SEASON_ID: Option<String>,
    PLAYER_ID: Option<String>,
    PLAYER_NAME: Option<String>,
    TEAM_ABBREVIATION: Option<String>,
    GP: Option<String>,
    MIN: Option<String>,
    PTS: Option<String>,
    REB: Option<String>,
    AST: Option<String>,
    STL: Option<String>,
    BLK: Option<String>,
    TOV: Option<String>,
    FG_PCT: Option<String>,
    FT_PCT: Option<String>,
    FG3M: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRosterPlayer {
    player_key: Option<String>,
    #[serde(alias = "name")]
    name_full: Option<String>,
    #[serde(alias = "editorial_team_abbr")]
    team: Option<String>,
    #[serde(alias = "display_position")]
    pos: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDraftAnalysis {
    player_key: Option<String>,
    #[serde(alias = "preseason_average_pick")]
    pre_avg_pick: Option<String>,
    #[serde(alias = "average_pick")]
    avg_pick: Option<String>,
}

// ---------------------------------------------------------------------------
// Field coercion
// ---------------------------------------------------------------------------

/// Trimmed, non-empty text or `None`.
fn text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a numeric field. Blank, non-numeric, and non-finite values become
/// `None`; the upstream feeds use "-" and "" for "no data".
fn number(column: &str, value: Option<&str>) -> Option<f64> {
    let raw = value?.trim();
    if raw.is_empty() || raw == "-" {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            debug!("coercing non-numeric {} value '{}' to null", column, raw);
            None
        }
    }
}

/// Games played: rounded, negatives and garbage coerced to 0.
fn games(value: Option<&str>) -> u32 {
    number("GP", value).map_or(0, |v| v.round().max(0.0) as u32)
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, enable testing without temp files)
// ---------------------------------------------------------------------------

/// Read season totals, keeping only rows whose season is in `seasons`
/// (every row when `seasons` is empty).
fn load_season_totals_from_reader<R: Read>(
    rdr: R,
    seasons: &[String],
) -> Result<Vec<SeasonStatRow>, csv::Error> {
    let wanted: HashSet<&str> = seasons.iter().map(String::as_str).collect();
    let mut reader = csv::Reader::from_reader(rdr);
    let mut rows = Vec::new();
    let mut out_of_range = 0usize;

    for result in reader.deserialize::<RawSeasonTotals>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed season row: {}", e);
                continue;
            }
        };
        let (Some(player_id), Some(season_id)) = (text(raw.PLAYER_ID), text(raw.SEASON_ID)) else {
            warn!("skipping season row without PLAYER_ID or SEASON_ID");
            continue;
        };
        if !wanted.is_empty() && !wanted.contains(season_id.as_str()) {
            out_of_range += 1;
            continue;
        }

        rows.push(SeasonStatRow {
            player_id,
            player_name: text(raw.PLAYER_NAME).unwrap_or_default(),
            team: text(raw.TEAM_ABBREVIATION),
            season_id,
            gp: games(raw.GP.as_deref()),
            minutes: number("MIN", raw.MIN.as_deref()).unwrap_or(0.0).max(0.0),
            totals: CountingStats {
                pts: number("PTS", raw.PTS.as_deref()),
                reb: number("REB", raw.REB.as_deref()),
                ast: number("AST", raw.AST.as_deref()),
                stl: number("STL", raw.STL.as_deref()),
                blk: number("BLK", raw.BLK.as_deref()),
                fg3m: number("FG3M", raw.FG3M.as_deref()),
                tov: number("TOV", raw.TOV.as_deref()),
            },
            fg_pct: number("FG_PCT", raw.FG_PCT.as_deref()),
            ft_pct: number("FT_PCT", raw.FT_PCT.as_deref()),
        });
    }

    if out_of_range > 0 {
        debug!("ignored {} season rows outside the configured seasons", out_of_range);
    }
    Ok(rows)
}

fn load_roster_from_reader<R: Read>(rdr: R) -> Result<Vec<RosterRecord>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut records = Vec::new();
    for result in reader.deserialize::<RawRosterPlayer>() {
        match result {
            Ok(raw) => {
                let Some(player_key) = text(raw.player_key) else {
                    warn!("skipping roster row without player_key");
                    continue;
                };
                records.push(RosterRecord {
                    player_key,
                    name: text(raw.name_full).unwrap_or_default(),
                    team: text(raw.team).unwrap_or_default(),
                    position: text(raw.pos).unwrap_or_default(),
                });
            }
            Err(e) => {
                warn!("skipping malformed roster row: {}", e);
            }
        }
    }
    Ok(records)
}

fn load_draft_analysis_from_reader<R: Read>(rdr: R) -> Result<Vec<DraftAnalysis>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut analyses = Vec::new();
    for result in reader.deserialize::<RawDraftAnalysis>() {
        match result {
            Ok(raw) => {
                let Some(player_key) = text(raw.player_key) else {
                    warn!("skipping draft-analysis row without player_key");
                    continue;
                };
                analyses.push(DraftAnalysis {
                    player_key,
                    preseason_pick: number("pre_avg_pick", raw.pre_avg_pick.as_deref()),
                    overall_pick: number("avg_pick", raw.avg_pick.as_deref()),
                });
            }
            Err(e) => {
                warn!("skipping malformed draft-analysis row: {}", e);
            }
        }
    }
    Ok(analyses)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

fn open(path: &Path) -> Result<std::fs::File, SourceError> {
    std::fs::File::open(path).map_err(|e| SourceError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

fn csv_error(path: &Path) -> impl FnOnce(csv::Error) -> SourceError + '_ {
    move |e| SourceError::Csv {
        path: path.display().to_string(),
        source: e,
    }
}

/// Load league season totals, restricted to `seasons` when non-empty.
pub fn load_season_totals(path: &Path, seasons: &[String]) -> Result<Vec<SeasonStatRow>, SourceError> {
    load_season_totals_from_reader(open(path)?, seasons).map_err(csv_error(path))
}

/// Load the fantasy platform's player list.
pub fn load_roster(path: &Path) -> Result<Vec<RosterRecord>, SourceError> {
    load_roster_from_reader(open(path)?).map_err(csv_error(path))
}

/// Load draft analysis (preseason and overall average pick per player key).
pub fn load_draft_analysis(path: &Path) -> Result<Vec<DraftAnalysis>, SourceError> {
    load_draft_analysis_from_reader(open(path)?).map_err(csv_error(path))
}

/// Load every configured feed. A missing `draft_analysis` path means no ADP.
pub fn load_all_from_paths(paths: &DataPaths, seasons: &[String]) -> Result<PipelineInputs, SourceError> {
    let season_rows = load_season_totals(Path::new(&paths.season_stats), seasons)?;
    let roster = load_roster(Path::new(&paths.roster))?;
    let draft = match &paths.draft_analysis {
        Some(path) => load_draft_analysis(Path::new(path))?,
        None => Vec::new(),
    };

    if season_rows.is_empty() {
        warn!("season totals produced zero rows for seasons {:?}", seasons);
    }
    if roster.is_empty() {
        warn!("roster produced zero rows");
    }
    info!(
        "loaded {} season rows, {} roster rows, {} draft-analysis rows",
        season_rows.len(),
        roster.len(),
        draft.len()
    );

    Ok(PipelineInputs {
        season_rows,
        roster,
        draft,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
