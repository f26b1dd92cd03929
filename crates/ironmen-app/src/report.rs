// Ranked-table output: one flat row per player with named columns.

use crate::config::OutputFormat;
use ironmen_core::ranking::RankedPlayer;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Flattened output row. Column names follow the spreadsheet the rankings
/// are usually read in.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub name_full: String,
    #[serde(rename = "IronMan_Rank")]
    pub rank: u32,
    pub team: String,
    pub pos: String,
    #[serde(rename = "ADP")]
    pub adp: Option<f64>,
    #[serde(rename = "IronMan_Score")]
    pub score: f64,
    #[serde(rename = "DurabilityZ")]
    pub durability_z: f64,
    #[serde(rename = "MinutesZ")]
    pub minutes_z: f64,
    #[serde(rename = "ValueZ")]
    pub value_z: f64,
    #[serde(rename = "ValueZ_raw")]
    pub value_z_raw: f64,
    #[serde(rename = "Sample_Strength")]
    pub sample_strength: f64,
    #[serde(rename = "ADPz")]
    pub adp_z: Option<f64>,
    #[serde(rename = "Value_vs_ADP")]
    pub value_vs_adp: f64,
    #[serde(rename = "GP")]
    pub gp: u32,
    #[serde(rename = "MIN")]
    pub minutes: f64,
    #[serde(rename = "MPG")]
    pub mpg: f64,
    #[serde(rename = "Weighted_GP")]
    pub weighted_gp: Option<f64>,
    #[serde(rename = "GP_Median")]
    pub median_gp: Option<f64>,
    #[serde(rename = "GP_Variance")]
    pub variance_gp: Option<f64>,
    #[serde(rename = "Durability_Composite")]
    pub durability_composite: f64,
    #[serde(rename = "Durability_Penalty")]
    pub durability_penalty: f64,
    #[serde(rename = "Seasons_Weighted")]
    pub seasons_weighted: usize,
    #[serde(rename = "Seasons_Total")]
    pub seasons_total: usize,
    #[serde(rename = "Seasons_Used")]
    pub seasons_used: String,
    #[serde(rename = "PTS_PG")]
    pub pts_pg: f64,
    #[serde(rename = "REB_PG")]
    pub reb_pg: f64,
    #[serde(rename = "AST_PG")]
    pub ast_pg: f64,
    #[serde(rename = "STL_PG")]
    pub stl_pg: f64,
    #[serde(rename = "BLK_PG")]
    pub blk_pg: f64,
    #[serde(rename = "FG3M_PG")]
    pub fg3m_pg: f64,
    #[serde(rename = "FG_PCT")]
    pub fg_pct: Option<f64>,
    #[serde(rename = "FT_PCT")]
    pub ft_pct: Option<f64>,
    #[serde(rename = "TOV_PG")]
    pub tov_pg: f64,
    pub player_key: String,
    #[serde(rename = "PLAYER_ID")]
    pub player_id: String,
    #[serde(rename = "SEASON_ID")]
    pub season_id: String,
}

impl From<&RankedPlayer> for ReportRow {
    fn from(p: &RankedPlayer) -> Self {
        let row = &p.latest.row;
        let rates = &p.latest.per_game;
        let availability = p.availability.as_ref();
        ReportRow {
            name_full: p.roster.name.clone(),
            rank: p.rank,
            team: p.roster.team.clone(),
            pos: p.roster.position.clone(),
            adp: p.adp,
            score: p.score,
            durability_z: p.durability_z,
            minutes_z: p.minutes_z,
            value_z: p.value_z,
            value_z_raw: p.value_z_raw,
            sample_strength: p.sample_strength,
            adp_z: p.adp_z,
            value_vs_adp: p.value_vs_adp,
            gp: row.gp,
            minutes: row.minutes,
            mpg: rates.min,
            weighted_gp: availability.map(|a| a.weighted_gp),
            median_gp: availability.map(|a| a.median_gp),
            variance_gp: availability.map(|a| a.variance_gp),
            durability_composite: p.durability_composite,
            durability_penalty: availability.map_or(0.0, |a| a.durability_penalty),
            seasons_weighted: availability.map_or(0, |a| a.seasons_weighted),
            seasons_total: availability.map_or(0, |a| a.seasons_total),
            seasons_used: availability.map_or_else(String::new, |a| a.seasons_used.join(",")),
            pts_pg: rates.pts,
            reb_pg: rates.reb,
            ast_pg: rates.ast,
            stl_pg: rates.stl,
            blk_pg: rates.blk,
            fg3m_pg: rates.fg3m,
            fg_pct: row.fg_pct,
            ft_pct: row.ft_pct,
            tov_pg: rates.tov,
            player_key: p.roster.player_key.clone(),
            player_id: row.player_id.clone(),
            season_id: row.season_id.clone(),
        }
    }
}

pub fn report_rows(players: &[RankedPlayer]) -> Vec<ReportRow> {
    players.iter().map(ReportRow::from).collect()
}

/// Write rows as CSV with a header line.
pub fn write_csv<W: Write>(writer: W, rows: &[ReportRow]) -> Result<(), ReportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write rows as a pretty-printed JSON array.
pub fn write_json<W: Write>(writer: W, rows: &[ReportRow]) -> Result<(), ReportError> {
    serde_json::to_writer_pretty(writer, rows)?;
    Ok(())
}

/// Write the ranked table to `path`, creating parent directories.
pub fn write_report(
    path: &Path,
    format: OutputFormat,
    players: &[RankedPlayer],
) -> Result<(), ReportError> {
    let io_err = |source: std::io::Error| ReportError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = std::fs::File::create(path).map_err(io_err)?;
    let writer = std::io::BufWriter::new(file);

    let rows = report_rows(players);
    match format {
        OutputFormat::Csv => write_csv(writer, &rows)?,
        OutputFormat::Json => write_json(writer, &rows)?,
    }
    info!("wrote {} ranked rows to {}", rows.len(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
