// Season stat rows and per-game rate derivation.

use serde::Serialize;
use std::cmp::Ordering;

// ---------------------------------------------------------------------------
// Season identifiers
// ---------------------------------------------------------------------------

/// Parse the start year from a season identifier such as `"2024-25"`.
///
/// Only the first four characters are considered; anything that does not
/// parse as a year yields `None`.
pub fn season_start_year(season_id: &str) -> Option<i32> {
    let prefix = season_id.trim().get(..4)?;
    if !prefix.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}

/// Format a season identifier from its start year: 2024 -> `"2024-25"`.
pub fn season_id_for(start_year: i32) -> String {
    format!("{}-{:02}", start_year, (start_year + 1).rem_euclid(100))
}

/// List `count` season identifiers ending at `latest`, most recent first.
///
/// Returns `None` when `latest` has no parseable start year.
pub fn recent_seasons(latest: &str, count: usize) -> Option<Vec<String>> {
    let start = season_start_year(latest)?;
    Some(
        (0..count)
            .map(|offset| season_id_for(start - offset as i32))
            .collect(),
    )
}

/// Order two seasons by (start year, season id) ascending. A season without
/// a parseable start year sorts before every dated season.
pub fn cmp_seasons(a: &SeasonStatRow, b: &SeasonStatRow) -> Ordering {
    a.season_start_year()
        .cmp(&b.season_start_year())
        .then_with(|| a.season_id.cmp(&b.season_id))
}

/// Order two seasons by (start year, season id) ascending with every season
/// lacking a parseable start year placed after all dated seasons. Used to
/// pick a player's latest row, where an undated export row is the newest.
pub fn cmp_seasons_undated_last(a: &SeasonStatRow, b: &SeasonStatRow) -> Ordering {
    let (ya, yb) = (a.season_start_year(), b.season_start_year());
    ya.is_none()
        .cmp(&yb.is_none())
        .then_with(|| ya.cmp(&yb))
        .then_with(|| a.season_id.cmp(&b.season_id))
}

// ---------------------------------------------------------------------------
// Raw rows
// ---------------------------------------------------------------------------

/// Season totals for the counting stats. `None` means the source did not
/// report the column or the value could not be parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CountingStats {
    pub pts: Option<f64>,
    pub reb: Option<f64>,
    pub ast: Option<f64>,
    pub stl: Option<f64>,
    pub blk: Option<f64>,
    pub fg3m: Option<f64>,
    pub tov: Option<f64>,
}

/// One player-season from the league statistics feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonStatRow {
    pub player_id: String,
    pub player_name: String,
    pub team: Option<String>,
    pub season_id: String,
    pub gp: u32,
    /// Total minutes across the season.
    pub minutes: f64,
    pub totals: CountingStats,
    pub fg_pct: Option<f64>,
    pub ft_pct: Option<f64>,
}

impl SeasonStatRow {
    pub fn season_start_year(&self) -> Option<i32> {
        season_start_year(&self.season_id)
    }

    /// Divide a season total by games played; 0.0 when GP is 0 or the
    /// total is missing.
    pub fn per_game_rate(&self, total: Option<f64>) -> f64 {
        per_game(total.unwrap_or(0.0), self.gp)
    }

    pub fn minutes_per_game(&self) -> f64 {
        per_game(self.minutes, self.gp)
    }

    pub fn per_game(&self) -> PerGameRates {
        let t = &self.totals;
        PerGameRates {
            pts: self.per_game_rate(t.pts),
            reb: self.per_game_rate(t.reb),
            ast: self.per_game_rate(t.ast),
            stl: self.per_game_rate(t.stl),
            blk: self.per_game_rate(t.blk),
            fg3m: self.per_game_rate(t.fg3m),
            tov: self.per_game_rate(t.tov),
            min: self.minutes_per_game(),
        }
    }
}

fn per_game(total: f64, gp: u32) -> f64 {
    if gp == 0 || !total.is_finite() {
        return 0.0;
    }
    total / gp as f64
}

/// Per-game rates derived from a [`SeasonStatRow`]. Always finite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerGameRates {
    pub pts: f64,
    pub reb: f64,
    pub ast: f64,
    pub stl: f64,
    pub blk: f64,
    pub fg3m: f64,
    pub tov: f64,
    pub min: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
