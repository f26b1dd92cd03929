// Latest-season view: one stat row per player plus derived per-game rates.

use crate::season::{cmp_seasons_undated_last, PerGameRates, SeasonStatRow};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

/// A player's most recent season with its per-game rates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestSeason {
    pub row: SeasonStatRow,
    pub per_game: PerGameRates,
}

/// Collapse multi-season rows into one row per player: the row from the
/// player's latest season, ordered by (start year, season id). A season
/// without a parseable start year counts as later than every dated one.
///
/// Output is ordered by player id. When one player has two rows for the same
/// season, the row appearing later in `rows` wins.
pub fn latest_seasons(rows: &[SeasonStatRow]) -> Vec<LatestSeason> {
    let mut latest: BTreeMap<&str, &SeasonStatRow> = BTreeMap::new();
    for row in rows {
        latest
            .entry(row.player_id.as_str())
            .and_modify(|current| {
                if cmp_seasons_undated_last(row, *current) != Ordering::Less {
                    *current = row;
                }
            })
            .or_insert(row);
    }

    debug!(
        "collapsed {} season rows into {} latest-season rows",
        rows.len(),
        latest.len()
    );

    latest
        .into_values()
        .map(|row| LatestSeason {
            row: row.clone(),
            per_game: row.per_game(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
