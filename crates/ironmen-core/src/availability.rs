// Availability model: recency-weighted games played blended with the career
// median, minus a penalty for season-to-season volatility.

use crate::config::{AvailabilityConfig, ConfigError};
use crate::season::{cmp_seasons, SeasonStatRow};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Share of the availability anchor taken by the recency-weighted GP; the
/// rest comes from the median GP.
const WEIGHTED_GP_SHARE: f64 = 0.7;
const MEDIAN_GP_SHARE: f64 = 0.3;

/// Durability metrics for one player, with every intermediate retained.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AvailabilityRecord {
    pub player_id: String,
    pub weighted_gp: f64,
    /// Median GP over every season on record.
    pub median_gp: f64,
    /// Population variance of GP over every season on record.
    pub variance_gp: f64,
    pub durability_composite: f64,
    pub durability_penalty: f64,
    pub seasons_weighted: usize,
    pub seasons_total: usize,
    /// Season ids that fed the weighted figure, most recent first.
    pub seasons_used: Vec<String>,
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Validated availability weighting. Construction fails on an empty or
/// invalid weight vector.
#[derive(Debug, Clone)]
pub struct AvailabilityModel {
    weights: Vec<f64>,
    penalty_factor: f64,
}

impl AvailabilityModel {
    pub fn new(config: &AvailabilityConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(AvailabilityModel {
            weights: config.weights.clone(),
            penalty_factor: config.penalty_factor,
        })
    }

    /// Score one player's season history. The seasons may arrive in any
    /// order; an empty history yields an all-zero record.
    pub fn evaluate(&self, player_id: &str, seasons: &[&SeasonStatRow]) -> AvailabilityRecord {
        if seasons.is_empty() {
            return AvailabilityRecord {
                player_id: player_id.to_string(),
                ..AvailabilityRecord::default()
            };
        }

        let mut ordered: Vec<&SeasonStatRow> = seasons.to_vec();
        // Most recent first; undated seasons land at the end.
        ordered.sort_by(|a, b| cmp_seasons(b, a));

        let gp_all: Vec<f64> = ordered.iter().map(|s| s.gp as f64).collect();
        let median_gp = median(&gp_all);
        let variance_gp = population_variance(&gp_all);

        let considered = &ordered[..ordered.len().min(self.weights.len())];
        let weights_used = normalize_weights(&self.weights[..considered.len()]);
        let weighted_gp: f64 = considered
            .iter()
            .zip(&weights_used)
            .map(|(s, w)| s.gp as f64 * w)
            .sum();

        let anchor = WEIGHTED_GP_SHARE * weighted_gp + MEDIAN_GP_SHARE * median_gp;
        let durability_penalty = variance_gp * self.penalty_factor;
        let durability_composite = (anchor - durability_penalty).max(0.0);

        AvailabilityRecord {
            player_id: player_id.to_string(),
            weighted_gp,
            median_gp,
            variance_gp,
            durability_composite,
            durability_penalty,
            seasons_weighted: considered.len(),
            seasons_total: ordered.len(),
            seasons_used: considered.iter().map(|s| s.season_id.clone()).collect(),
        }
    }
}

/// Group rows by player and score each player's history. Output is ordered
/// by player id.
pub fn compute_availability(
    rows: &[SeasonStatRow],
    config: &AvailabilityConfig,
) -> Result<Vec<AvailabilityRecord>, ConfigError> {
    let model = AvailabilityModel::new(config)?;

    let mut by_player: BTreeMap<&str, Vec<&SeasonStatRow>> = BTreeMap::new();
    for row in rows {
        by_player.entry(row.player_id.as_str()).or_default().push(row);
    }

    let records: Vec<AvailabilityRecord> = by_player
        .into_iter()
        .map(|(player_id, seasons)| model.evaluate(player_id, &seasons))
        .collect();

    debug!("computed availability for {} players", records.len());
    Ok(records)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Rescale a weight slice to sum to 1.0, falling back to equal weights when
/// the slice sums to zero.
fn normalize_weights(weights: &[f64]) -> Vec<f64> {
    if weights.is_empty() {
        return Vec::new();
    }
    let sum: f64 = weights.iter().sum();
    if sum == 0.0 {
        let equal = 1.0 / weights.len() as f64;
        return vec![equal; weights.len()];
    }
    weights.iter().map(|w| w / sum).collect()
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
