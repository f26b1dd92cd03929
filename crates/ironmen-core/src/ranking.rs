// IronMan ranking: population z-scores blended into a single score.
//
// Four components feed the score: durability (the availability composite),
// minutes per game, per-game production value, and production relative to
// draft cost. Every component is a population z-score across the matched
// player set, so the blend weights are directly comparable.

use crate::aggregate::LatestSeason;
use crate::availability::AvailabilityRecord;
use crate::config::{BlendWeights, ConfigError, RankingConfig, SampleStrengthConfig};
use crate::roster::RosterRecord;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Pool statistics
// ---------------------------------------------------------------------------

/// Mean and standard deviation for a single statistic across the player pool.
#[derive(Debug, Clone, Copy)]
pub struct PoolStats {
    pub mean: f64,
    pub stdev: f64,
}

/// Threshold below which standard deviation is treated as zero.
const STDEV_EPSILON: f64 = 1e-9;

/// Compute mean and population standard deviation for a slice of values.
///
/// Returns `PoolStats { mean: 0.0, stdev: 0.0 }` for an empty slice.
pub fn compute_pool_stats(values: &[f64]) -> PoolStats {
    if values.is_empty() {
        return PoolStats {
            mean: 0.0,
            stdev: 0.0,
        };
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    PoolStats {
        mean,
        stdev: variance.sqrt(),
    }
}

/// Compute a z-score given a value and pool stats.
///
/// Returns 0.0 if the standard deviation is approximately zero or not finite.
pub fn compute_zscore(value: f64, stats: &PoolStats) -> f64 {
    if !stats.stdev.is_finite() || stats.stdev < STDEV_EPSILON {
        return 0.0;
    }
    (value - stats.mean) / stats.stdev
}

/// Population z-scores for a whole column. A constant column maps to zeros.
pub fn zscores(values: &[f64]) -> Vec<f64> {
    let stats = compute_pool_stats(values);
    values.iter().map(|v| compute_zscore(*v, &stats)).collect()
}

/// Replace NaN/infinite values with 0.0 and fold -0.0 into 0.0.
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value + 0.0
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Input and output rows
// ---------------------------------------------------------------------------

/// One linked player ready for scoring.
#[derive(Debug, Clone)]
pub struct RankingInput {
    pub roster: RosterRecord,
    pub latest: LatestSeason,
    /// `None` when the player had no availability record; durability then
    /// falls back to the latest season's GP.
    pub availability: Option<AvailabilityRecord>,
    pub adp: Option<f64>,
}

impl RankingInput {
    pub fn durability_composite(&self) -> f64 {
        match &self.availability {
            Some(a) => finite_or_zero(a.durability_composite),
            None => self.latest.row.gp as f64,
        }
    }
}

/// Per-statistic production z-scores. Turnovers are negated before scoring
/// so a positive `tov` always means "better".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ValueZScores {
    pub pts: f64,
    pub reb: f64,
    pub ast: f64,
    pub stl: f64,
    pub blk: f64,
    pub fg3m: f64,
    pub fg_pct: f64,
    pub ft_pct: f64,
    pub tov: f64,
}

impl ValueZScores {
    fn mean(&self) -> f64 {
        let parts = [
            self.pts,
            self.reb,
            self.ast,
            self.stl,
            self.blk,
            self.fg3m,
            self.fg_pct,
            self.ft_pct,
            self.tov,
        ];
        parts.iter().sum::<f64>() / parts.len() as f64
    }
}

/// A fully scored player.
#[derive(Debug, Clone, Serialize)]
pub struct RankedPlayer {
    pub roster: RosterRecord,
    pub latest: LatestSeason,
    pub availability: Option<AvailabilityRecord>,
    pub adp: Option<f64>,
    pub durability_composite: f64,
    pub value_zscores: ValueZScores,
    /// Mean of the production z-scores before the sample-strength discount.
    pub value_z_raw: f64,
    pub sample_strength: f64,
    pub value_z: f64,
    pub durability_z: f64,
    pub minutes_z: f64,
    /// z-score of the negated ADP; `None` when the player has no ADP.
    pub adp_z: Option<f64>,
    pub value_vs_adp: f64,
    pub score: f64,
    /// 1-based; tied scores share the lowest rank of the group.
    pub rank: u32,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RankingEngine {
    blend: BlendWeights,
    sample: SampleStrengthConfig,
}

impl RankingEngine {
    pub fn new(config: &RankingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(RankingEngine {
            blend: config.blend,
            sample: config.sample_strength,
        })
    }

    /// Factor in `[0, 1]` discounting small samples: the larger of the games
    /// and minutes fractions of their full-weight thresholds. Always 1.0 when
    /// the discount is disabled.
    pub fn sample_strength(&self, gp: u32, minutes: f64) -> f64 {
        if !self.sample.enabled {
            return 1.0;
        }
        let games = (gp as f64 / self.sample.full_weight_games).clamp(0.0, 1.0);
        let minutes = finite_or_zero(minutes / self.sample.full_weight_minutes).clamp(0.0, 1.0);
        games.max(minutes)
    }

    /// Score and rank the matched players. Output is sorted ascending by
    /// rank; tied players are ordered by player key.
    ///
    /// Steps:
    /// 1. z-score each per-game production stat (turnovers negated).
    /// 2. ValueZ = mean production z, scaled by sample strength.
    /// 3. DurabilityZ and MinutesZ from the composite and minutes per game.
    /// 4. ADPz over players with an ADP; value_vs_adp = ValueZ - ADPz, or 0.
    /// 5. Blend, zero out non-finite scores, assign min-rank on ties.
    pub fn rank(&self, inputs: Vec<RankingInput>) -> Vec<RankedPlayer> {
        if inputs.is_empty() {
            return Vec::new();
        }

        // ---- 1. Production z-scores ----
        let column = |f: &dyn Fn(&RankingInput) -> f64| -> Vec<f64> {
            zscores(&inputs.iter().map(|p| finite_or_zero(f(p))).collect::<Vec<_>>())
        };
        let pts = column(&|p| p.latest.per_game.pts);
        let reb = column(&|p| p.latest.per_game.reb);
        let ast = column(&|p| p.latest.per_game.ast);
        let stl = column(&|p| p.latest.per_game.stl);
        let blk = column(&|p| p.latest.per_game.blk);
        let fg3m = column(&|p| p.latest.per_game.fg3m);
        let fg_pct = column(&|p| p.latest.row.fg_pct.unwrap_or(0.0));
        let ft_pct = column(&|p| p.latest.row.ft_pct.unwrap_or(0.0));
        let tov = column(&|p| -p.latest.per_game.tov);

        // ---- 3. Durability and minutes ----
        let durability = column(&|p| p.durability_composite());
        let minutes = column(&|p| p.latest.per_game.min);

        // ---- 4. ADP (only over players that have one) ----
        let adp_values: Vec<Option<f64>> = inputs
            .iter()
            .map(|p| p.adp.filter(|v| v.is_finite()))
            .collect();
        let present: Vec<f64> = adp_values.iter().flatten().map(|v| -v).collect();
        let adp_stats = compute_pool_stats(&present);
        let adp_z: Vec<Option<f64>> = adp_values
            .iter()
            .map(|adp| adp.map(|v| compute_zscore(-v, &adp_stats)))
            .collect();

        let mut scored: Vec<RankedPlayer> = Vec::with_capacity(inputs.len());
        for (i, input) in inputs.into_iter().enumerate() {
            let value_zscores = ValueZScores {
                pts: pts[i],
                reb: reb[i],
                ast: ast[i],
                stl: stl[i],
                blk: blk[i],
                fg3m: fg3m[i],
                fg_pct: fg_pct[i],
                ft_pct: ft_pct[i],
                tov: tov[i],
            };

            // ---- 2. Value, discounted for small samples ----
            let value_z_raw = value_zscores.mean();
            let sample_strength = self.sample_strength(input.latest.row.gp, input.latest.row.minutes);
            let value_z = value_z_raw * sample_strength;

            // Players without ADP carry no value-vs-cost signal.
            let value_vs_adp = adp_z[i].map_or(0.0, |z| finite_or_zero(value_z - z));

            // ---- 5. Blend ----
            let score = finite_or_zero(
                self.blend.durability * durability[i]
                    + self.blend.minutes * minutes[i]
                    + self.blend.value * value_z
                    + self.blend.value_vs_adp * value_vs_adp,
            );

            scored.push(RankedPlayer {
                durability_composite: input.durability_composite(),
                roster: input.roster,
                latest: input.latest,
                availability: input.availability,
                adp: input.adp,
                value_zscores,
                value_z_raw,
                sample_strength,
                value_z,
                durability_z: durability[i],
                minutes_z: minutes[i],
                adp_z: adp_z[i],
                value_vs_adp,
                score,
                rank: 0,
            });
        }

        let scores: Vec<f64> = scored.iter().map(|p| p.score).collect();
        let keys: Vec<&str> = scored.iter().map(|p| p.roster.player_key.as_str()).collect();
        let (order, ranks) = min_ranks(&scores, &keys);

        let mut slots: Vec<Option<RankedPlayer>> = scored.into_iter().map(Some).collect();
        order
            .into_iter()
            .filter_map(|idx| {
                slots[idx].take().map(|mut player| {
                    player.rank = ranks[idx];
                    player
                })
            })
            .collect()
    }
}

/// Rank scores descending with "min" tie semantics.
///
/// Returns the indices in rank order (ties ordered by `tie_keys` ascending)
/// and the rank of each input position. `[5.0, 5.0, 3.0]` ranks as
/// `[1, 1, 3]`. `tie_keys` must be as long as `scores`.
pub fn min_ranks(scores: &[f64], tie_keys: &[&str]) -> (Vec<usize>, Vec<u32>) {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .total_cmp(&scores[a])
            .then_with(|| tie_keys[a].cmp(tie_keys[b]))
    });

    let mut ranks = vec![0u32; scores.len()];
    for (pos, &idx) in order.iter().enumerate() {
        ranks[idx] = match pos.checked_sub(1).map(|p| order[p]) {
            Some(prev) if scores[prev] == scores[idx] => ranks[prev],
            _ => pos as u32 + 1,
        };
    }
    (order, ranks)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::latest_seasons;
    use crate::roster::tests::make_roster;
    use crate::season::tests::make_row;
    use crate::season::SeasonStatRow;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn engine() -> RankingEngine {
        RankingEngine::new(&RankingConfig::default()).unwrap()
    }

    fn latest(row: SeasonStatRow) -> LatestSeason {
        latest_seasons(&[row]).remove(0)
    }

    fn make_input(key: &str, gp: u32, minutes: f64, pts: f64, adp: Option<f64>) -> RankingInput {
        let mut row = make_row(key, key, "2024-25", gp, minutes);
        row.totals.pts = Some(pts);
        RankingInput {
            roster: make_roster(key, key),
            latest: latest(row),
            availability: None,
            adp,
        }
    }

    // ---- pool stats / z-scores ----

    #[test]
    fn pool_stats_known_values() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let stats = compute_pool_stats(&values);
        assert!(approx_eq(stats.mean, 5.0, 1e-10));
        assert!(approx_eq(stats.stdev, 2.0, 1e-10));
    }

    #[test]
    fn pool_stats_empty() {
        let stats = compute_pool_stats(&[]);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.stdev, 0.0);
    }

    #[test]
    fn constant_column_zscores_are_zero() {
        let z = zscores(&[7.5, 7.5, 7.5, 7.5]);
        assert!(z.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn zscores_known_inputs() {
        let z = zscores(&[1.0, 3.0]);
        assert!(approx_eq(z[0], -1.0, 1e-12));
        assert!(approx_eq(z[1], 1.0, 1e-12));
    }

    // ---- ranks ----

    #[test]
    fn tied_scores_share_min_rank() {
        let (order, ranks) = min_ranks(&[5.0, 5.0, 3.0], &["b", "a", "c"]);
        assert_eq!(ranks, vec![1, 1, 3]);
        assert_eq!(order, vec![1, 0, 2]);
    }

    #[test]
    fn rank_skips_after_tie_group() {
        let (order, ranks) = min_ranks(&[1.0, 9.0, 4.0, 9.0, 9.0], &["a", "b", "c", "d", "e"]);
        assert_eq!(ranks, vec![5, 1, 4, 1, 1]);
        assert_eq!(order, vec![1, 3, 4, 2, 0]);
    }

    // ---- sample strength ----

    #[test]
    fn sample_strength_takes_larger_factor() {
        let e = engine();
        assert!(approx_eq(e.sample_strength(10, 400.0), 0.8, 1e-12));
        assert!(approx_eq(e.sample_strength(30, 100.0), 0.75, 1e-12));
        assert_eq!(e.sample_strength(82, 2800.0), 1.0);
        assert_eq!(e.sample_strength(0, 0.0), 0.0);
    }

    #[test]
    fn sample_strength_disabled_is_one() {
        let mut config = RankingConfig::default();
        config.sample_strength.enabled = false;
        let e = RankingEngine::new(&config).unwrap();
        assert_eq!(e.sample_strength(1, 5.0), 1.0);
    }

    // ---- engine ----

    #[test]
    fn empty_input_yields_empty_table() {
        assert!(engine().rank(Vec::new()).is_empty());
    }

    #[test]
    fn invalid_blend_rejected() {
        let mut config = RankingConfig::default();
        config.blend.value = 0.9;
        assert!(RankingEngine::new(&config).is_err());
    }

    #[test]
    fn no_adp_anywhere_zeroes_value_vs_adp() {
        let ranked = engine().rank(vec![
            make_input("a", 70, 2100.0, 1400.0, None),
            make_input("b", 60, 1500.0, 600.0, None),
        ]);
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|p| p.value_vs_adp == 0.0 && p.adp_z.is_none()));
    }

    #[test]
    fn partial_adp_uses_present_subset_and_zero_fallback() {
        let ranked = engine().rank(vec![
            make_input("a", 70, 2100.0, 1400.0, Some(10.0)),
            make_input("b", 60, 1500.0, 600.0, None),
        ]);
        let a = ranked.iter().find(|p| p.roster.player_key == "a").unwrap();
        let b = ranked.iter().find(|p| p.roster.player_key == "b").unwrap();

        // Single ADP value: zero spread, so ADPz = 0 and value_vs_adp = ValueZ.
        assert_eq!(a.adp_z, Some(0.0));
        assert!(approx_eq(a.value_vs_adp, a.value_z, 1e-12));

        assert_eq!(b.adp_z, None);
        assert_eq!(b.value_vs_adp, 0.0);
        assert!(b.score.is_finite());
    }

    #[test]
    fn lower_adp_scores_higher_adp_z() {
        let ranked = engine().rank(vec![
            make_input("early", 70, 2100.0, 1000.0, Some(5.0)),
            make_input("late", 70, 2100.0, 1000.0, Some(95.0)),
        ]);
        let early = ranked.iter().find(|p| p.roster.player_key == "early").unwrap();
        let late = ranked.iter().find(|p| p.roster.player_key == "late").unwrap();
        assert!(approx_eq(early.adp_z.unwrap(), 1.0, 1e-12));
        assert!(approx_eq(late.adp_z.unwrap(), -1.0, 1e-12));
        // Identical production: the late pick beats its draft cost.
        assert!(late.value_vs_adp > early.value_vs_adp);
    }

    #[test]
    fn identical_players_tie_at_rank_one() {
        let ranked = engine().rank(vec![
            make_input("a", 60, 1800.0, 900.0, None),
            make_input("b", 60, 1800.0, 900.0, None),
            make_input("c", 60, 1800.0, 900.0, None),
        ]);
        assert!(ranked.iter().all(|p| p.rank == 1 && p.score == 0.0));
        let keys: Vec<&str> = ranked.iter().map(|p| p.roster.player_key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn tie_order_ignores_input_order() {
        let ranked = engine().rank(vec![
            make_input("c", 60, 1800.0, 900.0, None),
            make_input("a", 60, 1800.0, 900.0, None),
            make_input("b", 60, 1800.0, 900.0, None),
        ]);
        let keys: Vec<&str> = ranked.iter().map(|p| p.roster.player_key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert!(ranked.iter().all(|p| p.rank == 1));
    }

    #[test]
    fn durable_productive_player_ranks_first() {
        let mut strong = make_input("strong", 80, 2800.0, 2000.0, None);
        strong.availability = Some(AvailabilityRecord {
            player_id: "strong".into(),
            durability_composite: 78.0,
            ..AvailabilityRecord::default()
        });
        let mut weak = make_input("weak", 20, 300.0, 100.0, None);
        weak.availability = Some(AvailabilityRecord {
            player_id: "weak".into(),
            durability_composite: 25.0,
            ..AvailabilityRecord::default()
        });

        let ranked = engine().rank(vec![weak, strong]);
        assert_eq!(ranked[0].roster.player_key, "strong");
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].rank, 2);
        assert!(ranked[0].durability_z > 0.0);
        assert!(ranked[0].minutes_z > 0.0);
    }

    #[test]
    fn missing_availability_falls_back_to_gp() {
        let input = make_input("a", 55, 1000.0, 500.0, None);
        assert_eq!(input.durability_composite(), 55.0);
    }

    #[test]
    fn small_sample_discounts_value() {
        let ranked = engine().rank(vec![
            make_input("tiny", 4, 40.0, 120.0, None),
            make_input("full", 70, 2000.0, 700.0, None),
        ]);
        let tiny = ranked.iter().find(|p| p.roster.player_key == "tiny").unwrap();
        // 4 games of 40, 40 minutes of 500 -> factor 0.1
        assert!(approx_eq(tiny.sample_strength, 0.1, 1e-12));
        assert!(approx_eq(tiny.value_z, tiny.value_z_raw * 0.1, 1e-12));
    }

    #[test]
    fn turnovers_are_inverted() {
        let mut careful = make_input("careful", 70, 2100.0, 1000.0, None);
        careful.latest.per_game.tov = 1.0;
        let mut sloppy = make_input("sloppy", 70, 2100.0, 1000.0, None);
        sloppy.latest.per_game.tov = 4.0;

        let ranked = engine().rank(vec![careful, sloppy]);
        let careful = ranked.iter().find(|p| p.roster.player_key == "careful").unwrap();
        assert!(careful.value_zscores.tov > 0.0);
        assert_eq!(careful.rank, 1);
    }

    #[test]
    fn score_blend_matches_weights() {
        let ranked = engine().rank(vec![
            make_input("a", 70, 2100.0, 1400.0, Some(12.0)),
            make_input("b", 50, 1000.0, 500.0, Some(40.0)),
            make_input("c", 30, 900.0, 800.0, Some(80.0)),
        ]);
        for p in &ranked {
            let expected = 0.40 * p.durability_z
                + 0.20 * p.minutes_z
                + 0.30 * p.value_z
                + 0.10 * p.value_vs_adp;
            assert!(approx_eq(p.score, expected, 1e-12));
        }
        let ranks: Vec<u32> = ranked.iter().map(|p| p.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }
}
