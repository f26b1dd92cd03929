// End-to-end composition of the analytic stages over materialized inputs.

use crate::aggregate::latest_seasons;
use crate::availability::{compute_availability, AvailabilityRecord};
use crate::config::{ConfigError, ModelConfig};
use crate::identity::IdentityMatcher;
use crate::ranking::{RankedPlayer, RankingEngine, RankingInput};
use crate::roster::{adp_by_player_key, dedupe_roster, DraftAnalysis, RosterRecord};
use crate::season::SeasonStatRow;
use std::collections::HashMap;
use tracing::info;

/// Everything the collaborators hand over for one run.
#[derive(Debug, Clone, Default)]
pub struct PipelineInputs {
    pub season_rows: Vec<SeasonStatRow>,
    pub roster: Vec<RosterRecord>,
    pub draft: Vec<DraftAnalysis>,
}

/// Stage counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub season_rows: usize,
    pub stat_players: usize,
    pub availability_records: usize,
    pub roster_players: usize,
    pub linked: usize,
    pub with_adp: usize,
}

impl RunSummary {
    pub fn unmatched(&self) -> usize {
        self.roster_players.saturating_sub(self.linked)
    }
}

#[derive(Debug, Clone)]
pub struct RankedTable {
    pub players: Vec<RankedPlayer>,
    pub summary: RunSummary,
}

/// Run every stage: latest-season view, availability, identity links, and
/// the final ranking. Configuration is validated before any data is touched.
pub fn run(inputs: PipelineInputs, config: &ModelConfig) -> Result<RankedTable, ConfigError> {
    config.validate()?;
    let matcher = IdentityMatcher::new(&config.matching)?;
    let engine = RankingEngine::new(&config.ranking)?;

    let latest = latest_seasons(&inputs.season_rows);
    let availability = compute_availability(&inputs.season_rows, &config.availability)?;
    info!(
        "{} season rows -> {} players with stats, {} availability records",
        inputs.season_rows.len(),
        latest.len(),
        availability.len()
    );

    let roster = dedupe_roster(inputs.roster);
    let links = matcher.link(&roster, &latest);
    info!("matched {} of {} roster players", links.len(), roster.len());

    let adp = adp_by_player_key(&inputs.draft);
    let availability_by_id: HashMap<&str, &AvailabilityRecord> = availability
        .iter()
        .map(|a| (a.player_id.as_str(), a))
        .collect();
    let roster_by_key: HashMap<&str, &RosterRecord> = roster
        .iter()
        .map(|r| (r.player_key.as_str(), r))
        .collect();

    let ranking_inputs: Vec<RankingInput> = links
        .iter()
        .filter_map(|link| {
            let record = roster_by_key.get(link.player_key.as_str())?;
            let stats = latest.get(link.stat_index)?;
            Some(RankingInput {
                roster: (*record).clone(),
                latest: stats.clone(),
                availability: availability_by_id
                    .get(stats.row.player_id.as_str())
                    .map(|a| (*a).clone()),
                adp: adp.get(&link.player_key).copied(),
            })
        })
        .collect();

    let with_adp = ranking_inputs.iter().filter(|p| p.adp.is_some()).count();
    info!("{} linked players carry an ADP", with_adp);

    let summary = RunSummary {
        season_rows: inputs.season_rows.len(),
        stat_players: latest.len(),
        availability_records: availability.len(),
        roster_players: roster.len(),
        linked: ranking_inputs.len(),
        with_adp,
    };

    let players = engine.rank(ranking_inputs);
    Ok(RankedTable { players, summary })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
