// Fantasy-platform roster records and draft-analysis ADP.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// One player as listed by the fantasy platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterRecord {
    /// Platform player key, e.g. `"428.p.6583"`. Opaque.
    pub player_key: String,
    pub name: String,
    pub team: String,
    pub position: String,
}

/// Draft-analysis figures for one player key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftAnalysis {
    pub player_key: String,
    pub preseason_pick: Option<f64>,
    pub overall_pick: Option<f64>,
}

impl DraftAnalysis {
    /// Average draft position: the preseason estimate when present,
    /// otherwise the overall estimate.
    pub fn adp(&self) -> Option<f64> {
        self.preseason_pick
            .filter(|v| v.is_finite())
            .or(self.overall_pick.filter(|v| v.is_finite()))
    }
}

/// Drop repeated player keys, keeping the first occurrence of each.
pub fn dedupe_roster(records: Vec<RosterRecord>) -> Vec<RosterRecord> {
    let before = records.len();
    let mut seen = HashSet::new();
    let deduped: Vec<RosterRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.player_key.clone()))
        .collect();
    if deduped.len() != before {
        debug!("dropped {} duplicate roster rows", before - deduped.len());
    }
    deduped
}

/// Map player key -> ADP for every analysis carrying an estimate. A later
/// entry for the same key replaces an earlier one.
pub fn adp_by_player_key(analyses: &[DraftAnalysis]) -> HashMap<String, f64> {
    analyses
        .iter()
        .filter_map(|a| a.adp().map(|adp| (a.player_key.clone(), adp)))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
