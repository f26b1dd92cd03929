// Cross-source identity resolution: roster names to stat-feed rows.
//
// The two feeds spell names differently (diacritics, generational suffixes,
// punctuation), so both sides are normalized and compared with a
// token-order-insensitive similarity score.

use crate::aggregate::LatestSeason;
use crate::config::{ConfigError, MatchConfig};
use crate::roster::RosterRecord;
use deunicode::deunicode;
use rapidfuzz::fuzz;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Generational suffix tokens removed during normalization.
const SUFFIX_TOKENS: &[&str] = &["jr.", "jr", "sr.", "sr", "iii", "ii"];

// ---------------------------------------------------------------------------
// Normalization and similarity
// ---------------------------------------------------------------------------

/// Normalize a display name for matching: ASCII transliteration, lowercase,
/// suffix tokens dropped, periods and apostrophes removed, whitespace
/// collapsed.
///
/// `"Jr. O'Neal III"` becomes `"oneal"`; `"Luka Dončić"` becomes
/// `"luka doncic"`.
pub fn normalize_name(name: &str) -> String {
    let folded = deunicode(name).to_lowercase();
    folded
        .split_whitespace()
        .filter(|token| !SUFFIX_TOKENS.contains(token))
        .map(|token| token.replace(['.', '\''], ""))
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Similarity of two strings on a 0-100 scale after sorting their
/// whitespace-separated tokens, so `"james lebron"` and `"lebron james"`
/// score 100.
///
/// The score is the normalized indel similarity of the sorted strings
/// (`rapidfuzz::fuzz::ratio`); two empty strings score 100.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let a = sorted_tokens(a);
    let b = sorted_tokens(b);
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    fuzz::ratio(a.chars(), b.chars()) * 100.0
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// How a link was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LinkMethod {
    Override,
    Fuzzy,
}

/// A roster player paired with a row of the latest-season table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentityLink {
    pub player_key: String,
    /// Index into the latest-season rows handed to [`IdentityMatcher::link`].
    pub stat_index: usize,
    /// Token-sort similarity of the normalized names (100 for overrides).
    pub score: f64,
    pub method: LinkMethod,
}

/// Normalized stat-feed names and where they live.
struct NameIndex {
    /// Distinct normalized names in first-appearance order.
    names: Vec<String>,
    /// Normalized name -> row index. Repeated names resolve to the last row.
    lookup: HashMap<String, usize>,
}

impl NameIndex {
    fn build(stats: &[LatestSeason]) -> Self {
        let mut names = Vec::with_capacity(stats.len());
        let mut lookup = HashMap::with_capacity(stats.len());
        for (idx, latest) in stats.iter().enumerate() {
            let key = normalize_name(&latest.row.player_name);
            if let Some(previous) = lookup.insert(key.clone(), idx) {
                warn!(
                    "stat rows {} and {} share normalized name '{}'; using row {}",
                    previous, idx, key, idx
                );
            } else {
                names.push(key);
            }
        }
        NameIndex { names, lookup }
    }

    /// Highest-scoring name; ties keep the earliest name.
    fn best_match(&self, query: &str) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for name in &self.names {
            let score = token_sort_ratio(query, name);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((name.as_str(), score));
                if score >= 100.0 {
                    break;
                }
            }
        }
        best
    }
}

// ---------------------------------------------------------------------------
// Matcher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct IdentityMatcher {
    cutoff: f64,
    overrides: HashMap<String, String>,
}

impl IdentityMatcher {
    pub fn new(config: &MatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(IdentityMatcher {
            cutoff: config.cutoff,
            overrides: config.overrides.clone(),
        })
    }

    /// Link each roster record to at most one latest-season row.
    ///
    /// A manual override for the raw roster name is authoritative: if its
    /// target is not in the stat feed the record stays unlinked. Otherwise
    /// the best token-sort match is accepted when it reaches the cutoff.
    pub fn link(&self, roster: &[RosterRecord], stats: &[LatestSeason]) -> Vec<IdentityLink> {
        let index = NameIndex::build(stats);
        let mut linked_keys: HashSet<&str> = HashSet::new();
        let mut links = Vec::new();

        for record in roster {
            if linked_keys.contains(record.player_key.as_str()) {
                continue;
            }

            if let Some(target) = self.overrides.get(&record.name) {
                match index.lookup.get(&normalize_name(target)) {
                    Some(&stat_index) => {
                        linked_keys.insert(&record.player_key);
                        links.push(IdentityLink {
                            player_key: record.player_key.clone(),
                            stat_index,
                            score: 100.0,
                            method: LinkMethod::Override,
                        });
                    }
                    None => {
                        warn!(
                            "override for '{}' points at '{}', which is not in the stat feed",
                            record.name, target
                        );
                    }
                }
                continue;
            }

            let query = normalize_name(&record.name);
            if query.is_empty() {
                debug!("skipping roster key {}: empty name", record.player_key);
                continue;
            }

            match index.best_match(&query) {
                Some((name, score)) if score >= self.cutoff => {
                    let stat_index = index.lookup[name];
                    linked_keys.insert(&record.player_key);
                    links.push(IdentityLink {
                        player_key: record.player_key.clone(),
                        stat_index,
                        score,
                        method: LinkMethod::Fuzzy,
                    });
                }
                Some((name, score)) => {
                    debug!(
                        "no link for '{}': best candidate '{}' scored {:.1}",
                        record.name, name, score
                    );
                }
                None => {
                    debug!("no link for '{}': stat feed is empty", record.name);
                }
            }
        }

        warn_shared_targets(&links);
        links
    }
}

/// Two roster keys landing on one stat row usually means ambiguous source
/// data. The links are kept; this only reports them.
fn warn_shared_targets(links: &[IdentityLink]) {
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for link in links {
        *counts.entry(link.stat_index).or_default() += 1;
    }
    let mut shared: Vec<(usize, usize)> = counts.into_iter().filter(|(_, n)| *n > 1).collect();
    shared.sort_unstable();
    for (stat_index, n) in shared {
        warn!("stat row {} is linked from {} roster keys", stat_index, n);
    }
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

    fn stat_table(names: &[&str]) -> Vec<LatestSeason> {
        let rows: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(i, name)| make_row(&format!("{:03}", i), name, "2024-25", 70, 2000.0))
            .collect();
        latest_seasons(&rows)
    }

    fn matcher() -> IdentityMatcher {
        IdentityMatcher::new(&MatchConfig::default()).unwrap()
    }

    // ---- normalization ----

    #[test]
    fn normalize_strips_suffixes_and_punctuation() {
        assert_eq!(normalize_name("Jr. O'Neal III"), "oneal");
        assert_eq!(normalize_name("Jaren Jackson Jr."), "jaren jackson");
        assert_eq!(normalize_name("Gary Trent Jr"), "gary trent");
        assert_eq!(normalize_name("Tim Hardaway Sr."), "tim hardaway");
        assert_eq!(normalize_name("Robert Williams III"), "robert williams");
        assert_eq!(normalize_name("Kelly Oubre II"), "kelly oubre");
        assert_eq!(normalize_name("P.J. Washington"), "pj washington");
        assert_eq!(normalize_name("De'Aaron Fox"), "deaaron fox");
    }

    #[test]
    fn normalize_strips_diacritics() {
        assert_eq!(normalize_name("Luka Dončić"), "luka doncic");
        assert_eq!(normalize_name("Nikola Jokić"), "nikola jokic");
        assert_eq!(normalize_name("Dāvis Bertāns"), "davis bertans");
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_name("  Shai   Gilgeous-Alexander "), "shai gilgeous-alexander");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn suffix_only_removed_as_whole_token() {
        // "sr" inside a surname survives
        assert_eq!(normalize_name("Jon Srna"), "jon srna");
        assert_eq!(normalize_name("Jrue Holiday"), "jrue holiday");
    }

    // ---- similarity ----

    #[test]
    fn token_sort_ignores_order() {
        assert_eq!(token_sort_ratio("lebron james", "james lebron"), 100.0);
    }

    #[test]
    fn token_sort_known_value() {
        // "abcd" vs "abce": LCS 3, 200 * 3 / 8 = 75
        assert!((token_sort_ratio("abcd", "abce") - 75.0).abs() < 1e-12);
    }

    #[test]
    fn token_sort_empty_strings() {
        assert_eq!(token_sort_ratio("", ""), 100.0);
        assert_eq!(token_sort_ratio("abc", ""), 0.0);
    }

    #[test]
    fn token_sort_scores_near_miss_names() {
        // "claxton nic" vs "claxton nicolas": 200 * 11 / 26
        assert!((token_sort_ratio("nic claxton", "nicolas claxton") - 84.6154).abs() < 1e-4);
        assert!((token_sort_ratio("jalen brunson", "jalen green") - 66.6667).abs() < 1e-4);
        assert!((token_sort_ratio("luka doncic", "doncic luka") - 100.0).abs() < 1e-12);
        // A shortened first name stays under the default cutoff.
        assert!(token_sort_ratio("nic claxton", "nicolas claxton") < MatchConfig::default().cutoff);
    }

    // ---- matching ----

    #[test]
    fn diacritic_name_links_to_ascii_name() {
        let stats = stat_table(&["Luka Doncic", "Nikola Jokic"]);
        let roster = vec![make_roster("k1", "Luka Dončić")];
        let links = matcher().link(&roster, &stats);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].player_key, "k1");
        assert_eq!(links[0].stat_index, 0);
        assert_eq!(links[0].score, 100.0);
        assert_eq!(links[0].method, LinkMethod::Fuzzy);
    }

    #[test]
    fn suffix_difference_still_links() {
        let stats = stat_table(&["Jaren Jackson Jr.", "Jalen Green"]);
        let roster = vec![make_roster("k1", "Jaren Jackson")];
        let links = matcher().link(&roster, &stats);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].stat_index, 0);
    }

    #[test]
    fn below_cutoff_produces_no_link() {
        let stats = stat_table(&["Jalen Green"]);
        let roster = vec![make_roster("k1", "Jalen Brunson")];
        let links = matcher().link(&roster, &stats);
        assert!(links.is_empty());
    }

    #[test]
    fn override_links_to_target() {
        let stats = stat_table(&["Nic Claxton", "Nicolas Batum"]);
        let mut config = MatchConfig::default();
        config
            .overrides
            .insert("Nicolas Claxton".into(), "Nic Claxton".into());
        let m = IdentityMatcher::new(&config).unwrap();

        let links = m.link(&[make_roster("k1", "Nicolas Claxton")], &stats);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].stat_index, 0);
        assert_eq!(links[0].method, LinkMethod::Override);
    }

    #[test]
    fn failed_override_does_not_fall_back() {
        // Without the override this name would match exactly.
        let stats = stat_table(&["Kevin Durant"]);
        let mut config = MatchConfig::default();
        config
            .overrides
            .insert("Kevin Durant".into(), "Somebody Else".into());
        let m = IdentityMatcher::new(&config).unwrap();

        let links = m.link(&[make_roster("k1", "Kevin Durant")], &stats);
        assert!(links.is_empty());
    }

    #[test]
    fn one_link_per_player_key() {
        let stats = stat_table(&["Stephen Curry"]);
        let roster = vec![
            make_roster("k1", "Stephen Curry"),
            make_roster("k1", "Stephen Curry"),
        ];
        let links = matcher().link(&roster, &stats);
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn two_keys_may_share_a_row() {
        let stats = stat_table(&["Stephen Curry"]);
        let roster = vec![
            make_roster("k1", "Stephen Curry"),
            make_roster("k2", "Seth Curry"),
            make_roster("k3", "Stephen Curry Jr."),
        ];
        let links = matcher().link(&roster, &stats);
        let keys: Vec<&str> = links.iter().map(|l| l.player_key.as_str()).collect();
        assert_eq!(keys, vec!["k1", "k3"]);
        assert!(links.iter().all(|l| l.stat_index == 0));
    }

    #[test]
    fn repeated_normalized_name_resolves_to_last_row() {
        let stats = stat_table(&["Marcus Morris", "Marcus Morris Sr."]);
        let links = matcher().link(&[make_roster("k1", "Marcus Morris")], &stats);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].stat_index, 1);
    }

    #[test]
    fn empty_name_is_skipped() {
        let stats = stat_table(&["Jr."]);
        let links = matcher().link(&[make_roster("k1", "")], &stats);
        assert!(links.is_empty());
    }

    #[test]
    fn empty_stat_feed_yields_no_links() {
        let links = matcher().link(&[make_roster("k1", "Anyone")], &[]);
        assert!(links.is_empty());
    }
}
