// Model configuration: availability weighting, identity matching, and ranking blend.
//
// Every tunable number the analytic stages use lives here. The structs
// deserialize from the `[model.*]` tables of pipeline.toml, and each stage
// validates its section when it is constructed so a bad weight vector fails
// before any data is touched.

use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

impl ConfigError {
    fn invalid(field: &str, message: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Tolerance for "weights sum to 1.0" checks.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Top-level model config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub availability: AvailabilityConfig,
    pub matching: MatchConfig,
    pub ranking: RankingConfig,
}

impl ModelConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.availability.validate()?;
        self.matching.validate()?;
        self.ranking.validate()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

/// Recency weights and variance penalty for the durability composite.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AvailabilityConfig {
    /// Weights for the most recent seasons, most recent first.
    pub weights: Vec<f64>,
    /// Multiplier applied to the games-played variance.
    pub penalty_factor: f64,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        AvailabilityConfig {
            weights: vec![0.60, 0.30, 0.10],
            penalty_factor: 0.05,
        }
    }
}

impl AvailabilityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.weights.is_empty() {
            return Err(ConfigError::invalid(
                "availability.weights",
                "must contain at least one weight",
            ));
        }
        for (i, w) in self.weights.iter().enumerate() {
            if !w.is_finite() || *w < 0.0 {
                return Err(ConfigError::invalid(
                    "availability.weights",
                    format!("weight {i} must be finite and >= 0, got {w}"),
                ));
            }
        }
        let pf = self.penalty_factor;
        if !pf.is_finite() || pf < 0.0 {
            return Err(ConfigError::invalid(
                "availability.penalty_factor",
                format!("must be finite and >= 0, got {pf}"),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Identity matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Minimum token-sort similarity (0-100) for a fuzzy link.
    pub cutoff: f64,
    /// Raw roster name -> stat-source name. Consulted before fuzzy matching.
    pub overrides: HashMap<String, String>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            cutoff: 91.0,
            overrides: HashMap::new(),
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.cutoff) {
            return Err(ConfigError::invalid(
                "matching.cutoff",
                format!("must be between 0 and 100 inclusive, got {}", self.cutoff),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub blend: BlendWeights,
    pub sample_strength: SampleStrengthConfig,
}

impl RankingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.blend.validate()?;
        self.sample_strength.validate()?;
        Ok(())
    }
}

/// Linear blend of the four score components into the IronMan score.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct BlendWeights {
    pub durability: f64,
    pub minutes: f64,
    pub value: f64,
    pub value_vs_adp: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        BlendWeights {
            durability: 0.40,
            minutes: 0.20,
            value: 0.30,
            value_vs_adp: 0.10,
        }
    }
}

impl BlendWeights {
    pub fn sum(&self) -> f64 {
        self.durability + self.minutes + self.value + self.value_vs_adp
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields: &[(&str, f64)] = &[
            ("ranking.blend.durability", self.durability),
            ("ranking.blend.minutes", self.minutes),
            ("ranking.blend.value", self.value),
            ("ranking.blend.value_vs_adp", self.value_vs_adp),
        ];
        for (name, val) in fields {
            if !val.is_finite() || *val < 0.0 {
                return Err(ConfigError::invalid(
                    name,
                    format!("must be finite and >= 0, got {val}"),
                ));
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::invalid(
                "ranking.blend",
                format!("weights must sum to 1.0, got {sum}"),
            ));
        }
        Ok(())
    }
}

/// Discount applied to per-game value for players with small samples.
///
/// The factor is `max(GP / full_weight_games, MIN / full_weight_minutes)`
/// clipped to `[0, 1]`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SampleStrengthConfig {
    pub enabled: bool,
    pub full_weight_games: f64,
    pub full_weight_minutes: f64,
}

impl Default for SampleStrengthConfig {
    fn default() -> Self {
        SampleStrengthConfig {
            enabled: true,
            full_weight_games: 40.0,
            full_weight_minutes: 500.0,
        }
    }
}

impl SampleStrengthConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        let fields: &[(&str, f64)] = &[
            ("ranking.sample_strength.full_weight_games", self.full_weight_games),
            ("ranking.sample_strength.full_weight_minutes", self.full_weight_minutes),
        ];
        for (name, val) in fields {
            if !val.is_finite() || *val <= 0.0 {
                return Err(ConfigError::invalid(
                    name,
                    format!("must be finite and > 0, got {val}"),
                ));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
