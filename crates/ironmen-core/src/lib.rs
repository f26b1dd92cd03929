// Analytic core: latest-season aggregation, availability modelling,
// cross-source identity matching, and the IronMan ranking. Pure functions
// over in-memory rows; no network, file, or environment access.

pub mod aggregate;
pub mod availability;
pub mod config;
pub mod identity;
pub mod pipeline;
pub mod ranking;
pub mod roster;
pub mod season;
