// Batch application around ironmen-core: config loading, CSV snapshot
// ingestion, and report output. Exposed as a library so integration tests
// can drive the same code paths as the binary.

pub mod config;
pub mod report;
pub mod sources;
