//! Result aggregation: ingestion, dedup, scoring, grouping.
//!
//! Engine batches flow into a [`container::ResultContainer`], which merges
//! duplicates by URL equivalence and template. Finalization scores each
//! merged result, sorts by score, and declusters categories.

pub mod container;
pub mod dedup;
pub mod grouping;
pub mod infobox;
pub mod scoring;
pub mod search;
pub mod text;
pub mod url_normalize;
