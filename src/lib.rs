//! # metasearch-results
//!
//! Aggregation core for a metasearch engine: folds the result batches of
//! many independent search engines for one query into a single
//! deduplicated, scored, and display-ordered list, plus the side channels
//! engines report alongside (suggestions, answers, infoboxes, and total-hit
//! estimates).
//!
//! ## Design
//!
//! - One [`ResultContainer`] per query, fed one batch per engine, safely
//!   from several threads at once
//! - Duplicates are detected structurally: same host and query, same path
//!   modulo a trailing slash and percent-encoding, same template
//! - `https` wins over `http`; the richest snippet wins over shorter ones
//! - Score = engine weights × occurrences × rank decay
//! - A declustering pass stops one category from crowding the top
//!
//! Engines themselves, their HTTP plumbing, and presentation live outside
//! this crate. Engine weights and categories come from an injected
//! [`EngineRegistry`].

pub mod config;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod types;

use std::sync::Arc;

pub use config::AggregateConfig;
pub use engine::EngineSource;
pub use error::{AggregateError, Result};
pub use orchestrator::container::ResultContainer;
pub use registry::{EngineRegistry, EngineSettings, EngineStats, InMemoryRegistry};
pub use types::{
    AggregatedResults, Infobox, InfoboxAttribute, InfoboxUrl, MergedResult, ParsedUrl, RawItem,
    RawResult, RawUrl,
};

/// Query every source concurrently and aggregate their batches.
///
/// Thin wrapper around [`orchestrator::search::aggregate`].
///
/// # Errors
///
/// Returns [`AggregateError::AllEnginesFailed`] if every source fails.
/// Individual failures are logged but do not fail the aggregation as long
/// as at least one source delivers a batch.
///
/// # Examples
///
/// ```no_run
/// # use std::sync::Arc;
/// # use metasearch_results::{AggregateConfig, EngineSource, InMemoryRegistry};
/// # async fn example<S: EngineSource>(sources: &[S]) -> metasearch_results::Result<()> {
/// let registry = Arc::new(InMemoryRegistry::from_json(
///     r#"{"wikipedia": {"weight": 1.5, "categories": ["general"]}}"#,
/// )?);
/// let output = metasearch_results::aggregate("rust", sources, registry, &AggregateConfig::default()).await?;
/// for result in &output.results {
///     println!("{:.2} {}", result.score, result.url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn aggregate<S: EngineSource>(
    query: &str,
    sources: &[S],
    registry: Arc<dyn EngineRegistry>,
    config: &AggregateConfig,
) -> Result<AggregatedResults> {
    orchestrator::search::aggregate(query, sources, registry, config).await
}

/// Aggregate batches that were already collected, with the default
/// configuration. Batches are ingested in the order given.
///
/// # Errors
///
/// Returns the first ingestion error; see [`ResultContainer::ingest`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use metasearch_results::{aggregate_batches, InMemoryRegistry, RawItem, RawResult};
///
/// let registry = Arc::new(InMemoryRegistry::new());
/// let output = aggregate_batches(
///     registry,
///     vec![
///         ("a".to_string(), vec![RawItem::Result(RawResult::new("http://example.com/p"))]),
///         ("b".to_string(), vec![RawItem::Result(RawResult::new("https://example.com/p/"))]),
///     ],
/// )
/// .unwrap();
/// assert_eq!(output.results.len(), 1);
/// assert_eq!(output.results[0].url, "https://example.com/p/");
/// ```
pub fn aggregate_batches(
    registry: Arc<dyn EngineRegistry>,
    batches: Vec<(String, Vec<RawItem>)>,
) -> Result<AggregatedResults> {
    let container = ResultContainer::new(registry);
    for (engine, items) in batches {
        container.ingest(&engine, items)?;
    }
    Ok(container.finalize())
}
