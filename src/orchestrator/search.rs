//! Concurrent fan-out driver: query every source, ingest, finalize.
//!
//! Each source is bounded by the configured deadline. Batches are ingested
//! into one shared [`ResultContainer`] as they arrive; sources that fail or
//! time out are logged and left out, just as if they had never answered.

use std::sync::Arc;
use std::time::Duration;

use crate::config::AggregateConfig;
use crate::engine::EngineSource;
use crate::error::AggregateError;
use crate::registry::EngineRegistry;
use crate::types::AggregatedResults;

use super::container::ResultContainer;

/// Query all `sources` concurrently and aggregate their batches.
///
/// # Pipeline
///
/// 1. Validate `config` and create an empty container
/// 2. Fan out `fetch` calls with [`futures::future::join_all`], each under
///    a [`tokio::time::timeout`] of `config.timeout_seconds`
/// 3. Ingest every successful batch as soon as it arrives
/// 4. Log failed, timed-out, or rejected batches at warn level
/// 5. Finalize once every source has settled
///
/// Must run inside a Tokio runtime with the time driver enabled.
///
/// # Errors
///
/// Returns [`AggregateError::Config`] for an invalid configuration and
/// [`AggregateError::AllEnginesFailed`] only if **every** source fails.
pub async fn aggregate<S: EngineSource>(
    query: &str,
    sources: &[S],
    registry: Arc<dyn EngineRegistry>,
    config: &AggregateConfig,
) -> Result<AggregatedResults, AggregateError> {
    let container = ResultContainer::with_config(registry, config.clone())?;
    let deadline = Duration::from_secs(config.timeout_seconds);

    let futures: Vec<_> = sources
        .iter()
        .map(|source| {
            let container = &container;
            async move {
                let outcome = match tokio::time::timeout(deadline, source.fetch(query)).await {
                    Ok(fetched) => fetched,
                    Err(_) => Err(AggregateError::Timeout(format!(
                        "{} exceeded {}s limit",
                        source.id(),
                        deadline.as_secs()
                    ))),
                };
                let outcome = outcome.and_then(|items| container.ingest(source.id(), items));
                if let Err(err) = &outcome {
                    tracing::warn!(engine = source.id(), error = %err, "engine dropped");
                }
                outcome.map_err(|err| format!("{}: {err}", source.id()))
            }
        })
        .collect();

    let outcomes = futures::future::join_all(futures).await;
    let errors: Vec<String> = outcomes.into_iter().filter_map(Result::err).collect();

    if !sources.is_empty() && errors.len() == sources.len() {
        return Err(AggregateError::AllEnginesFailed(errors.join("; ")));
    }

    Ok(container.finalize())
}
