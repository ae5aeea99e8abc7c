//! Trait definition for pluggable engine sources.
//!
//! Fetching and parsing engine responses happens outside this crate. An
//! [`EngineSource`] is the seam through which those backends hand their
//! already-parsed batches to [`aggregate`](crate::orchestrator::search::aggregate).

use crate::error::AggregateError;
use crate::types::RawItem;

/// A search backend that produces one batch of raw items per query.
///
/// All implementations must be `Send + Sync` so sources can be queried
/// concurrently.
pub trait EngineSource: Send + Sync {
    /// Identifier of this engine in the [`EngineRegistry`](crate::registry::EngineRegistry).
    fn id(&self) -> &str;

    /// Run `query` against the backend and return its batch in rank order.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError`] if the backend cannot produce a batch.
    fn fetch(
        &self,
        query: &str,
    ) -> impl std::future::Future<Output = Result<Vec<RawItem>, AggregateError>> + Send;
}
