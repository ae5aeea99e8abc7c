//! The per-query result container.
//!
//! One [`ResultContainer`] lives for one query. Every engine hands its
//! batch to [`ResultContainer::ingest`], possibly from several threads at
//! once; once every engine has reported (or been given up on),
//! [`ResultContainer::finalize`] scores, sorts, and declusters the merged
//! results.
//!
//! All mutation of one ingestion call, from side-channel updates through
//! the last merge, happens under a single lock owned by the container, so
//! concurrent batches never interleave.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::AggregateConfig;
use crate::error::AggregateError;
use crate::registry::EngineRegistry;
use crate::types::{AggregatedResults, Infobox, MergedResult, RawItem, RawResult};

use super::dedup::{merge_into, prepare_result, MergeOutcome};
use super::grouping::group_results;
use super::infobox::merge_infoboxes;
use super::scoring::score_results;

/// Accumulates the results of every engine answering one query.
pub struct ResultContainer {
    registry: Arc<dyn EngineRegistry>,
    config: AggregateConfig,
    state: Mutex<ContainerState>,
}

#[derive(Debug, Default)]
struct ContainerState {
    /// Raw ordinary results per engine, kept for statistics.
    results: HashMap<String, Vec<RawResult>>,
    merged_results: Vec<MergedResult>,
    infoboxes: Vec<Infobox>,
    infobox_ids: HashMap<String, usize>,
    suggestions: BTreeSet<String>,
    answers: BTreeSet<String>,
    number_of_results: u64,
}

impl ContainerState {
    fn add_infobox(&mut self, infobox: Infobox) {
        let existing = infobox
            .id
            .as_ref()
            .and_then(|id| self.infobox_ids.get(id).copied());
        if let Some(index) = existing {
            merge_infoboxes(&mut self.infoboxes[index], infobox);
            return;
        }
        if let Some(id) = &infobox.id {
            self.infobox_ids.insert(id.clone(), self.infoboxes.len());
        }
        self.infoboxes.push(infobox);
    }
}

/// One engine batch split by item shape, with every ordinary result
/// already validated.
#[derive(Default)]
struct Batch {
    suggestions: Vec<String>,
    answers: Vec<String>,
    infoboxes: Vec<Infobox>,
    number_of_results: Option<u64>,
    raw: Vec<RawResult>,
    candidates: Vec<MergedResult>,
}

impl Batch {
    /// Ordinary results are numbered by their place in the whole batch, so
    /// side-channel items before them still take up a position.
    fn split(engine: &str, items: Vec<RawItem>) -> Result<Self, AggregateError> {
        let mut batch = Self::default();
        for (index, item) in items.into_iter().enumerate() {
            match item {
                RawItem::Suggestion(suggestion) => batch.suggestions.push(suggestion),
                RawItem::Answer(answer) => batch.answers.push(answer),
                RawItem::Infobox(infobox) => batch.infoboxes.push(infobox),
                RawItem::NumberOfResults(count) => {
                    batch.number_of_results = batch.number_of_results.max(Some(count));
                }
                RawItem::Result(raw) => {
                    let candidate = prepare_result(raw.clone(), engine, index + 1)?;
                    batch.raw.push(raw);
                    batch.candidates.push(candidate);
                }
            }
        }
        Ok(batch)
    }
}

impl ResultContainer {
    /// Create an empty container with the default configuration.
    pub fn new(registry: Arc<dyn EngineRegistry>) -> Self {
        Self {
            registry,
            config: AggregateConfig::default(),
            state: Mutex::new(ContainerState::default()),
        }
    }

    /// Create an empty container with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::Config`] if `config` is invalid.
    pub fn with_config(
        registry: Arc<dyn EngineRegistry>,
        config: AggregateConfig,
    ) -> Result<Self, AggregateError> {
        config.validate()?;
        Ok(Self {
            registry,
            config,
            state: Mutex::new(ContainerState::default()),
        })
    }

    /// Fold one engine's batch into the container.
    ///
    /// Suggestions and answers join their sets, infoboxes are merged by id,
    /// total-hit estimates keep the running maximum, and ordinary results
    /// are deduplicated against everything ingested so far. The engine's
    /// search and result counters are updated in the registry.
    ///
    /// Safe to call concurrently from several threads; each call is applied
    /// atomically.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::InvalidUrl`] if any ordinary result has an
    /// unparseable URL. The whole batch is then rejected and the container
    /// is left unchanged.
    pub fn ingest(&self, engine: &str, items: Vec<RawItem>) -> Result<(), AggregateError> {
        let batch = Batch::split(engine, items)?;
        let mut state = self.lock_state();

        state.suggestions.extend(batch.suggestions);
        state.answers.extend(batch.answers);
        for infobox in batch.infoboxes {
            state.add_infobox(infobox);
        }
        if let Some(count) = batch.number_of_results {
            state.number_of_results = state.number_of_results.max(count);
        }

        self.registry.record_search(engine, batch.candidates.len());

        if batch.candidates.is_empty() {
            tracing::debug!(engine, "engine batch carried no ordinary results");
            return Ok(());
        }

        state
            .results
            .entry(engine.to_string())
            .or_default()
            .extend(batch.raw);

        let count = batch.candidates.len();
        let mut merged = 0usize;
        for candidate in batch.candidates {
            match merge_into(&mut state.merged_results, candidate) {
                MergeOutcome::Merged(index) => {
                    merged += 1;
                    tracing::trace!(engine, index, "merged duplicate result");
                }
                MergeOutcome::Appended(index) => {
                    tracing::trace!(engine, index, "appended new result");
                }
            }
        }
        tracing::debug!(engine, count, merged, "ingested engine batch");
        Ok(())
    }

    /// Decode a JSON array of engine items and ingest it.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::Decode`] if `items` is not an array of
    /// recognisable items, plus the errors of [`ingest`](Self::ingest).
    pub fn ingest_json(&self, engine: &str, items: serde_json::Value) -> Result<(), AggregateError> {
        let items: Vec<RawItem> = serde_json::from_value(items)?;
        self.ingest(engine, items)
    }

    /// Number of distinct merged results so far.
    pub fn merged_count(&self) -> usize {
        self.lock_state().merged_results.len()
    }

    /// Suggestions collected so far.
    pub fn suggestions(&self) -> BTreeSet<String> {
        self.lock_state().suggestions.clone()
    }

    /// Answers collected so far.
    pub fn answers(&self) -> BTreeSet<String> {
        self.lock_state().answers.clone()
    }

    /// Infoboxes collected so far, in first-seen order.
    pub fn infoboxes(&self) -> Vec<Infobox> {
        self.lock_state().infoboxes.clone()
    }

    /// Largest total-hit estimate reported so far.
    pub fn number_of_results(&self) -> u64 {
        self.lock_state().number_of_results
    }

    /// Number of ordinary results `engine` contributed.
    pub fn engine_result_count(&self, engine: &str) -> usize {
        self.lock_state().results.get(engine).map_or(0, Vec::len)
    }

    /// Score, sort, and decluster the merged results.
    ///
    /// Consumes the container: no ingestion can happen afterwards. A
    /// container shared between workers must be unwrapped from its `Arc`
    /// first, which only succeeds once every worker is done.
    ///
    /// Results are sorted by descending score, ties keeping first-seen
    /// order, then grouped by category (see
    /// [`group_results`](super::grouping::group_results)).
    pub fn finalize(self) -> AggregatedResults {
        let Self {
            registry,
            config,
            state,
        } = self;
        let state = state.into_inner().unwrap_or_else(|e| e.into_inner());

        let mut results = state.merged_results;
        let merged_count = results.len();

        score_results(&mut results, registry.as_ref());
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let results = group_results(results, registry.as_ref(), &config);

        tracing::debug!(
            merged_count,
            infoboxes = state.infoboxes.len(),
            suggestions = state.suggestions.len(),
            answers = state.answers.len(),
            "finalized results"
        );

        AggregatedResults {
            results,
            infoboxes: state.infoboxes,
            suggestions: state.suggestions,
            answers: state.answers,
            number_of_results: state.number_of_results,
            merged_count,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ContainerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for ResultContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultContainer")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
