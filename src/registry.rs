//! Engine registry: static per-engine settings and cumulative usage counters.
//!
//! The registry outlives any single aggregation. A
//! [`ResultContainer`](crate::orchestrator::container::ResultContainer)
//! reads engine weights and categories from it and reports three counters
//! back: searches answered, results contributed, and score earned.
//! Containers never add or remove engines.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::AggregateError;

/// Weight of an engine that does not configure one.
pub const DEFAULT_WEIGHT: f64 = 1.0;

fn default_weight() -> f64 {
    DEFAULT_WEIGHT
}

/// Static settings for one engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Multiplier applied to the score of every result this engine
    /// contributes to.
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Categories the engine serves; the first one is its primary category.
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            weight: DEFAULT_WEIGHT,
            categories: Vec::new(),
        }
    }
}

impl EngineSettings {
    /// Settings with an explicit weight and category list.
    pub fn new(weight: f64, categories: &[&str]) -> Self {
        Self {
            weight,
            categories: categories.iter().map(|c| (*c).to_string()).collect(),
        }
    }
}

/// Cumulative usage counters for one engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EngineStats {
    /// Batches ingested from this engine.
    pub search_count: u64,
    /// Ordinary results contributed across all batches.
    pub result_count: u64,
    /// Sum of the scores of every merged result this engine contributed to.
    pub score_count: f64,
}

/// Read access to engine settings plus the counter updates a container
/// performs.
///
/// Implementations must be `Send + Sync`; containers call the `record_*`
/// methods from whichever thread is ingesting.
pub trait EngineRegistry: Send + Sync {
    /// Settings for `engine`, or `None` if the engine is unknown.
    fn settings(&self, engine: &str) -> Option<EngineSettings>;

    /// Count one answered search and `result_count` ordinary results.
    fn record_search(&self, engine: &str, result_count: usize);

    /// Add `score` to the engine's cumulative score.
    fn record_score(&self, engine: &str, score: f64);

    /// Weight of `engine`, [`DEFAULT_WEIGHT`] if unknown.
    fn weight(&self, engine: &str) -> f64 {
        self.settings(engine).map_or(DEFAULT_WEIGHT, |s| s.weight)
    }

    /// First declared category of `engine`, if any.
    fn primary_category(&self, engine: &str) -> Option<String> {
        self.settings(engine)
            .and_then(|s| s.categories.into_iter().next())
    }
}

/// Registry backed by in-memory maps.
///
/// Settings are fixed at construction; counters live behind a [`Mutex`]
/// and only exist for engines that have settings.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    settings: HashMap<String, EngineSettings>,
    stats: Mutex<HashMap<String, EngineStats>>,
}

impl InMemoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an engine.
    pub fn with_engine(mut self, engine: impl Into<String>, settings: EngineSettings) -> Self {
        let engine = engine.into();
        self.stats
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .insert(engine.clone(), EngineStats::default());
        self.settings.insert(engine, settings);
        self
    }

    /// Build a registry from a JSON object mapping engine ids to settings,
    /// e.g. `{"wikipedia": {"weight": 1.5, "categories": ["general"]}}`.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::Decode`] for malformed JSON and
    /// [`AggregateError::Config`] for a negative or non-finite weight.
    pub fn from_json(json: &str) -> Result<Self, AggregateError> {
        let engines: HashMap<String, EngineSettings> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for (engine, settings) in engines {
            if !settings.weight.is_finite() || settings.weight < 0.0 {
                return Err(AggregateError::Config(format!(
                    "weight of engine {engine} must be a finite, non-negative number"
                )));
            }
            registry = registry.with_engine(engine, settings);
        }
        Ok(registry)
    }

    /// Current counters for `engine`, or `None` if the engine is unknown.
    pub fn stats(&self, engine: &str) -> Option<EngineStats> {
        self.stats
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(engine)
            .copied()
    }

    /// Counters for every known engine, sorted by engine id.
    pub fn stats_report(&self) -> Vec<(String, EngineStats)> {
        let mut report: Vec<_> = self
            .stats
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(engine, stats)| (engine.clone(), *stats))
            .collect();
        report.sort_by(|a, b| a.0.cmp(&b.0));
        report
    }

    fn update(&self, engine: &str, apply: impl FnOnce(&mut EngineStats)) {
        let mut stats = self.stats.lock().unwrap_or_else(|e| e.into_inner());
        match stats.get_mut(engine) {
            Some(entry) => apply(entry),
            None => tracing::trace!(engine, "ignoring counter update for unknown engine"),
        }
    }
}

impl EngineRegistry for InMemoryRegistry {
    fn settings(&self, engine: &str) -> Option<EngineSettings> {
        self.settings.get(engine).cloned()
    }

    fn record_search(&self, engine: &str, result_count: usize) {
        self.update(engine, |stats| {
            stats.search_count += 1;
            stats.result_count += result_count as u64;
        });
    }

    fn record_score(&self, engine: &str, score: f64) {
        self.update(engine, |stats| stats.score_count += score);
    }
}
