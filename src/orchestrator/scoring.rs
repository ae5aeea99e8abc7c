//! Weighted scoring with rank decay for merged results.
//!
//! Formula:
//!
//! ```text
//! weight      = product of the weights of the distinct contributing engines
//! occurrences = number of positions
//! score       = sum over positions p of (occurrences * weight) / p
//! ```
//!
//! Results confirmed by several engines, or ranked near the top by any of
//! them, score higher. The `1 / p` term makes every rank count less than
//! the one above it.

use crate::registry::EngineRegistry;
use crate::types::MergedResult;

/// Calculate the score of a merged result.
///
/// Engines unknown to `registry` weigh [`DEFAULT_WEIGHT`](crate::registry::DEFAULT_WEIGHT).
/// A result without positions scores 0.
pub fn calculate_score(result: &MergedResult, registry: &dyn EngineRegistry) -> f64 {
    let weight: f64 = result
        .distinct_engines()
        .into_iter()
        .map(|engine| registry.weight(engine))
        .product();
    let occurrences = result.positions.len() as f64;

    result
        .positions
        .iter()
        .map(|&position| occurrences * weight / position as f64)
        .sum()
}

/// Score every result in place and credit each score to the engines that
/// contributed to it, once per contribution.
pub fn score_results(results: &mut [MergedResult], registry: &dyn EngineRegistry) {
    for result in results.iter_mut() {
        result.score = calculate_score(result, registry);
        for engine in &result.engines {
            registry.record_score(engine, result.score);
        }
    }
}
