//! Category declustering of score-ordered results.
//!
//! Walks results in score order and builds the output incrementally. The
//! first result of a category becomes an anchor; later results of the same
//! category are pulled up next to it, as long as the anchor still has
//! quota left and is not too far behind the end of the output. Otherwise
//! the result is appended and becomes the category's new anchor.
//!
//! This keeps related results together without letting one category or
//! template take over the top of the list.

use std::collections::HashMap;

use crate::config::AggregateConfig;
use crate::registry::EngineRegistry;
use crate::types::MergedResult;

#[derive(Debug, Clone, Copy)]
struct Cursor {
    /// Output index the next grouped result is inserted at.
    index: usize,
    remaining: usize,
}

/// Grouping key of a result: its template when it has one, otherwise the
/// primary category of its first engine followed by `:`.
pub fn category_key(
    result: &MergedResult,
    registry: &dyn EngineRegistry,
    default_category: &str,
) -> String {
    if let Some(template) = &result.template {
        return template.clone();
    }
    let category = result
        .engines
        .first()
        .and_then(|engine| registry.primary_category(engine))
        .unwrap_or_else(|| default_category.to_string());
    format!("{category}:")
}

/// Reorder score-sorted results so each category clusters around its
/// anchors, within the window and quota of `config`.
pub fn group_results(
    sorted: Vec<MergedResult>,
    registry: &dyn EngineRegistry,
    config: &AggregateConfig,
) -> Vec<MergedResult> {
    let mut grouped: Vec<MergedResult> = Vec::with_capacity(sorted.len());
    let mut cursors: HashMap<String, Cursor> = HashMap::new();

    for result in sorted {
        let key = category_key(&result, registry, &config.default_category);

        match cursors.get(&key).copied() {
            Some(cursor)
                if cursor.remaining > 0
                    && grouped.len().saturating_sub(cursor.index) < config.group_window =>
            {
                grouped.insert(cursor.index, result);
                for other in cursors.values_mut() {
                    if other.index >= cursor.index {
                        other.index += 1;
                    }
                }
                if let Some(current) = cursors.get_mut(&key) {
                    current.remaining -= 1;
                }
            }
            _ => {
                grouped.push(result);
                cursors.insert(
                    key,
                    Cursor {
                        index: grouped.len(),
                        remaining: config.group_quota,
                    },
                );
            }
        }
    }

    grouped
}
