//! Result deduplication by URL equivalence and template.
//!
//! A raw result is first turned into a single-contribution
//! [`MergedResult`] by [`prepare_result`]. [`merge_into`] then either folds
//! it into the first existing entry that denotes the same resource with the
//! same template, or appends it.

use serde_json::Map;

use crate::error::AggregateError;
use crate::types::{MergedResult, RawResult};

use super::text::{collapse_whitespace, content_length};
use super::url_normalize::{display_host, parse_result_url, urls_equivalent};

/// What [`merge_into`] did with a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Folded into the existing entry at this index.
    Merged(usize),
    /// Appended as a new entry at this index.
    Appended(usize),
}

/// Turn one raw result into a merge candidate contributed by `engine` at
/// the 1-based `position`.
///
/// Decodes the URL, applies the default scheme, derives the display host,
/// and collapses whitespace in the content.
///
/// # Errors
///
/// Returns [`AggregateError::InvalidUrl`] if the URL cannot be parsed.
pub fn prepare_result(
    raw: RawResult,
    engine: &str,
    position: usize,
) -> Result<MergedResult, AggregateError> {
    let (url, parsed_url) = parse_result_url(&raw.url.into_text())?;
    let host = display_host(&parsed_url.netloc);
    let content = raw.content.map(|content| collapse_whitespace(&content));

    Ok(MergedResult {
        url,
        parsed_url,
        host,
        title: raw.title,
        content,
        template: raw.template,
        engines: vec![engine.to_string()],
        positions: vec![position],
        score: 0.0,
        extra: raw.extra,
    })
}

/// Merge `candidate` into `merged`.
///
/// The first entry with an equivalent URL and an equal template absorbs the
/// candidate:
///
/// - its content is replaced if the candidate's is strictly richer
///   (see [`content_length`]);
/// - the candidate's positions and engines are appended;
/// - its `url` and `parsed_url` are replaced if it is not `https` but the
///   candidate is.
///
/// Otherwise the candidate is appended unchanged.
pub fn merge_into(merged: &mut Vec<MergedResult>, candidate: MergedResult) -> MergeOutcome {
    let duplicate = merged.iter().position(|existing| {
        urls_equivalent(&existing.parsed_url, &candidate.parsed_url)
            && existing.template == candidate.template
    });

    let Some(index) = duplicate else {
        merged.push(candidate);
        return MergeOutcome::Appended(merged.len() - 1);
    };

    let existing = &mut merged[index];
    if content_length(candidate.content.as_deref()) > content_length(existing.content.as_deref())
    {
        existing.content = candidate.content;
    }
    existing.positions.extend(candidate.positions);
    existing.engines.extend(candidate.engines);

    if existing.parsed_url.scheme != "https" && candidate.parsed_url.scheme == "https" {
        existing.url = candidate.url;
        existing.parsed_url = candidate.parsed_url;
    }

    fill_missing_extra(&mut existing.extra, candidate.extra);
    MergeOutcome::Merged(index)
}

/// Keys only the later contribution carries (a thumbnail, a date) are kept.
fn fill_missing_extra(
    existing: &mut Map<String, serde_json::Value>,
    incoming: Map<String, serde_json::Value>,
) {
    for (key, value) in incoming {
        existing.entry(key).or_insert(value);
    }
}
