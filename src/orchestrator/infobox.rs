//! Merging of infoboxes that share an identifier.

use std::collections::HashSet;

use crate::types::Infobox;

use super::text::content_length;

/// Fold `source` into `target`.
///
/// - Links from `source` are appended unless `target` already had a link
///   with the same `url`.
/// - `img_src` is only filled in if `target` has none.
/// - Attributes from `source` are always appended, even when `target`
///   already shows an attribute with the same label.
/// - `content` becomes whichever text has the larger
///   [`content_length`]; `target` keeps its own on ties.
pub fn merge_infoboxes(target: &mut Infobox, source: Infobox) {
    let known_urls: HashSet<Option<String>> =
        target.urls.iter().map(|link| link.url.clone()).collect();
    target.urls.extend(
        source
            .urls
            .into_iter()
            .filter(|link| !known_urls.contains(&link.url)),
    );

    if target.img_src.is_none() {
        target.img_src = source.img_src;
    }

    // Labels already shown are only reported, never used to drop attributes.
    let seen_labels: HashSet<Option<String>> = target
        .attributes
        .iter()
        .map(|attribute| attribute.label.clone())
        .collect();
    for attribute in source.attributes {
        if seen_labels.contains(&attribute.label) {
            tracing::trace!(
                label = ?attribute.label,
                "infobox attribute label repeated across engines"
            );
        }
        target.attributes.push(attribute);
    }

    if let Some(content) = source.content {
        let replace = target.content.is_none()
            || content_length(Some(&content)) > content_length(target.content.as_deref());
        if replace {
            target.content = Some(content);
        }
    }
}
