//! Text measures used when choosing between two candidate snippets.

/// Characters that do not count towards snippet richness.
///
/// Besides the listed punctuation this covers the whole `)`..=`_` block,
/// which takes in ASCII digits, uppercase letters and `* + < = > @ [ ] ^`.
fn is_ignored(c: char) -> bool {
    matches!(
        c,
        ',' | ';' | ':' | '!' | '?' | '.' | '/' | '\\' | ' ' | '(' | ')'..='_'
    )
}

/// Meaningful length of a snippet: its character count once punctuation,
/// spaces, digits and uppercase ASCII are dropped. Absent text has length 0.
///
/// Only useful as a comparison key. A larger value means "more text", not
/// "more accurate".
///
/// # Examples
///
/// ```
/// use metasearch_results::orchestrator::text::content_length;
///
/// assert_eq!(content_length(Some("a, b.")), 2);
/// assert_eq!(content_length(Some("RUST 2024")), 0);
/// assert_eq!(content_length(None), 0);
/// ```
pub fn content_length(text: Option<&str>) -> usize {
    text.map_or(0, |text| {
        text.chars().filter(|&c| !is_ignored(c)).count()
    })
}

/// Collapse every run of spaces, tabs, and newlines into a single space.
pub fn collapse_whitespace(text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if matches!(c, ' ' | '\t' | '\n') {
            if !in_run {
                collapsed.push(' ');
                in_run = true;
            }
        } else {
            collapsed.push(c);
            in_run = false;
        }
    }
    collapsed
}
