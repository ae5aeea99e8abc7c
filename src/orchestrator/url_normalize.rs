//! URL parsing and equivalence for result deduplication.
//!
//! Two result URLs denote the same resource when their network location
//! and query match exactly and their paths match once a single trailing
//! slash is dropped and percent-escapes are decoded. The scheme is ignored,
//! which is what lets an `http` hit merge with its `https` twin.

use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::AggregateError;
use crate::types::ParsedUrl;

/// Scheme assumed for URLs that arrive without one.
pub const DEFAULT_SCHEME: &str = "http";

/// Parse a result URL into its merge key.
///
/// Returns the URL text to keep on the merged result together with its
/// decomposition. The text is the input unchanged unless the scheme was
/// missing, in which case [`DEFAULT_SCHEME`] is prepended and the URL is
/// re-serialised. A root-relative path such as `/docs/page` keeps an empty
/// network location.
///
/// Path, query and fragment are taken from the URL text as written, so
/// `a/../b` and `b` stay distinct.
///
/// # Errors
///
/// Returns [`AggregateError::InvalidUrl`] if the URL cannot be parsed even
/// with the default scheme applied.
///
/// # Examples
///
/// ```
/// use metasearch_results::orchestrator::url_normalize::parse_result_url;
///
/// let (url, parsed) = parse_result_url("example.com/docs?q=1").unwrap();
/// assert_eq!(url, "http://example.com/docs?q=1");
/// assert_eq!(parsed.scheme, "http");
/// assert_eq!(parsed.query, "q=1");
/// ```
pub fn parse_result_url(raw: &str) -> Result<(String, ParsedUrl), AggregateError> {
    match Url::parse(raw) {
        Ok(parsed) => Ok((raw.to_string(), decompose(&parsed, raw))),
        Err(url::ParseError::RelativeUrlWithoutBase) if is_root_relative(raw) => {
            Ok(root_relative(raw))
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let candidate = format!("{DEFAULT_SCHEME}://{}", raw.trim_start_matches('/'));
            let parsed = Url::parse(&candidate).map_err(|err| invalid(raw, &err))?;
            Ok((parsed.to_string(), decompose(&parsed, &candidate)))
        }
        Err(err) => Err(invalid(raw, &err)),
    }
}

/// Returns `true` if both URLs denote the same resource.
///
/// Network location and query must match exactly. Paths are compared after
/// removing one trailing `/` from each and percent-decoding.
pub fn urls_equivalent(a: &ParsedUrl, b: &ParsedUrl) -> bool {
    if a.netloc != b.netloc || a.query != b.query {
        return false;
    }
    decoded_path(&a.path) == decoded_path(&b.path)
}

/// Display host of a network location: a leading `www.` is dropped and
/// punycode labels are shown in Unicode.
pub fn display_host(netloc: &str) -> String {
    let netloc = netloc.strip_prefix("www.").unwrap_or(netloc);
    let host_start = netloc.rfind('@').map_or(0, |at| at + 1);
    let rest = &netloc[host_start..];
    let host_end = if rest.starts_with('[') {
        netloc.len()
    } else {
        rest.find(':').map_or(netloc.len(), |colon| host_start + colon)
    };
    let host = &netloc[host_start..host_end];
    if !host.split('.').any(|label| label.starts_with("xn--")) {
        return netloc.to_string();
    }

    let (unicode, outcome) = idna::domain_to_unicode(host);
    if let Err(err) = outcome {
        tracing::trace!(host, error = ?err, "keeping ASCII form of host");
        return netloc.to_string();
    }
    format!("{}{unicode}{}", &netloc[..host_start], &netloc[host_end..])
}

fn decoded_path(path: &str) -> String {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    percent_decode_str(trimmed).decode_utf8_lossy().into_owned()
}

fn is_root_relative(raw: &str) -> bool {
    raw.starts_with('/') && !raw.starts_with("//")
}

fn root_relative(raw: &str) -> (String, ParsedUrl) {
    let (path, query, fragment) = split_tail(raw);
    let parsed = ParsedUrl {
        scheme: DEFAULT_SCHEME.to_string(),
        netloc: String::new(),
        path: path.to_string(),
        query: query.to_string(),
        fragment: fragment.to_string(),
    };
    (format!("{DEFAULT_SCHEME}://{raw}"), parsed)
}

/// Split `path?query#fragment` as written.
fn split_tail(tail: &str) -> (&str, &str, &str) {
    let (rest, fragment) = tail.split_once('#').unwrap_or((tail, ""));
    let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
    (path, query, fragment)
}

/// Text following the authority of a hierarchical URL.
fn after_authority<'a>(url: &Url, text: &'a str) -> Option<&'a str> {
    if !url.has_authority() {
        return None;
    }
    let (_, rest) = text.split_once("://")?;
    let start = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    Some(&rest[start..])
}

fn decompose(url: &Url, text: &str) -> ParsedUrl {
    let mut netloc = String::new();
    if !url.username().is_empty() {
        netloc.push_str(url.username());
        if let Some(password) = url.password() {
            netloc.push(':');
            netloc.push_str(password);
        }
        netloc.push('@');
    }
    if let Some(host) = url.host_str() {
        netloc.push_str(host);
    }
    if let Some(port) = url.port() {
        netloc.push(':');
        netloc.push_str(&port.to_string());
    }

    let (path, query, fragment) = match after_authority(url, text) {
        Some(tail) => split_tail(tail),
        None => (
            url.path(),
            url.query().unwrap_or_default(),
            url.fragment().unwrap_or_default(),
        ),
    };

    ParsedUrl {
        scheme: url.scheme().to_string(),
        netloc,
        path: path.to_string(),
        query: query.to_string(),
        fragment: fragment.to_string(),
    }
}

fn invalid(raw: &str, err: &url::ParseError) -> AggregateError {
    AggregateError::InvalidUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    }
}
