//! Core types for raw engine items, infoboxes, and merged results.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AggregateError;

/// A result URL as an engine produced it: usually text, occasionally raw
/// bytes that still need decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawUrl {
    /// Already-decoded URL text.
    Text(String),
    /// Undecoded bytes, expected to be UTF-8.
    Bytes(Vec<u8>),
}

impl RawUrl {
    /// Decode into text.
    ///
    /// Invalid UTF-8 is not an error, but the URL is altered: each invalid
    /// sequence is replaced with U+FFFD, so the returned text no longer
    /// matches the original bytes.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Bytes(bytes) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(err) => {
                    tracing::debug!(
                        error = %err.utf8_error(),
                        "result URL is not valid UTF-8, replacing invalid sequences"
                    );
                    String::from_utf8_lossy(err.as_bytes()).into_owned()
                }
            },
        }
    }
}

impl From<&str> for RawUrl {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawUrl {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for RawUrl {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

/// An ordinary search hit as returned by one engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    /// Link to the resource. Required.
    pub url: RawUrl,
    /// Page title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Snippet describing the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Display-type tag; overrides the engine category for grouping and
    /// takes part in duplicate detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Producing engine, as reported by the engine itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    /// Any other fields the engine attached; carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawResult {
    /// Create a result with only a URL set.
    pub fn new(url: impl Into<RawUrl>) -> Self {
        Self {
            url: url.into(),
            title: None,
            content: None,
            template: None,
            engine: None,
            extra: Map::new(),
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the content snippet.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the template tag.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Set the reporting engine.
    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }
}

/// A link attached to an infobox.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfoboxUrl {
    /// Target of the link; the identity used when merging infoboxes.
    #[serde(default)]
    pub url: Option<String>,
    /// Link text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InfoboxUrl {
    /// Create a link with a title.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            title: Some(title.into()),
            extra: Map::new(),
        }
    }
}

/// A labelled fact shown in an infobox.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfoboxAttribute {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InfoboxAttribute {
    /// Create a textual attribute.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            value: Some(Value::String(value.into())),
            extra: Map::new(),
        }
    }
}

/// A structured knowledge-panel record.
///
/// Infoboxes from different engines that share an `id` are merged into one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Infobox {
    /// Identity used to merge infoboxes across engines. Infoboxes without
    /// an id are never merged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub urls: Vec<InfoboxUrl>,
    /// Image shown with the infobox; the first one seen wins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_src: Option<String>,
    #[serde(default)]
    pub attributes: Vec<InfoboxAttribute>,
    /// Descriptive text; the richest candidate wins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One item of an engine batch, decoded once into its shape.
///
/// Decoding from JSON checks the keys `suggestion`, `answer`, `infobox`,
/// and `number_of_results` in that order; anything else is an ordinary
/// result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum RawItem {
    /// A spelling or query suggestion.
    Suggestion(String),
    /// A direct answer to the query.
    Answer(String),
    /// A knowledge panel.
    Infobox(Infobox),
    /// The engine's estimate of its total hit count.
    NumberOfResults(u64),
    /// An ordinary search hit.
    Result(RawResult),
}

impl TryFrom<Value> for RawItem {
    type Error = AggregateError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut map) = value else {
            return Err(AggregateError::Decode(
                "engine item must be a JSON object".into(),
            ));
        };

        if let Some(suggestion) = map.remove("suggestion") {
            return Ok(Self::Suggestion(expect_string(suggestion, "suggestion")?));
        }
        if let Some(answer) = map.remove("answer") {
            return Ok(Self::Answer(expect_string(answer, "answer")?));
        }
        if let Some(infobox) = map.remove("infobox") {
            return Ok(Self::Infobox(serde_json::from_value(infobox)?));
        }
        if let Some(count) = map.remove("number_of_results") {
            return Ok(Self::NumberOfResults(serde_json::from_value(count)?));
        }
        Ok(Self::Result(serde_json::from_value(Value::Object(map))?))
    }
}

fn expect_string(value: Value, key: &str) -> Result<String, AggregateError> {
    match value {
        Value::String(text) => Ok(text),
        other => Err(AggregateError::Decode(format!(
            "`{key}` must be a string, got {other}"
        ))),
    }
}

/// Decomposition of a result URL used as the merge key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedUrl {
    /// Lowercase scheme; `http` when the engine gave none.
    pub scheme: String,
    /// `[user[:password]@]host[:port]`.
    pub netloc: String,
    pub path: String,
    /// Query string without the leading `?`, empty when absent.
    pub query: String,
    /// Fragment without the leading `#`, empty when absent.
    pub fragment: String,
}

/// The deduplicated record for one logical resource across engines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedResult {
    /// Link to the resource, upgraded to `https` when any engine offered it.
    pub url: String,
    pub parsed_url: ParsedUrl,
    /// `netloc` with a leading `www.` removed.
    pub host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Whitespace-collapsed snippet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Contributing engines, one entry per contribution.
    pub engines: Vec<String>,
    /// 1-based ranks, one per contribution, in contribution order.
    pub positions: Vec<usize>,
    /// Populated during finalization.
    pub score: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MergedResult {
    /// Contributing engines without repeats, in first-contribution order.
    pub fn distinct_engines(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.engines
            .iter()
            .map(String::as_str)
            .filter(|engine| seen.insert(*engine))
            .collect()
    }
}

/// Everything one aggregation produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedResults {
    /// Scored, sorted, and declustered results.
    pub results: Vec<MergedResult>,
    pub infoboxes: Vec<Infobox>,
    pub suggestions: BTreeSet<String>,
    pub answers: BTreeSet<String>,
    /// Largest total-hit estimate reported by any engine.
    pub number_of_results: u64,
    /// Number of merged results before grouping.
    pub merged_count: usize,
}
