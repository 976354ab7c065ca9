use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::endpoint::path::EndpointPath;
use crate::error::Error;

/// The HTTP methods the dispatch pipeline understands.
///
/// Whether an invocation carries a body is decided by this enumeration alone,
/// never by argument counts or runtime types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// `true` for `POST`/`PUT`/`PATCH`, the methods whose invocation takes a
    /// request body.
    pub fn takes_body(self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }

    pub(crate) fn as_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Per-call query parameters, before normalization.
///
/// Either a pre-built query string used verbatim, or an ordered key→value
/// mapping that the pipeline normalizes (see [`Query`]).
#[derive(Debug, Clone, PartialEq)]
pub enum QueryInput {
    /// A pre-built query string, taken as-is (without the leading `?`).
    Raw(String),
    /// Ordered key→value pairs. `Value::Null` entries are dropped during
    /// normalization, everything else is stringified.
    Map(Vec<(String, Value)>),
}

impl From<&str> for QueryInput {
    fn from(raw: &str) -> Self { QueryInput::Raw(raw.to_owned()) }
}

impl From<String> for QueryInput {
    fn from(raw: String) -> Self { QueryInput::Raw(raw) }
}

impl<K, V> FromIterator<(K, V)> for QueryInput
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        QueryInput::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl QueryInput {
    /// Builds the mapping form from ordered key→value pairs.
    pub fn map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> QueryInput
    where
        K: Into<String>,
        V: Into<Value>,
    {
        pairs.into_iter().collect()
    }

    /// Drops `null` entries and stringifies the remaining values, producing
    /// the normalized representation handed to query morph hooks and the
    /// requester. Raw query strings pass through untouched.
    pub(crate) fn normalize(self) -> Query {
        match self {
            QueryInput::Raw(raw) => Query::Raw(raw),
            QueryInput::Map(pairs) => Query::Pairs(
                pairs
                    .into_iter()
                    .filter(|(_, value)| !value.is_null())
                    .map(|(key, value)| (key, stringify_value(value)))
                    .collect(),
            ),
        }
    }
}

fn stringify_value(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// The normalized query representation carried by a [`RestRequest`].
///
/// `Pairs` is ordered and multi-valued; `Raw` is an opaque pre-built string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Raw(String),
    Pairs(Vec<(String, String)>),
}

impl Default for Query {
    fn default() -> Self { Query::Pairs(Vec::new()) }
}

impl Query {
    pub fn is_empty(&self) -> bool {
        match self {
            Query::Raw(raw) => raw.is_empty(),
            Query::Pairs(pairs) => pairs.is_empty(),
        }
    }

    /// First value for `key`, if any. Raw queries are opaque and yield `None`.
    pub fn get(&self, key: &str) -> Option<&str> {
        match self {
            Query::Raw(_) => None,
            Query::Pairs(pairs) => {
                pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
            }
        }
    }

    /// Replaces every value for `key` with a single entry, appending if the
    /// key is absent. No-op on raw queries.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        if let Query::Pairs(pairs) = self {
            pairs.retain(|(k, _)| k != key);
            pairs.push((key.to_owned(), value.into()));
        }
    }

    /// Appends one more value for `key`. No-op on raw queries.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        if let Query::Pairs(pairs) = self {
            pairs.push((key.into(), value.into()));
        }
    }

    pub fn pairs(&self) -> Option<&[(String, String)]> {
        match self {
            Query::Raw(_) => None,
            Query::Pairs(pairs) => Some(pairs),
        }
    }
}

/// Optional per-call settings passed to an invocation alongside the body.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub query: Option<QueryInput>,
    pub headers: Option<HeaderMap>,
    /// Fields the pipeline does not consume; copied onto the request
    /// descriptor verbatim so a custom requester can pick them up (e.g. a
    /// cancellation key). The core never interprets them.
    pub extra: serde_json::Map<String, Value>,
}

impl CallOptions {
    pub fn new() -> CallOptions { CallOptions::default() }

    #[must_use]
    pub fn query(mut self, query: impl Into<QueryInput>) -> CallOptions {
        self.query = Some(query.into());
        self
    }

    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> CallOptions {
        self.headers = Some(headers);
        self
    }

    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> CallOptions {
        self.headers.get_or_insert_with(HeaderMap::new).insert(name, value);
        self
    }

    #[must_use]
    pub fn extra(mut self, key: impl Into<String>, value: Value) -> CallOptions {
        self.extra.insert(key.into(), value);
        self
    }
}

/// The canonical request descriptor, built fresh for every invocation and
/// handed to the [`Requester`].
#[derive(Debug, Clone)]
pub struct RestRequest {
    pub method: Method,
    pub path: EndpointPath,
    pub body: Option<Value>,
    pub query: Query,
    pub headers: HeaderMap,
    /// Pass-through of unconsumed [`CallOptions::extra`] fields.
    pub extra: serde_json::Map<String, Value>,
}

impl RestRequest {
    /// The rendered endpoint path, e.g. `foo/1/name`.
    pub fn endpoint(&self) -> String { self.path.render() }
}

/// The transport contract: turn a [`RestRequest`] into a result value.
///
/// This is the core's only required collaborator. Failures are surfaced to
/// the invoking caller unchanged; the pipeline adds no translation, retry or
/// suppression. [`DefaultRequester`](crate::requester::DefaultRequester) is
/// the reference implementation.
#[async_trait]
pub trait Requester: Send + Sync {
    async fn send(&self, request: RestRequest) -> Result<Value, Error>;
}
