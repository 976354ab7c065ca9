use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use thiserror::Error;

/// Boxed error type for values produced by user code (morph hooks, base URL
/// resolvers, custom requesters). The dispatch pipeline never inspects these,
/// it only carries them back to the caller.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// All failures surfaced by this crate.
///
/// Nothing in here is retried or suppressed; every variant is handed to the
/// caller exactly once, unchanged.
#[derive(Debug, Error)]
pub enum Error {
    /// A path segment was empty or contained URL delimiter characters.
    #[error("invalid path segment `{0}`")]
    InvalidPathSegment(String),

    /// The server answered with a non-2xx status.
    #[error(transparent)]
    Rest(#[from] RestError),

    /// The underlying HTTP transport failed (DNS, connect, timeout, ...).
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// A body failed to serialize, or a response body was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A morph hook attached to the invoked endpoint failed. The hook's own
    /// error is carried as the source, unmodified.
    #[error("morph hook failed for `{path}`: {source}")]
    Morph {
        path: String,
        #[source]
        source: BoxError,
    },

    /// A base URL resolver closure failed.
    #[error("base URL resolution failed: {0}")]
    BaseUrl(#[source] BoxError),

    /// Escape hatch for custom [`Requester`](crate::request::Requester)
    /// implementations with failure modes of their own.
    #[error(transparent)]
    Other(BoxError),
}

/// A non-2xx HTTP response.
///
/// The response body is consumed as raw text and kept alongside the status,
/// final URL and response headers, so callers can inspect the error payload
/// without this crate pre-parsing it.
#[derive(Debug, Error)]
#[error("{url} {status}: {body}")]
pub struct RestError {
    url: String,
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl RestError {
    pub fn new(url: String, status: StatusCode, headers: HeaderMap, body: String) -> RestError {
        RestError { url, status, headers, body }
    }

    /// The final URL the request was sent to, after redirects.
    pub fn url(&self) -> &str { &self.url }
    pub fn status(&self) -> StatusCode { self.status }
    /// Canonical reason phrase for the status, e.g. `Not Found`.
    pub fn status_text(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("<unknown status code>")
    }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    /// The raw, unparsed response body text.
    pub fn body(&self) -> &str { &self.body }
}
