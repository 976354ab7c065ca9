use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::debug;

use crate::endpoint::Endpoint;
use crate::error::{BoxError, Error, RestError};
use crate::request::{Query, Requester, RestRequest};

/// The host prefix every request URL is built from: either a literal, or a
/// closure resolved (and awaited) per request for late-bound hosts.
#[derive(Clone)]
pub enum BaseUrl {
    Literal(String),
    Resolver(Arc<dyn Fn() -> BoxFuture<'static, Result<String, BoxError>> + Send + Sync>),
}

impl BaseUrl {
    /// Wraps an async closure as a late-bound base URL source.
    pub fn resolver<F, Fut>(resolve: F) -> BaseUrl
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, BoxError>> + Send + 'static,
    {
        BaseUrl::Resolver(Arc::new(move || Box::pin(resolve())))
    }

    async fn resolve(&self) -> Result<String, Error> {
        match self {
            BaseUrl::Literal(url) => Ok(url.clone()),
            BaseUrl::Resolver(resolve) => resolve().await.map_err(Error::BaseUrl),
        }
    }
}

impl From<&str> for BaseUrl {
    fn from(url: &str) -> Self { BaseUrl::Literal(url.to_owned()) }
}

impl From<String> for BaseUrl {
    fn from(url: String) -> Self { BaseUrl::Literal(url) }
}

impl fmt::Debug for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseUrl::Literal(url) => f.debug_tuple("Literal").field(url).finish(),
            BaseUrl::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

type TransformFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// The reference [`Requester`]: JSON request and response bodies, URLs of the
/// form `{base_url}/{endpoint}`, non-2xx classified as [`RestError`] with the
/// response body consumed as raw text, and JSON-parsed results.
///
/// Wraps a preconfigured `reqwest::Client` with a default request timeout of
/// 5 seconds. Build via [`DefaultRequester::builder`].
pub struct DefaultRequester {
    client: reqwest::Client,
    base_url: BaseUrl,
    headers: HeaderMap,
    marshal: Option<TransformFn>,
    unmarshal: Option<TransformFn>,
}

impl DefaultRequester {
    /// A requester with all defaults for the given base URL.
    pub fn new(base_url: impl Into<BaseUrl>) -> DefaultRequester {
        DefaultRequester::builder(base_url).build()
    }

    pub fn builder(base_url: impl Into<BaseUrl>) -> DefaultRequesterBuilder {
        DefaultRequesterBuilder {
            base_url: base_url.into(),
            headers: HeaderMap::new(),
            marshal: None,
            unmarshal: None,
            timeout: Duration::from_secs(5),
        }
    }

    /// Returns a reference to the internal `reqwest::Client`.
    pub fn client(&self) -> &reqwest::Client { &self.client }
    /// Returns the configured base URL source.
    pub fn base_url(&self) -> &BaseUrl { &self.base_url }

    /// Merges headers in increasing precedence: the default
    /// `Content-Type: application/json`, then the configured defaults, then
    /// the per-call headers.
    fn merge_headers(&self, per_call: &HeaderMap) -> HeaderMap {
        let mut merged = HeaderMap::new();
        merged.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &self.headers {
            merged.insert(name, value.clone());
        }
        for (name, value) in per_call {
            merged.insert(name, value.clone());
        }
        merged
    }
}

impl fmt::Debug for DefaultRequester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultRequester")
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Requester for DefaultRequester {
    async fn send(&self, request: RestRequest) -> Result<Value, Error> {
        let base = self.base_url.resolve().await?;
        let mut url = join_url(&base, &request.endpoint());
        if let Query::Raw(raw) = &request.query {
            if !raw.is_empty() {
                url.push('?');
                url.push_str(raw);
            }
        }

        let mut builder = self
            .client
            .request(request.method.as_reqwest(), &url)
            .headers(self.merge_headers(&request.headers));
        if let Query::Pairs(pairs) = &request.query {
            if !pairs.is_empty() {
                builder = builder.query(pairs);
            }
        }
        if let Some(body) = request.body.filter(|body| !body.is_null()) {
            let body = match &self.marshal {
                Some(marshal) => marshal(body),
                None => body,
            };
            builder = builder.body(serde_json::to_string(&body)?);
        }

        debug!(method = %request.method, url = %url, "sending request");
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let url = response.url().to_string();
            let headers = response.headers().clone();
            let body = response.text().await?;
            return Err(RestError::new(url, status, headers, body).into());
        }

        let text = response.text().await?;
        let value: Value = serde_json::from_str(&text)?;
        Ok(match &self.unmarshal {
            Some(unmarshal) => unmarshal(value),
            None => value,
        })
    }
}

/// Builder for [`DefaultRequester`].
pub struct DefaultRequesterBuilder {
    base_url: BaseUrl,
    headers: HeaderMap,
    marshal: Option<TransformFn>,
    unmarshal: Option<TransformFn>,
    timeout: Duration,
}

impl DefaultRequesterBuilder {
    /// Adds one default header, merged under per-call headers on every
    /// request.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Extends the default headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        for (name, value) in &headers {
            self.headers.insert(name, value.clone());
        }
        self
    }

    /// Transform applied to the body before JSON serialization, e.g. for
    /// case conversion. Identity when unset.
    #[must_use]
    pub fn marshal(mut self, marshal: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.marshal = Some(Arc::new(marshal));
        self
    }

    /// Transform applied to the parsed JSON response. Identity when unset.
    #[must_use]
    pub fn unmarshal(mut self, unmarshal: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.unmarshal = Some(Arc::new(unmarshal));
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> DefaultRequester {
        DefaultRequester {
            client: reqwest::Client::builder().timeout(self.timeout).build().unwrap(),
            base_url: self.base_url,
            headers: self.headers,
            marshal: self.marshal,
            unmarshal: self.unmarshal,
        }
    }

    /// Builds the requester and roots a fresh [`Endpoint`] tree over it.
    pub fn build_client(self) -> Endpoint {
        Endpoint::with_requester(self.build())
    }
}

/// `{base}/{endpoint}` with exactly one separating slash.
pub(crate) fn join_url(base: &str, endpoint: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), endpoint.trim_start_matches('/'))
}
