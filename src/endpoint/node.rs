use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use reqwest::header::HeaderMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use super::morph::{MorphResult, MorphSet};
use super::path::{EndpointPath, PathPart};
use crate::error::Error;
use crate::request::{CallOptions, Method, Query, QueryInput, Requester, RestRequest};

/// A callable, navigable handle bound to one accumulated endpoint path.
///
/// An `Endpoint` is simultaneously a namespace ([`Endpoint::at`] descends the
/// path tree) and a request trigger ([`Endpoint::invoke`] and the typed
/// method wrappers). Handles are cheap to clone; clones refer to the same
/// node. Children are created lazily on first access and cached, so repeated
/// access to the same segment yields the identical node, so morph hooks
/// attached once apply to every later use of that sub-path.
///
/// The tree grows monotonically with the set of distinct paths ever accessed;
/// there is no eviction.
#[derive(Clone)]
pub struct Endpoint {
    inner: Arc<Inner>,
}

struct Inner {
    path: EndpointPath,
    requester: Arc<dyn Requester>,
    children: Mutex<HashMap<String, Endpoint>>,
    morphs: Mutex<MorphSet>,
}

impl Endpoint {
    /// Builds the root of a new endpoint tree over `requester`.
    pub fn root(requester: Arc<dyn Requester>) -> Endpoint {
        Endpoint::node(EndpointPath::root(), requester)
    }

    /// Convenience wrapper around [`Endpoint::root`] for owned requesters.
    pub fn with_requester(requester: impl Requester + 'static) -> Endpoint {
        Endpoint::root(Arc::new(requester))
    }

    fn node(path: EndpointPath, requester: Arc<dyn Requester>) -> Endpoint {
        Endpoint {
            inner: Arc::new(Inner {
                path,
                requester,
                children: Mutex::new(HashMap::new()),
                morphs: Mutex::new(MorphSet::default()),
            }),
        }
    }

    /// The node's accumulated path.
    pub fn path(&self) -> &EndpointPath { &self.inner.path }

    /// Descends to the child endpoint for `part`, creating and caching it on
    /// first access.
    ///
    /// Identity stability: for a fixed tree, `at` with the same segment on
    /// the same node always returns the identical child node (observable via
    /// [`Endpoint::same_node`]), not merely an equivalent one.
    ///
    /// # Errors
    /// [`Error::InvalidPathSegment`] if the segment is empty or contains a
    /// character that cannot appear in a URL path segment.
    pub fn at(&self, part: impl Into<PathPart>) -> Result<Endpoint, Error> {
        let part = part.into();
        validate_segment(part.as_str())?;
        let key = part.as_str().to_owned();
        let mut children = self.inner.children.lock().unwrap();
        if let Some(child) = children.get(&key) {
            trace!(path = %self.inner.path, segment = %key, "child cache hit");
            return Ok(child.clone());
        }
        let child = Endpoint::node(self.inner.path.join(part), Arc::clone(&self.inner.requester));
        children.insert(key, child.clone());
        Ok(child)
    }

    /// `true` when both handles refer to the same node instance.
    pub fn same_node(&self, other: &Endpoint) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Builds a fresh endpoint tree over this tree's requester.
    ///
    /// The new root shares the transport but nothing else: all morph hooks
    /// and cached children of the old tree are left behind. Use this to reuse
    /// one configured transport across differently-shaped API definitions.
    pub fn retarget(&self) -> Endpoint {
        Endpoint::root(Arc::clone(&self.inner.requester))
    }

    pub fn set_body_morph(
        &self,
        morph: impl Fn(&str, Option<Value>) -> MorphResult<Option<Value>> + Send + Sync + 'static,
    ) {
        self.inner.morphs.lock().unwrap().body = Some(Arc::new(morph));
    }

    pub fn set_query_morph(
        &self,
        morph: impl Fn(&str, Query) -> MorphResult<Query> + Send + Sync + 'static,
    ) {
        self.inner.morphs.lock().unwrap().query = Some(Arc::new(morph));
    }

    pub fn set_header_morph(
        &self,
        morph: impl Fn(&str, HeaderMap) -> MorphResult<HeaderMap> + Send + Sync + 'static,
    ) {
        self.inner.morphs.lock().unwrap().headers = Some(Arc::new(morph));
    }

    pub fn set_result_morph(
        &self,
        morph: impl Fn(&str, Value) -> MorphResult<Value> + Send + Sync + 'static,
    ) {
        self.inner.morphs.lock().unwrap().result = Some(Arc::new(morph));
    }

    /// Removes all four morph hooks from this node.
    pub fn clear_morphs(&self) {
        *self.inner.morphs.lock().unwrap() = MorphSet::default();
    }

    /// Issues `method` against this node's path.
    ///
    /// The pipeline, in order: normalize the query, apply the node's body,
    /// query and header morphs (each optional, each given the rendered path),
    /// build the request descriptor, hand it to the requester, then apply the
    /// result morph to the response. The future suspends only while awaiting
    /// the requester.
    ///
    /// `body` is placed on the descriptor only for methods where
    /// [`Method::takes_body`] holds; bodyless methods never carry one. No
    /// further method/argument validation happens here; malformed options
    /// are the requester's contract.
    pub async fn invoke(
        &self,
        method: Method,
        body: Option<Value>,
        options: CallOptions,
    ) -> Result<Value, Error> {
        let rendered = self.inner.path.render();
        let morphs = self.inner.morphs.lock().unwrap().clone();

        let body = if method.takes_body() { body } else { None };
        let body = match &morphs.body {
            Some(morph) => morph(&rendered, body).map_err(|source| Error::Morph {
                path: rendered.clone(),
                source,
            })?,
            None => body,
        };

        let query = options.query.map_or_else(Query::default, QueryInput::normalize);
        let query = match &morphs.query {
            Some(morph) => morph(&rendered, query).map_err(|source| Error::Morph {
                path: rendered.clone(),
                source,
            })?,
            None => query,
        };

        let headers = options.headers.unwrap_or_default();
        let headers = match &morphs.headers {
            Some(morph) => morph(&rendered, headers).map_err(|source| Error::Morph {
                path: rendered.clone(),
                source,
            })?,
            None => headers,
        };

        let request = RestRequest {
            method,
            path: self.inner.path.clone(),
            body,
            query,
            headers,
            extra: options.extra,
        };
        debug!(method = %method, path = %rendered, "dispatching request");
        let raw = self.inner.requester.send(request).await?;

        match &morphs.result {
            Some(morph) => morph(&rendered, raw).map_err(|source| Error::Morph {
                path: rendered,
                source,
            }),
            None => Ok(raw),
        }
    }

    /// `GET` this endpoint.
    pub async fn get(&self, options: CallOptions) -> Result<Value, Error> {
        self.invoke(Method::Get, None, options).await
    }

    /// `DELETE` this endpoint.
    pub async fn delete(&self, options: CallOptions) -> Result<Value, Error> {
        self.invoke(Method::Delete, None, options).await
    }

    /// `POST` `body` to this endpoint.
    pub async fn post(&self, body: impl Serialize, options: CallOptions) -> Result<Value, Error> {
        let body = serde_json::to_value(body)?;
        self.invoke(Method::Post, Some(body), options).await
    }

    /// `PUT` `body` to this endpoint.
    pub async fn put(&self, body: impl Serialize, options: CallOptions) -> Result<Value, Error> {
        let body = serde_json::to_value(body)?;
        self.invoke(Method::Put, Some(body), options).await
    }

    /// `PATCH` `body` to this endpoint.
    pub async fn patch(&self, body: impl Serialize, options: CallOptions) -> Result<Value, Error> {
        let body = serde_json::to_value(body)?;
        self.invoke(Method::Patch, Some(body), options).await
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let children = self.inner.children.lock().unwrap();
        f.debug_struct("Endpoint")
            .field("path", &self.inner.path.render())
            .field("children", &children.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn validate_segment(segment: &str) -> Result<(), Error> {
    let ok = !segment.is_empty()
        && !segment.contains(['/', '?', '#'])
        && !segment.chars().any(char::is_whitespace);
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidPathSegment(segment.to_owned()))
    }
}
