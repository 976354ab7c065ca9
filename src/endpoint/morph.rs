use std::sync::Arc;

use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::error::BoxError;
use crate::request::Query;

/// Result type of every morph hook. A hook may fail with any error; the
/// pipeline aborts the call and surfaces it unchanged as
/// [`Error::Morph`](crate::error::Error::Morph).
pub type MorphResult<T> = Result<T, BoxError>;

/// Transforms the request body before dispatch. Receives the rendered
/// endpoint path and the body, which is `None` for bodyless invocations.
pub type BodyMorph = Arc<dyn Fn(&str, Option<Value>) -> MorphResult<Option<Value>> + Send + Sync>;
/// Transforms the normalized query before dispatch.
pub type QueryMorph = Arc<dyn Fn(&str, Query) -> MorphResult<Query> + Send + Sync>;
/// Transforms the per-call headers before dispatch.
pub type HeaderMorph = Arc<dyn Fn(&str, HeaderMap) -> MorphResult<HeaderMap> + Send + Sync>;
/// Transforms the raw requester result before it is returned to the caller.
pub type ResultMorph = Arc<dyn Fn(&str, Value) -> MorphResult<Value> + Send + Sync>;

/// The four independently optional morph hooks of one endpoint node.
///
/// Hooks belong to exactly the node they were set on; they are neither
/// inherited from parents nor propagated to children. An unset hook is the
/// identity transform.
#[derive(Default, Clone)]
pub(crate) struct MorphSet {
    pub(crate) body: Option<BodyMorph>,
    pub(crate) query: Option<QueryMorph>,
    pub(crate) headers: Option<HeaderMorph>,
    pub(crate) result: Option<ResultMorph>,
}
