//! # restling - a lazy endpoint-tree client layer for REST-style JSON APIs
//!
//! restling synthesizes an API client from a transport function: descending
//! an [`Endpoint`] tree accumulates a URL path, invoking a node issues an
//! HTTP method against the accumulated path. Nodes are created lazily and
//! cached, so a sub-path is the same object every time you reach it, and
//! per-node morph hooks can reshape body, query, headers or result for every
//! later call through that node.
//!
//! The tree delegates all I/O to a [`Requester`](request::Requester); the
//! shipped [`DefaultRequester`] speaks JSON over `reqwest` and classifies
//! non-2xx responses as [`RestError`]. Swap in your own requester to reuse
//! the tree shape over any transport.
//!
//! ## Usage
//!
//! ```no_run
//! use restling::{CallOptions, DefaultRequester, QueryInput};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), restling::Error> {
//! let api = DefaultRequester::builder("http://localhost:3000/api").build_client();
//!
//! // GET http://localhost:3000/api/users/42
//! let user = api.at("users")?.at(42)?.get(CallOptions::new()).await?;
//!
//! // POST http://localhost:3000/api/users
//! let created = api
//!     .at("users")?
//!     .post(json!({ "name": "Jane" }), CallOptions::new())
//!     .await?;
//!
//! // GET http://localhost:3000/api/users?active=true
//! let active = api
//!     .at("users")?
//!     .get(CallOptions::new().query(QueryInput::map([("active", json!(true))])))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Morph hooks
//!
//! ```no_run
//! use restling::{CallOptions, DefaultRequester};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), restling::Error> {
//! let api = DefaultRequester::builder("http://localhost:3000/api").build_client();
//!
//! // Unwrap `{ "data": ... }` envelopes for everything sent through /report.
//! let report = api.at("report")?;
//! report.set_result_morph(|_, result| Ok(result["data"].clone()));
//! let data = report.get(CallOptions::new()).await?;
//! # Ok(())
//! # }
//! ```

pub use reqwest;
pub use serde_json;

pub mod endpoint;
pub mod error;
pub mod request;
pub mod requester;

pub use endpoint::{Endpoint, EndpointPath, MorphResult, PathPart};
pub use error::{BoxError, Error, RestError};
pub use request::{CallOptions, Method, Query, QueryInput, Requester, RestRequest};
pub use requester::{BaseUrl, DefaultRequester, DefaultRequesterBuilder};
