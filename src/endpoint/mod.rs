//! The endpoint tree: immutable path values, lazily cached nodes, and the
//! per-invocation dispatch pipeline with its morph hooks.

pub mod morph;
pub mod node;
pub mod path;

pub use morph::{BodyMorph, HeaderMorph, MorphResult, QueryMorph, ResultMorph};
pub use node::Endpoint;
pub use path::{EndpointPath, PathPart};
