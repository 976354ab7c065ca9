//! Requester implementations. The [`Requester`](crate::request::Requester)
//! trait itself lives in [`crate::request`] next to the request descriptor;
//! this module holds the shipped reference implementation.

pub mod default_requester;

pub use default_requester::{BaseUrl, DefaultRequester, DefaultRequesterBuilder};
