//! # formmap-http
//!
//! The request-side collaborator of the formmap-rs engine. It turns the raw
//! pieces of an HTTP request (query string, urlencoded form body, JSON body)
//! into the three ordered parameter sources the binder merges.
//!
//! ## Modules
//!
//! - [`querydict`] - `QueryDict` for query strings and form bodies
//! - [`request`] - `RequestData`, the three sources of one request

pub mod querydict;
pub mod request;

pub use querydict::QueryDict;
pub use request::{RequestData, RequestDataBuilder};
