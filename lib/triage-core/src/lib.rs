//! Core types for the triage call adapter.
//!
//! This crate holds the data model shared by the runtime and the `#[service]` macro:
//! - [`Method`] and [`Endpoint`] - declared remote operations
//! - [`Request`] and [`RequestBuilder`] - prepared outbound requests
//! - [`RawResponse`] - transport-level response (status, headers, bytes)
//! - [`Response`] - typed response snapshot with an optional payload
//! - [`Outcome`] - the six-way classification of a finished attempt
//! - [`Error`] and [`Result`] - error handling
//! - [`HttpClient`] - transport trait executing a single exchange

mod body;
mod client;
mod endpoint;
mod error;
mod outcome;
pub mod prelude;
mod request;
mod response;

pub use body::{from_json, to_json};
pub use client::HttpClient;
pub use endpoint::{Endpoint, Method};
pub use error::{Error, Result};
pub use outcome::Outcome;
pub use request::{Request, RequestBuilder};
pub use response::{RawResponse, Response};

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
