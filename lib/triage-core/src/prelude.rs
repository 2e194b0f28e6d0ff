//! Prelude module for convenient imports.
//!
//! ```ignore
//! use triage_core::prelude::*;
//! ```

pub use crate::{
    Endpoint, Error, HttpClient, Method, Outcome, RawResponse, Request, RequestBuilder, Response,
    Result, from_json, to_json,
};
