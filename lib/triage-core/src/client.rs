//! Transport trait.
//!
//! [`HttpClient`] performs a single exchange and reports what came back. It
//! never classifies: a 401 or a 503 is still `Ok(RawResponse)`. Turning a
//! status into an [`Outcome`](crate::Outcome) is the job of the call layer.

use std::future::Future;

use crate::{RawResponse, Request, Result};

/// Core HTTP transport trait.
///
/// Implement this to plug a custom transport or a test double into a call.
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and return the response.
    ///
    /// # Errors
    ///
    /// Returns an error only when no status code was obtained:
    /// - Connection and TLS failures
    /// - Timeouts
    /// - Requests the transport cannot encode
    fn execute(&self, request: Request) -> impl Future<Output = Result<RawResponse>> + Send;
}
