//! Exchange logging middleware.
//!
//! Logs each exchange through `tracing` together with the [`Outcome`] the
//! status or failure classifies to, so a log line already says whether the
//! attempt will surface as a client error, a network error, and so on.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tower::{Layer, Service};
use tracing::{Instrument, Level, debug, info, span, warn};

use crate::{Error, Outcome, RawResponse, Request, Result};

/// Layer that adds exchange logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

/// Verbosity of [`LoggingLayer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Also log request headers.
    Debug,
    /// Method, URL, status, outcome and elapsed time.
    #[default]
    Info,
}

impl LoggingLayer {
    /// Create a logging layer at info level.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logging layer that also logs request headers at debug level.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            level: self.level,
        }
    }
}

/// Service produced by [`LoggingLayer`].
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
}

impl<S> Service<Request> for Logging<S>
where
    S: Service<Request, Response = RawResponse, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = RawResponse;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let method = request.method();
        let url = request.url().to_string();
        let level = self.level;

        let span = span!(Level::INFO, "exchange", %method, %url);

        // The clone may not be ready; swap so the ready one is used.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(
            async move {
                let start = Instant::now();
                if level == LogLevel::Debug {
                    debug!(headers = ?request.headers(), "sending request");
                }

                let result = inner.call(request).await;
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(response) => {
                        let status = response.status();
                        let outcome = Outcome::from_status(status);
                        if outcome.is_success() {
                            info!(status, %outcome, elapsed_ms, "exchange completed");
                        } else {
                            warn!(status, %outcome, elapsed_ms, "exchange completed");
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, outcome = %err.outcome(), elapsed_ms, "exchange failed");
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert2::{check, let_assert};
    use tower::ServiceExt;

    use super::*;
    use crate::Method;

    fn request() -> Request {
        let url = "http://localhost/todos".parse().expect("valid URL");
        Request::builder(Method::Get, url).build()
    }

    #[test]
    fn logging_layer_levels() {
        check!(LoggingLayer::new().level == LogLevel::Info);
        check!(LoggingLayer::debug().level == LogLevel::Debug);
    }

    #[tokio::test]
    async fn passes_responses_through() {
        let inner = tower::service_fn(|_request: Request| async {
            Ok::<_, Error>(RawResponse::new(503, HashMap::new(), "down"))
        });
        let service = LoggingLayer::debug().layer(inner);

        let_assert!(Ok(response) = service.oneshot(request()).await);
        check!(response.status() == 503);
        check!(response.text() == "down");
    }

    #[tokio::test]
    async fn passes_failures_through() {
        let inner = tower::service_fn(|_request: Request| async {
            Err::<RawResponse, _>(Error::connection("connection refused"))
        });
        let service = LoggingLayer::new().layer(inner);

        let_assert!(Err(err) = service.oneshot(request()).await);
        check!(err.is_connection());
    }
}
