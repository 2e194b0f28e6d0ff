//! Single-use HTTP calls.
//!
//! A call is one attempt at one prepared request. It can be run once, either
//! awaited, blocking or enqueued; [`Clone`] produces a fresh attempt with the
//! same request.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{AbortHandle, AbortRegistration, Abortable};
use serde::de::DeserializeOwned;
use tokio::runtime::Handle;
use tracing::debug;

use crate::{Error, Request, Response, Result, Transport};

/// One re-issuable HTTP exchange for payload type `T`.
///
/// Implementations report what the transport produced: any received status is
/// `Ok`, only failures without a status are `Err`. Classification happens in
/// [`PendingCall`](crate::PendingCall).
pub trait Call<T>: Clone + Send + Sync + 'static {
    /// Run the attempt.
    ///
    /// The call is marked executed as soon as this is invoked, before the
    /// returned future is polled.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyExecuted`] on a second run, otherwise the transport or
    /// decoding failure.
    fn execute(&self) -> impl Future<Output = Result<Response<T>>> + Send;

    /// Run the attempt, blocking the current thread.
    ///
    /// # Errors
    ///
    /// Same as [`Call::execute`].
    ///
    /// # Panics
    ///
    /// [`RawCall`] panics when called from within an async runtime.
    fn execute_blocking(&self) -> Result<Response<T>>;

    /// Start the attempt in the background; `on_complete` runs exactly once
    /// with its result.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyExecuted`] on a second run. Nothing is scheduled then.
    fn enqueue<F>(&self, on_complete: F) -> Result<()>
    where
        F: FnOnce(Result<Response<T>>) + Send + 'static;

    /// Cancel the attempt. Idempotent.
    fn cancel(&self);

    /// Returns `true` once `execute`, `execute_blocking` or `enqueue` ran.
    fn is_executed(&self) -> bool;

    /// Returns `true` once `cancel` was called.
    fn is_cancelled(&self) -> bool;

    /// The prepared request, `None` when preparing it failed.
    fn request(&self) -> Option<&Request>;
}

/// Unclassified call backed by a [`Transport`].
///
/// Received statuses are all `Ok`: a 503 is a `Response` with no payload and
/// the raw bytes kept as its error body.
pub struct RawCall<T> {
    transport: Transport,
    runtime: Handle,
    request: std::result::Result<Request, String>,
    executed: AtomicBool,
    abort: AbortHandle,
    registration: Mutex<Option<AbortRegistration>>,
    _payload: PhantomData<fn() -> T>,
}

impl<T> RawCall<T> {
    /// Create a call for `request`, run on `runtime` when enqueued or blocked on.
    ///
    /// A request that failed to build is accepted; the failure is reported by
    /// the attempt.
    #[must_use]
    pub fn new(transport: Transport, runtime: Handle, request: Result<Request>) -> Self {
        let (abort, registration) = AbortHandle::new_pair();
        Self {
            transport,
            runtime,
            request: request.map_err(|err| match err {
                Error::InvalidRequest(message) => message,
                other => other.to_string(),
            }),
            executed: AtomicBool::new(false),
            abort,
            registration: Mutex::new(Some(registration)),
            _payload: PhantomData,
        }
    }
}

impl<T> RawCall<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Claim the call and build the attempt future.
    fn start(&self) -> Result<impl Future<Output = Result<Response<T>>> + Send + 'static> {
        if self.executed.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadyExecuted);
        }
        let registration = self
            .registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(Error::AlreadyExecuted)?;

        let transport = self.transport.clone();
        let request = self.request.clone();
        let attempt = async move {
            let request = request.map_err(Error::InvalidRequest)?;
            let raw = transport.send(request).await?;
            Response::from_raw(raw)
        };

        Ok(Abortable::new(attempt, registration)
            .map(|result| result.unwrap_or_else(|_aborted| Err(Error::Cancelled))))
    }
}

impl<T> Call<T> for RawCall<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn execute(&self) -> impl Future<Output = Result<Response<T>>> + Send {
        let attempt = self.start();
        async move { attempt?.await }
    }

    fn execute_blocking(&self) -> Result<Response<T>> {
        let attempt = self.start()?;
        self.runtime.block_on(attempt)
    }

    fn enqueue<F>(&self, on_complete: F) -> Result<()>
    where
        F: FnOnce(Result<Response<T>>) + Send + 'static,
    {
        let attempt = self.start()?;
        if let Some(request) = self.request() {
            debug!(method = %request.method(), url = %request.url(), "call enqueued");
        }
        self.runtime.spawn(async move {
            on_complete(attempt.await);
        });
        Ok(())
    }

    fn cancel(&self) {
        if !self.abort.is_aborted() {
            debug!("call cancelled");
            self.abort.abort();
        }
    }

    fn is_executed(&self) -> bool {
        self.executed.load(Ordering::Acquire)
    }

    fn is_cancelled(&self) -> bool {
        self.abort.is_aborted()
    }

    fn request(&self) -> Option<&Request> {
        self.request.as_ref().ok()
    }
}

impl<T> Clone for RawCall<T> {
    fn clone(&self) -> Self {
        let (abort, registration) = AbortHandle::new_pair();
        Self {
            transport: self.transport.clone(),
            runtime: self.runtime.clone(),
            request: self.request.clone(),
            executed: AtomicBool::new(false),
            abort,
            registration: Mutex::new(Some(registration)),
            _payload: PhantomData,
        }
    }
}

impl<T> fmt::Debug for RawCall<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawCall")
            .field("request", &self.request)
            .field("executed", &self.executed.load(Ordering::Acquire))
            .field("cancelled", &self.abort.is_aborted())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use assert2::{check, let_assert};
    use tokio::sync::oneshot;

    use super::*;
    use crate::{HttpClient, Method, RawResponse};

    #[derive(Clone, Default)]
    struct Counting {
        hits: Arc<AtomicUsize>,
    }

    impl HttpClient for Counting {
        async fn execute(&self, _request: Request) -> Result<RawResponse> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            Ok(RawResponse::new(200, HashMap::new(), "[1,2,3]"))
        }
    }

    fn call(client: &Counting) -> RawCall<Vec<u32>> {
        let url = "http://localhost/numbers".parse().expect("valid URL");
        let request = Request::builder(Method::Get, url).build();
        RawCall::new(
            Transport::from_client(client.clone()),
            Handle::current(),
            Ok(request),
        )
    }

    #[tokio::test]
    async fn execute_once() {
        let client = Counting::default();
        let call = call(&client);
        check!(!call.is_executed());

        let_assert!(Ok(response) = call.execute().await);
        check!(response.body() == Some(&vec![1, 2, 3]));
        check!(call.is_executed());

        let_assert!(Err(Error::AlreadyExecuted) = call.execute().await);
        check!(client.hits.load(Ordering::SeqCst) == 1);
    }

    #[tokio::test]
    async fn enqueue_after_execute_is_rejected() {
        let client = Counting::default();
        let call = call(&client);
        let _ = call.execute().await;

        let_assert!(Err(Error::AlreadyExecuted) = call.enqueue(|_| {}));
    }

    #[tokio::test]
    async fn clone_is_a_fresh_attempt() {
        let client = Counting::default();
        let original = call(&client);
        let_assert!(Ok(_) = original.execute().await);

        let copy = original.clone();
        check!(!copy.is_executed());
        check!(copy.request() == original.request());
        let_assert!(Ok(_) = copy.execute().await);
        check!(client.hits.load(Ordering::SeqCst) == 2);
    }

    #[tokio::test]
    async fn executing_a_clone_keeps_the_original_unexecuted() {
        let client = Counting::default();
        let original = call(&client);
        let copy = original.clone();

        let_assert!(Ok(_) = copy.execute().await);

        check!(copy.is_executed());
        check!(!original.is_executed());
        check!(!original.is_cancelled());
        check!(client.hits.load(Ordering::SeqCst) == 1);
    }

    #[tokio::test]
    #[should_panic(expected = "Cannot start a runtime from within a runtime")]
    async fn blocking_inside_a_runtime_panics() {
        let client = Counting::default();
        let _ = call(&client).execute_blocking();
    }

    #[tokio::test]
    async fn cancel_before_execute() {
        let client = Counting::default();
        let call = call(&client);
        call.cancel();
        call.cancel();

        check!(call.is_cancelled());
        let_assert!(Err(Error::Cancelled) = call.execute().await);
        check!(client.hits.load(Ordering::SeqCst) == 0);
    }

    #[tokio::test]
    async fn enqueue_reports_once() {
        let client = Counting::default();
        let call = call(&client);
        let (tx, rx) = oneshot::channel();

        let_assert!(Ok(()) = call.enqueue(move |result| {
            let _ = tx.send(result.map(Response::into_body));
        }));

        let_assert!(Ok(Ok(Some(numbers))) = rx.await);
        check!(numbers == vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn failed_preparation_surfaces_on_execute() {
        let client = Counting::default();
        let call: RawCall<Vec<u32>> = RawCall::new(
            Transport::from_client(client.clone()),
            Handle::current(),
            Err(Error::invalid_request("missing path parameter 'id'")),
        );

        check!(call.request().is_none());
        let_assert!(Err(Error::InvalidRequest(message)) = call.execute().await);
        check!(message.contains("missing path parameter"));
        check!(client.hits.load(Ordering::SeqCst) == 0);
    }
}
