//! Classified calls.
//!
//! [`PendingCall`] decorates a [`Call`] and sorts every finished attempt into
//! one [`Outcome`]. Awaited and blocking runs turn the unauthenticated, client
//! and server outcomes into typed errors; enqueued runs invoke exactly one
//! [`Callback`] method.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::executor::{CallbackExecutor, dispatch};
use crate::{Call, Error, Outcome, RawCall, RawResponse, Request, Response, Result};

/// Receiver of an enqueued attempt's outcome.
///
/// Exactly one method is called, once. Methods take `self` by value, so a
/// callback cannot be invoked twice.
pub trait Callback<T>: Send + 'static {
    /// 2xx response.
    fn success(self, response: Response<T>);

    /// 401 response.
    fn unauthenticated(self, response: RawResponse);

    /// 4xx response other than 401.
    fn client_error(self, response: RawResponse);

    /// 5xx response.
    fn server_error(self, response: RawResponse);

    /// The exchange failed before a status was received.
    fn network_error(self, error: Error);

    /// Any other failure, including statuses outside the classified ranges.
    fn unexpected_error(self, error: Error);
}

/// Classify a received response.
///
/// # Errors
///
/// Every status except 2xx becomes an error carrying the response:
/// [`Error::Unauthenticated`], [`Error::Client`], [`Error::Server`] or, for
/// statuses outside the classified ranges, [`Error::UnexpectedStatus`].
pub fn classify<T>(response: Response<T>) -> Result<Response<T>> {
    match Outcome::from_status(response.status()) {
        Outcome::Success => Ok(response),
        Outcome::Unauthenticated => Err(Error::Unauthenticated(response.into_raw())),
        Outcome::ClientError => Err(Error::Client(response.into_raw())),
        Outcome::ServerError => Err(Error::Server(response.into_raw())),
        Outcome::NetworkError | Outcome::UnexpectedError => {
            Err(Error::UnexpectedStatus(response.into_raw()))
        }
    }
}

/// Route an attempt result to the matching callback method.
fn deliver<T, B>(result: Result<Response<T>>, callback: B)
where
    B: Callback<T>,
{
    match result.and_then(classify) {
        Ok(response) => callback.success(response),
        Err(Error::Unauthenticated(response)) => callback.unauthenticated(response),
        Err(Error::Client(response)) => callback.client_error(response),
        Err(Error::Server(response)) => callback.server_error(response),
        Err(error) if error.is_network() => callback.network_error(error),
        Err(error) => callback.unexpected_error(error),
    }
}

fn outcome_of<T>(result: &Result<Response<T>>) -> Outcome {
    match result {
        Ok(response) => Outcome::from_status(response.status()),
        Err(error) => error.outcome(),
    }
}

/// A call whose outcome is classified before the caller sees it.
///
/// # Example
///
/// ```ignore
/// let call: PendingCall<Vec<ToDoItem>> = todos.todo_list();
/// match call.execute().await {
///     Ok(response) => render(response.into_body().unwrap_or_default()),
///     Err(Error::Unauthenticated(_)) => sign_in(),
///     Err(err) if err.is_network() => show_offline(),
///     Err(err) => show_error(&err),
/// }
/// ```
pub struct PendingCall<T, C = RawCall<T>> {
    inner: C,
    executor: Option<Arc<dyn CallbackExecutor>>,
    _payload: PhantomData<fn() -> T>,
}

impl<T, C> PendingCall<T, C>
where
    C: Call<T>,
    T: Send + 'static,
{
    /// Wrap `inner`; enqueued completions are posted to `executor` when set.
    #[must_use]
    pub fn new(inner: C, executor: Option<Arc<dyn CallbackExecutor>>) -> Self {
        Self {
            inner,
            executor,
            _payload: PhantomData,
        }
    }

    /// Run the attempt and classify it.
    ///
    /// # Errors
    ///
    /// - [`Error::Unauthenticated`], [`Error::Client`], [`Error::Server`]
    ///   carrying the response
    /// - [`Error::UnexpectedStatus`] for statuses outside the classified ranges
    /// - the transport failure, unchanged
    /// - [`Error::AlreadyExecuted`] when the call already ran
    pub async fn execute(&self) -> Result<Response<T>> {
        let result = self.inner.execute().await;
        debug!(outcome = %outcome_of(&result), "call completed");
        result.and_then(classify)
    }

    /// Blocking form of [`PendingCall::execute`].
    ///
    /// Run it on a thread that may block, never from async code.
    ///
    /// # Errors
    ///
    /// Same as [`PendingCall::execute`].
    ///
    /// # Panics
    ///
    /// Panics when called from within an async runtime.
    pub fn execute_blocking(&self) -> Result<Response<T>> {
        let result = self.inner.execute_blocking();
        debug!(outcome = %outcome_of(&result), "call completed");
        result.and_then(classify)
    }

    /// Start the attempt in the background and deliver its outcome to one
    /// `callback` method, through the completion executor when one is set.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyExecuted`] when the call already ran. The callback is
    /// not invoked then.
    pub fn enqueue<B>(&self, callback: B) -> Result<()>
    where
        B: Callback<T>,
    {
        let executor = self.executor.clone();
        self.inner.enqueue(move |result| {
            debug!(outcome = %outcome_of(&result), "call completed");
            dispatch(
                executor.as_deref(),
                Box::new(move || deliver(result, callback)),
            );
        })
    }

    /// Cancel the attempt. Idempotent and best-effort: an attempt already
    /// finished keeps its outcome, otherwise it fails with
    /// [`Error::Cancelled`] and classifies as a network error.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Returns `true` once the call ran or was enqueued.
    #[must_use]
    pub fn is_executed(&self) -> bool {
        self.inner.is_executed()
    }

    /// Returns `true` once [`PendingCall::cancel`] was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// The prepared request, `None` when preparing it failed.
    #[must_use]
    pub fn request(&self) -> Option<&Request> {
        self.inner.request()
    }

    /// The wrapped call.
    #[must_use]
    pub const fn inner(&self) -> &C {
        &self.inner
    }
}

impl<T, C: Clone> Clone for PendingCall<T, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            executor: self.executor.clone(),
            _payload: PhantomData,
        }
    }
}

impl<T, C: fmt::Debug> fmt::Debug for PendingCall<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCall")
            .field("inner", &self.inner)
            .field("callback_executor", &self.executor.is_some())
            .finish()
    }
}
