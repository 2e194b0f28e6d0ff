//! Call adapters.
//!
//! A service method declares a return shape such as `PendingCall<Vec<Todo>>`.
//! When a service is created, [`ServiceClient`] asks its registered
//! [`CallAdapterFactory`] list, in order, which one handles that shape. The
//! first [`Adaptation::Handled`] wins; the [`CallAdapter`] it returns then
//! turns every [`RawCall`] of that method into the declared type.

use std::fmt;
use std::sync::Arc;

use derive_more::Display;
use serde::de::DeserializeOwned;

use crate::executor::CallbackExecutor;
use crate::{Error, PendingCall, RawCall, Result, ServiceClient};

/// Shape name handled by [`ClassifyingAdapterFactory`].
pub const PENDING_CALL: &str = "PendingCall";

/// Shape name handled by [`DefaultCallAdapterFactory`].
pub const RAW_CALL: &str = "RawCall";

/// A declared return type: the outer type name and its type arguments.
///
/// ```
/// use triage::ReturnShape;
///
/// let shape = ReturnShape::new("PendingCall", &["Vec<ToDoItem>"]);
/// assert_eq!(shape.to_string(), "PendingCall<Vec<ToDoItem>>");
/// assert_eq!(shape.type_argument(), Some("Vec<ToDoItem>"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReturnShape {
    raw: &'static str,
    arguments: &'static [&'static str],
}

impl ReturnShape {
    /// Create a shape.
    #[must_use]
    pub const fn new(raw: &'static str, arguments: &'static [&'static str]) -> Self {
        Self { raw, arguments }
    }

    /// Outer type name, without path or arguments.
    #[must_use]
    pub const fn raw(&self) -> &'static str {
        self.raw
    }

    /// Type arguments as written.
    #[must_use]
    pub const fn arguments(&self) -> &'static [&'static str] {
        self.arguments
    }

    /// First type argument, the response payload by convention.
    #[must_use]
    pub fn type_argument(&self) -> Option<&'static str> {
        self.arguments.first().copied()
    }
}

impl fmt::Display for ReturnShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw)?;
        if !self.arguments.is_empty() {
            write!(f, "<{}>", self.arguments.join(", "))?;
        }
        Ok(())
    }
}

/// Turns raw calls of one method into its declared return type.
#[derive(Clone, Display)]
#[display("{produces}<{response_type}>")]
pub struct CallAdapter {
    produces: &'static str,
    response_type: &'static str,
    executor: Option<Arc<dyn CallbackExecutor>>,
}

impl CallAdapter {
    /// Adapter producing classified [`PendingCall`]s.
    #[must_use]
    pub const fn classifying(response_type: &'static str) -> Self {
        Self::new(PENDING_CALL, response_type)
    }

    /// Adapter handing out [`RawCall`]s unchanged.
    #[must_use]
    pub const fn passthrough(response_type: &'static str) -> Self {
        Self::new(RAW_CALL, response_type)
    }

    /// Adapter producing a custom [`AdaptCall`] type named `produces`.
    #[must_use]
    pub const fn new(produces: &'static str, response_type: &'static str) -> Self {
        Self {
            produces,
            response_type,
            executor: None,
        }
    }

    /// Post enqueued completions to `executor`.
    #[must_use]
    pub fn with_callback_executor(mut self, executor: Option<Arc<dyn CallbackExecutor>>) -> Self {
        self.executor = executor;
        self
    }

    /// Name of the type this adapter produces.
    #[must_use]
    pub const fn produces(&self) -> &'static str {
        self.produces
    }

    /// Payload type as declared.
    #[must_use]
    pub const fn response_type(&self) -> &'static str {
        self.response_type
    }

    /// Completion executor handed to produced calls.
    #[must_use]
    pub fn callback_executor(&self) -> Option<&Arc<dyn CallbackExecutor>> {
        self.executor.as_ref()
    }
}

impl fmt::Debug for CallAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallAdapter")
            .field("produces", &self.produces)
            .field("response_type", &self.response_type)
            .field("callback_executor", &self.executor.is_some())
            .finish()
    }
}

/// Result of asking a factory about a shape.
#[derive(Debug, Clone)]
pub enum Adaptation {
    /// The factory handles the shape.
    Handled(CallAdapter),
    /// The factory does not; the next one is asked.
    NotHandled,
}

/// Decides whether it can adapt a declared return shape.
pub trait CallAdapterFactory: Send + Sync + 'static {
    /// Inspect `shape`.
    ///
    /// # Errors
    ///
    /// A malformed declaration the factory recognises, reported as
    /// [`Error::Configuration`]. This aborts service creation.
    fn get(&self, shape: &ReturnShape, client: &ServiceClient) -> Result<Adaptation>;
}

/// Handles `PendingCall<T>`: calls whose outcome is classified.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyingAdapterFactory;

impl ClassifyingAdapterFactory {
    /// Create the factory.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CallAdapterFactory for ClassifyingAdapterFactory {
    fn get(&self, shape: &ReturnShape, client: &ServiceClient) -> Result<Adaptation> {
        if shape.raw() != PENDING_CALL || shape.arguments().len() > 1 {
            return Ok(Adaptation::NotHandled);
        }
        let response_type = shape.type_argument().ok_or_else(|| {
            Error::configuration(
                "PendingCall must have a generic type (e.g. PendingCall<Vec<ToDoItem>>)",
            )
        })?;

        let adapter = CallAdapter::classifying(response_type)
            .with_callback_executor(client.callback_executor().cloned());
        Ok(Adaptation::Handled(adapter))
    }
}

/// Handles `RawCall<T>`. Always registered last.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCallAdapterFactory;

impl CallAdapterFactory for DefaultCallAdapterFactory {
    fn get(&self, shape: &ReturnShape, _client: &ServiceClient) -> Result<Adaptation> {
        if shape.raw() != RAW_CALL {
            return Ok(Adaptation::NotHandled);
        }
        let response_type = shape.type_argument().ok_or_else(|| {
            Error::configuration("RawCall must have a generic type (e.g. RawCall<ToDoItem>)")
        })?;
        Ok(Adaptation::Handled(CallAdapter::passthrough(response_type)))
    }
}

/// A return type a [`CallAdapter`] can build from a [`RawCall`].
///
/// Implement it, together with a [`CallAdapterFactory`] returning an adapter
/// whose [`produces`](CallAdapter::produces) matches [`AdaptCall::SHAPE`], to
/// declare service methods returning your own call type.
pub trait AdaptCall: Sized {
    /// Outer type name as written in service declarations.
    const SHAPE: &'static str;

    /// Response payload type.
    type Payload: DeserializeOwned + Send + 'static;

    /// Wrap `call`.
    fn adapt(call: RawCall<Self::Payload>, adapter: &CallAdapter) -> Self;
}

impl<T> AdaptCall for PendingCall<T>
where
    T: DeserializeOwned + Send + 'static,
{
    const SHAPE: &'static str = PENDING_CALL;
    type Payload = T;

    fn adapt(call: RawCall<T>, adapter: &CallAdapter) -> Self {
        Self::new(call, adapter.callback_executor().cloned())
    }
}

impl<T> AdaptCall for RawCall<T>
where
    T: DeserializeOwned + Send + 'static,
{
    const SHAPE: &'static str = RAW_CALL;
    type Payload = T;

    fn adapt(call: RawCall<T>, _adapter: &CallAdapter) -> Self {
        call
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;
    use crate::QueueExecutor;

    fn client() -> ServiceClient {
        ServiceClient::builder()
            .base_url("http://localhost/")
            .build()
            .expect("valid client")
    }

    #[tokio::test]
    async fn classifying_factory_handles_pending_call() {
        let shape = ReturnShape::new("PendingCall", &["Vec<ToDoItem>"]);
        let_assert!(
            Ok(Adaptation::Handled(adapter)) = ClassifyingAdapterFactory.get(&shape, &client())
        );
        check!(adapter.produces() == "PendingCall");
        check!(adapter.response_type() == "Vec<ToDoItem>");
        check!(adapter.to_string() == "PendingCall<Vec<ToDoItem>>");
    }

    #[tokio::test]
    async fn classifying_factory_declines_other_shapes() {
        for shape in [
            ReturnShape::new("RawCall", &["ToDoItem"]),
            ReturnShape::new("Vec", &["ToDoItem"]),
            ReturnShape::new("String", &[]),
            ReturnShape::new("PendingCall", &["ToDoItem", "ApiError"]),
        ] {
            let_assert!(Ok(Adaptation::NotHandled) = ClassifyingAdapterFactory.get(&shape, &client()));
        }
    }

    #[tokio::test]
    async fn bare_pending_call_fails_fast() {
        let shape = ReturnShape::new("PendingCall", &[]);
        let_assert!(Err(Error::Configuration(message)) = ClassifyingAdapterFactory.get(&shape, &client()));
        check!(message.contains("must have a generic type"));
    }

    #[tokio::test]
    async fn classifying_adapter_carries_executor() {
        let (executor, _queue) = QueueExecutor::new();
        let client = ServiceClient::builder()
            .base_url("http://localhost/")
            .callback_executor(executor)
            .build()
            .expect("valid client");

        let shape = ReturnShape::new("PendingCall", &["u32"]);
        let_assert!(Ok(Adaptation::Handled(adapter)) = ClassifyingAdapterFactory.get(&shape, &client));
        check!(adapter.callback_executor().is_some());
    }

    #[tokio::test]
    async fn default_factory_handles_raw_call_only() {
        let raw = ReturnShape::new("RawCall", &["u32"]);
        let_assert!(Ok(Adaptation::Handled(adapter)) = DefaultCallAdapterFactory.get(&raw, &client()));
        check!(adapter.produces() == "RawCall");

        let pending = ReturnShape::new("PendingCall", &["u32"]);
        let_assert!(Ok(Adaptation::NotHandled) = DefaultCallAdapterFactory.get(&pending, &client()));
    }

    #[test]
    fn shape_display() {
        check!(ReturnShape::new("PendingCall", &[]).to_string() == "PendingCall");
        check!(ReturnShape::new("Either", &["A", "B"]).to_string() == "Either<A, B>");
    }
}
