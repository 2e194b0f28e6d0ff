//! Service clients.
//!
//! [`ServiceClient`] binds a base URL, a transport, a runtime and the call
//! adapter registry. `#[service]` traits are instantiated through
//! [`ServiceClient::create`], which resolves an adapter for every declared
//! method up front so a misdeclared method fails at setup, not on first use.

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::debug;
use url::Url;

use crate::adapter::{
    AdaptCall, Adaptation, CallAdapter, CallAdapterFactory, DefaultCallAdapterFactory, ReturnShape,
};
use crate::executor::CallbackExecutor;
use crate::{
    ClientConfig, Endpoint, Error, HttpClient, HyperClient, RawCall, Request, RequestBuilder,
    Result, Transport,
};

/// One method of a service declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Method name.
    pub name: &'static str,
    /// Remote operation.
    pub endpoint: Endpoint,
    /// Declared return type.
    pub shape: ReturnShape,
}

impl MethodDescriptor {
    /// Describe a method.
    #[must_use]
    pub const fn new(name: &'static str, endpoint: Endpoint, shape: ReturnShape) -> Self {
        Self {
            name,
            endpoint,
            shape,
        }
    }
}

/// A client type generated by `#[service]`.
pub trait ServiceDefinition: Sized {
    /// Service trait name.
    const NAME: &'static str;

    /// Declared methods, in declaration order.
    const METHODS: &'static [MethodDescriptor];

    /// Assemble the client from one resolved adapter per method, in
    /// [`ServiceDefinition::METHODS`] order.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when `adapters` does not match the methods.
    fn from_parts(client: ServiceClient, adapters: Vec<CallAdapter>) -> Result<Self>;
}

struct Inner {
    transport: Transport,
    base_url: Url,
    runtime: Handle,
    executor: Option<Arc<dyn CallbackExecutor>>,
    factories: Vec<Arc<dyn CallAdapterFactory>>,
}

/// Base URL, transport and adapter registry shared by generated services.
///
/// Cloning is cheap.
#[derive(Clone)]
pub struct ServiceClient {
    inner: Arc<Inner>,
}

impl fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("factories", &self.inner.factories.len())
            .field("callback_executor", &self.inner.executor.is_some())
            .finish_non_exhaustive()
    }
}

impl ServiceClient {
    /// Create a new builder.
    #[must_use]
    pub fn builder() -> ServiceClientBuilder {
        ServiceClientBuilder::default()
    }

    /// Base URL endpoint paths resolve against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Runtime enqueued calls run on.
    #[must_use]
    pub fn runtime(&self) -> &Handle {
        &self.inner.runtime
    }

    /// Completion executor, if one was configured.
    #[must_use]
    pub fn callback_executor(&self) -> Option<&Arc<dyn CallbackExecutor>> {
        self.inner.executor.as_ref()
    }

    /// Shared transport handle.
    #[must_use]
    pub fn transport(&self) -> &Transport {
        &self.inner.transport
    }

    /// Find the adapter for `shape`: the first factory that handles it wins.
    ///
    /// # Errors
    ///
    /// A factory error, or [`Error::Configuration`] when every factory
    /// declines.
    pub fn call_adapter(&self, shape: &ReturnShape) -> Result<CallAdapter> {
        for factory in &self.inner.factories {
            if let Adaptation::Handled(adapter) = factory.get(shape, self)? {
                return Ok(adapter);
            }
        }
        Err(Error::configuration(format!("no call adapter handles {shape}")))
    }

    /// Instantiate a service, resolving the adapter of every method.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] naming the first method whose return type no
    /// adapter handles, or whose adapter produces a different type.
    pub fn create<S: ServiceDefinition>(&self) -> Result<S> {
        let adapters = S::METHODS
            .iter()
            .map(|method| {
                let adapter = self.call_adapter(&method.shape).map_err(|err| match err {
                    Error::Configuration(message) => Error::configuration(format!(
                        "{}::{}: {message}",
                        S::NAME,
                        method.name
                    )),
                    other => other,
                })?;
                if adapter.produces() != method.shape.raw() {
                    return Err(Error::configuration(format!(
                        "{}::{}: adapter produces {} but the method returns {}",
                        S::NAME,
                        method.name,
                        adapter.produces(),
                        method.shape
                    )));
                }
                Ok(adapter)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(service = S::NAME, methods = adapters.len(), "service created");
        S::from_parts(self.clone(), adapters)
    }

    /// Prepare a request for `endpoint`.
    ///
    /// `params` fill the path placeholders; `configure` adds query
    /// parameters, headers and body. `Accept: application/json` is set unless
    /// `configure` sets another.
    ///
    /// # Errors
    ///
    /// Path resolution or body serialization failures.
    pub fn request<F>(
        &self,
        endpoint: &Endpoint,
        params: &[(&str, String)],
        configure: F,
    ) -> Result<Request>
    where
        F: FnOnce(RequestBuilder) -> Result<RequestBuilder>,
    {
        let url = endpoint.resolve(self.base_url(), params)?;
        let builder = configure(Request::builder(endpoint.method(), url))?;
        Ok(builder.default_header("Accept", "application/json").build())
    }

    /// Create an unclassified call for a prepared request.
    #[must_use]
    pub fn raw_call<T>(&self, request: Result<Request>) -> RawCall<T> {
        RawCall::new(
            self.inner.transport.clone(),
            self.inner.runtime.clone(),
            request,
        )
    }

    /// Create a call of the declared type `R` through its resolved adapter.
    #[must_use]
    pub fn new_call<R: AdaptCall>(&self, request: Result<Request>, adapter: &CallAdapter) -> R {
        R::adapt(self.raw_call(request), adapter)
    }
}

/// Builder for [`ServiceClient`].
#[derive(Default)]
pub struct ServiceClientBuilder {
    base_url: Option<String>,
    transport: Option<Transport>,
    config: Option<ClientConfig>,
    logging: bool,
    runtime: Option<Handle>,
    executor: Option<Arc<dyn CallbackExecutor>>,
    factories: Vec<Arc<dyn CallAdapterFactory>>,
}

impl fmt::Debug for ServiceClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceClientBuilder")
            .field("base_url", &self.base_url)
            .field("custom_transport", &self.transport.is_some())
            .field("config", &self.config)
            .field("logging", &self.logging)
            .field("factories", &self.factories.len())
            .finish_non_exhaustive()
    }
}

impl ServiceClientBuilder {
    /// Base URL; must end with `/`.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Use `client` as transport instead of a default [`HyperClient`].
    #[must_use]
    pub fn client<C>(mut self, client: C) -> Self
    where
        C: HttpClient + Clone + 'static,
    {
        self.transport = Some(Transport::from_client(client));
        self
    }

    /// Use an existing transport handle.
    #[must_use]
    pub fn transport(mut self, transport: impl Into<Transport>) -> Self {
        self.transport = Some(transport.into());
        self
    }

    /// Configuration of the default [`HyperClient`]. Ignored with a custom
    /// transport.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Add exchange logging to the default [`HyperClient`].
    #[must_use]
    pub const fn with_logging(mut self) -> Self {
        self.logging = true;
        self
    }

    /// Runtime for enqueued and blocking calls. Defaults to the runtime
    /// `build` is called from.
    #[must_use]
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Deliver enqueued outcomes through `executor`.
    #[must_use]
    pub fn callback_executor(mut self, executor: impl CallbackExecutor) -> Self {
        self.executor = Some(Arc::new(executor));
        self
    }

    /// Register a call adapter factory. Factories are asked in registration
    /// order, before the built-in [`DefaultCallAdapterFactory`].
    #[must_use]
    pub fn add_call_adapter_factory(mut self, factory: impl CallAdapterFactory) -> Self {
        self.factories.push(Arc::new(factory));
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when the base URL is missing, invalid or not
    /// ending with `/`, or when no runtime was given and `build` runs outside
    /// one.
    pub fn build(self) -> Result<ServiceClient> {
        let raw = self
            .base_url
            .ok_or_else(|| Error::configuration("base URL is required"))?;
        let base_url = Url::parse(&raw)
            .map_err(|err| Error::configuration(format!("invalid base URL {raw:?}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::configuration(format!(
                "base URL {raw:?} cannot be a base"
            )));
        }
        if !base_url.path().ends_with('/') {
            return Err(Error::configuration(format!("base URL must end in /: {raw}")));
        }

        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| {
                Error::configuration("no tokio runtime: build inside one or set runtime(handle)")
            })?,
        };

        let transport = self.transport.unwrap_or_else(|| {
            let mut builder = HyperClient::builder().config(self.config.unwrap_or_default());
            if self.logging {
                builder = builder.with_logging();
            }
            builder.build().into()
        });

        let mut factories = self.factories;
        factories.push(Arc::new(DefaultCallAdapterFactory));

        debug!(base_url = %base_url, factories = factories.len(), "service client built");
        Ok(ServiceClient {
            inner: Arc::new(Inner {
                transport,
                base_url,
                runtime,
                executor: self.executor,
                factories,
            }),
        })
    }
}
