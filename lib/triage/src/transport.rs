//! Transport: the hyper-util client and the type-erased handle calls use.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower::util::BoxCloneService;
use tower::{Layer, ServiceExt};
use tower_service::Service;

use crate::middleware::LoggingLayer;
use crate::{
    Error, HttpClient, RawResponse, Request, Result,
    config::{ClientConfig, ClientConfigBuilder},
    connector::https_connector,
};

/// Type-erased transport service, the unit middleware layers wrap.
pub type BoxedService = BoxCloneService<Request, RawResponse, Error>;

/// Future returned by [`Transport::send`].
pub type TransportFuture = Pin<Box<dyn Future<Output = Result<RawResponse>> + Send + 'static>>;

/// Shareable handle on a transport.
///
/// Every call keeps one. Cloning is cheap; all clones share the same
/// connection pool and middleware stack.
#[derive(Clone)]
pub struct Transport {
    inner: Arc<Mutex<BoxedService>>,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport").finish_non_exhaustive()
    }
}

impl Transport {
    /// Wrap a composed tower service.
    #[must_use]
    pub fn from_service(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    /// Wrap any [`HttpClient`], for instance a test double.
    #[must_use]
    pub fn from_client<C>(client: C) -> Self
    where
        C: HttpClient + Clone + 'static,
    {
        let service = tower::service_fn(move |request: Request| {
            let client = client.clone();
            async move { client.execute(request).await }
        });
        Self::from_service(BoxCloneService::new(service))
    }

    /// Send one request. The returned future owns everything it needs.
    pub fn send(&self, request: Request) -> TransportFuture {
        // Clone the service out so the lock is not held across the exchange.
        let service = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        Box::pin(service.oneshot(request))
    }
}

impl HttpClient for Transport {
    fn execute(&self, request: Request) -> impl Future<Output = Result<RawResponse>> + Send {
        self.send(request)
    }
}

/// Raw hyper-util client, the innermost service of a [`HyperClient`].
#[derive(Clone)]
struct HyperService {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    timeout: Duration,
    user_agent: Arc<str>,
}

impl HyperService {
    fn new(config: &ClientConfig) -> Self {
        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .build(https_connector(config.connect_timeout));

        Self {
            inner,
            timeout: config.timeout,
            user_agent: Arc::from(config.user_agent.as_str()),
        }
    }

    fn to_hyper_request(&self, request: Request) -> Result<http::Request<Full<Bytes>>> {
        let (method, url, headers, body) = request.into_parts();

        let mut builder = http::Request::builder()
            .method(http::Method::from(method))
            .uri(url.as_str());

        let has_user_agent = headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case("user-agent"));
        if !has_user_agent {
            builder = builder.header(http::header::USER_AGENT, &*self.user_agent);
        }
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder
            .body(body.map_or_else(Full::default, Full::new))
            .map_err(|e| Error::invalid_request(e.to_string()))
    }

    fn collect_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    async fn exchange(self, request: Request) -> Result<RawResponse> {
        let hyper_request = self.to_hyper_request(request)?;

        let attempt = async {
            let response = self
                .inner
                .request(hyper_request)
                .await
                .map_err(map_hyper_error)?;

            let status = response.status().as_u16();
            let headers = Self::collect_headers(response.headers());
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| Error::connection(e.to_string()))?
                .to_bytes();

            Ok(RawResponse::new(status, headers, body))
        };

        tokio::time::timeout(self.timeout, attempt)
            .await
            .map_err(|_| Error::Timeout)?
    }
}

/// Map a hyper-util failure to an I/O-class [`Error`].
#[allow(clippy::needless_pass_by_value)]
fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
    let chain = source_chain(&err);
    let msg = if chain.is_empty() {
        err.to_string()
    } else {
        format!("{err}: {chain}")
    };

    if !err.is_connect() {
        let lower = msg.to_lowercase();
        if lower.contains("tls") || lower.contains("certificate") || lower.contains("handshake") {
            return Error::tls(msg);
        }
    }
    Error::connection(msg)
}

fn source_chain(err: &dyn std::error::Error) -> String {
    let mut parts = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}

impl Service<Request> for HyperService {
    type Response = RawResponse;
    type Error = Error;
    type Future = TransportFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        Box::pin(self.clone().exchange(request))
    }
}

/// HTTP client using hyper-util with connection pooling, rustls and tower
/// middleware.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use triage::HyperClient;
///
/// let client = HyperClient::builder()
///     .timeout(Duration::from_secs(5))
///     .with_logging()
///     .build();
/// ```
#[derive(Clone)]
pub struct HyperClient {
    transport: Transport,
    config: ClientConfig,
}

impl fmt::Debug for HyperClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperClient {
    /// Create a client with the default configuration and no middleware.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client with a custom configuration and no middleware.
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        let service = BoxCloneService::new(HyperService::new(&config));
        Self {
            transport: Transport::from_service(service),
            config,
        }
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> HyperClientBuilder {
        HyperClientBuilder::default()
    }

    /// Client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The shareable transport handle backing this client.
    #[must_use]
    pub fn transport(&self) -> Transport {
        self.transport.clone()
    }
}

impl Default for HyperClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for HyperClient {
    fn execute(&self, request: Request) -> impl Future<Output = Result<RawResponse>> + Send {
        self.transport.send(request)
    }
}

impl From<HyperClient> for Transport {
    fn from(client: HyperClient) -> Self {
        client.transport
    }
}

type LayerFn = Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>;

/// Builder for [`HyperClient`].
#[derive(Default)]
pub struct HyperClientBuilder {
    config: ClientConfigBuilder,
    layers: Vec<LayerFn>,
}

impl fmt::Debug for HyperClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperClientBuilder")
            .field("config", &self.config)
            .field("layers_count", &self.layers.len())
            .finish()
    }
}

impl HyperClientBuilder {
    /// Set the exchange timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Set the default `User-Agent`.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config = self.config.user_agent(user_agent);
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = ClientConfigBuilder::default()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .user_agent(config.user_agent);
        self
    }

    /// Add a tower layer around the transport.
    ///
    /// The last layer added is the outermost one.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service:
            Service<Request, Response = RawResponse, Error = Error> + Clone + Send + 'static,
        <L::Service as Service<Request>>::Future: Send,
    {
        self.layers.push(Arc::new(move |service| {
            BoxCloneService::new(layer.layer(service))
        }));
        self
    }

    /// Log every exchange with its classified outcome.
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Build the client.
    #[must_use]
    pub fn build(self) -> HyperClient {
        let config = self.config.build();

        let mut service: BoxedService = BoxCloneService::new(HyperService::new(&config));
        for layer_fn in self.layers {
            service = layer_fn(service);
        }

        HyperClient {
            transport: Transport::from_service(service),
            config,
        }
    }
}
