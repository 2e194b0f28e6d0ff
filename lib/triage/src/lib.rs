//! Retrofit-style call adapter classifying HTTP exchanges.
//!
//! Declare endpoints on a trait with `#[service]`, create the client through
//! a [`ServiceClient`] with the [`ClassifyingAdapterFactory`] registered, and
//! every call comes back as one of six [`Outcome`]s: success,
//! unauthenticated, client error, server error, network error or unexpected
//! error.
//!
//! # Example
//!
//! ```ignore
//! use triage::prelude::*;
//!
//! #[derive(Debug, Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! pub struct ToDoItem {
//!     user_id: u64,
//!     id: u64,
//!     title: String,
//!     completed: bool,
//! }
//!
//! #[service]
//! pub trait TodoService {
//!     #[get("todos")]
//!     fn todo_list(&self) -> PendingCall<Vec<ToDoItem>>;
//! }
//!
//! let client = ServiceClient::builder()
//!     .base_url("https://jsonplaceholder.typicode.com/")
//!     .add_call_adapter_factory(ClassifyingAdapterFactory)
//!     .build()?;
//! let todos: TodoServiceClient = client.create()?;
//!
//! match todos.todo_list().execute().await {
//!     Ok(response) => println!("{:?}", response.body()),
//!     Err(Error::Unauthenticated(_)) => println!("sign in first"),
//!     Err(err) => println!("{} ({})", err, err.outcome()),
//! }
//! ```
//!
//! Enqueued calls report through a [`Callback`] instead, one method per
//! outcome, optionally on a [`CallbackExecutor`] such as [`QueueExecutor`].

mod adapter;
mod call;
mod config;
mod connector;
mod executor;
pub mod middleware;
mod pending;
pub mod prelude;
mod service;
mod transport;

pub use adapter::{
    AdaptCall, Adaptation, CallAdapter, CallAdapterFactory, ClassifyingAdapterFactory,
    DefaultCallAdapterFactory, PENDING_CALL, RAW_CALL, ReturnShape,
};
pub use call::{Call, RawCall};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_USER_AGENT};
pub use executor::{CallbackExecutor, QueueExecutor, RuntimeExecutor, Task, TaskQueue, dispatch};
pub use pending::{Callback, PendingCall, classify};
pub use service::{MethodDescriptor, ServiceClient, ServiceClientBuilder, ServiceDefinition};
pub use transport::{BoxedService, HyperClient, HyperClientBuilder, Transport, TransportFuture};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use triage_core::{
    Endpoint, Error, HttpClient, Method, Outcome, RawResponse, Request, RequestBuilder, Response,
    Result, StatusCode, from_json, header, to_json,
};

// Re-export macros
pub use triage_macro::{delete, get, head, options, patch, post, put, service};
