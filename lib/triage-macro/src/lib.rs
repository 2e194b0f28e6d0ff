//! Procedural macros for triage service declarations.
//!
//! - `#[service]` turns a trait into a service declaration
//! - `#[get]`, `#[post]`, `#[put]`, `#[delete]`, `#[patch]`, `#[head]`, `#[options]` mark its methods
//! - `#[path]`, `#[query]`, `#[header]`, `#[body]` mark method parameters
//!
//! # Example
//!
//! ```ignore
//! use triage::prelude::*;
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
//! let todos = client.create::<TodoServiceClient>()?;
//! todos.todo_list().enqueue(callback);
//! ```

mod attrs;
mod codegen;
mod expand;

use proc_macro::TokenStream;

/// Declare an HTTP service.
///
/// This macro generates:
/// - the trait itself, without parameter attributes
/// - a `{Trait}Client` struct implementing it, created with
///   `ServiceClient::create::<{Trait}Client>()`
///
/// Every method takes `&self`, carries one HTTP method attribute with a path
/// relative to the base URL, and returns a call type such as
/// `PendingCall<T>` or `RawCall<T>`. Which call types are accepted is decided
/// by the call adapter factories registered on the `ServiceClient`.
///
/// # Example
///
/// ```ignore
/// #[service]
/// pub trait TodoService {
///     #[get("todos")]
///     fn todo_list(&self) -> PendingCall<Vec<ToDoItem>>;
///
///     #[get("todos/{id}")]
///     fn todo(&self, id: u64) -> PendingCall<ToDoItem>;
///
///     #[post("todos")]
///     fn create(&self, #[body] item: &NewToDoItem) -> PendingCall<ToDoItem>;
/// }
/// ```
#[proc_macro_attribute]
pub fn service(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand::expand_service(attr.into(), item.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Mark a service method as a GET request.
///
/// Only valid inside a `#[service]` trait.
#[proc_macro_attribute]
pub fn get(_attr: TokenStream, item: TokenStream) -> TokenStream {
    expand::expand_stray_method_attr("get", item.into()).into()
}

/// Mark a service method as a POST request.
///
/// Only valid inside a `#[service]` trait.
#[proc_macro_attribute]
pub fn post(_attr: TokenStream, item: TokenStream) -> TokenStream {
    expand::expand_stray_method_attr("post", item.into()).into()
}

/// Mark a service method as a PUT request.
///
/// Only valid inside a `#[service]` trait.
#[proc_macro_attribute]
pub fn put(_attr: TokenStream, item: TokenStream) -> TokenStream {
    expand::expand_stray_method_attr("put", item.into()).into()
}

/// Mark a service method as a DELETE request.
///
/// Only valid inside a `#[service]` trait.
#[proc_macro_attribute]
pub fn delete(_attr: TokenStream, item: TokenStream) -> TokenStream {
    expand::expand_stray_method_attr("delete", item.into()).into()
}

/// Mark a service method as a PATCH request.
///
/// Only valid inside a `#[service]` trait.
#[proc_macro_attribute]
pub fn patch(_attr: TokenStream, item: TokenStream) -> TokenStream {
    expand::expand_stray_method_attr("patch", item.into()).into()
}

/// Mark a service method as a HEAD request.
///
/// Only valid inside a `#[service]` trait.
#[proc_macro_attribute]
pub fn head(_attr: TokenStream, item: TokenStream) -> TokenStream {
    expand::expand_stray_method_attr("head", item.into()).into()
}

/// Mark a service method as an OPTIONS request.
///
/// Only valid inside a `#[service]` trait.
#[proc_macro_attribute]
pub fn options(_attr: TokenStream, item: TokenStream) -> TokenStream {
    expand::expand_stray_method_attr("options", item.into()).into()
}
