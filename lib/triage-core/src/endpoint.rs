//! Endpoint declarations.
//!
//! An [`Endpoint`] names one remote operation: an HTTP [`Method`] and a path
//! resolved against the client's base URL. Paths follow URL reference rules,
//! so `todos` against `https://host/api/` targets `https://host/api/todos`
//! while `/todos` targets `https://host/todos`.

use derive_more::Display;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use url::Url;

use crate::{Error, Result};

/// Characters escaped when substituting a value into a path segment.
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\')
    .add(b'%');

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Method {
    /// GET
    #[display("GET")]
    Get,
    /// POST
    #[display("POST")]
    Post,
    /// PUT
    #[display("PUT")]
    Put,
    /// DELETE
    #[display("DELETE")]
    Delete,
    /// PATCH
    #[display("PATCH")]
    Patch,
    /// HEAD
    #[display("HEAD")]
    Head,
    /// OPTIONS
    #[display("OPTIONS")]
    Options,
}

impl Method {
    /// Returns `true` when a request body may be attached.
    #[must_use]
    pub const fn permits_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch | Self::Delete)
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
            Method::Patch => Self::PATCH,
            Method::Head => Self::HEAD,
            Method::Options => Self::OPTIONS,
        }
    }
}

/// A declared remote operation.
///
/// Endpoints are immutable and usually `const`:
///
/// ```
/// use triage_core::{Endpoint, Method};
///
/// const TODOS: Endpoint = Endpoint::get("todos");
/// assert_eq!(TODOS.method(), Method::Get);
/// assert_eq!(TODOS.to_string(), "GET todos");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display("{method} {path}")]
pub struct Endpoint {
    method: Method,
    path: &'static str,
}

impl Endpoint {
    /// Declare an endpoint.
    #[must_use]
    pub const fn new(method: Method, path: &'static str) -> Self {
        Self { method, path }
    }

    /// Declare a GET endpoint.
    #[must_use]
    pub const fn get(path: &'static str) -> Self {
        Self::new(Method::Get, path)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Path template, possibly containing `{name}` placeholders.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    /// Resolve the endpoint against a base URL.
    ///
    /// Each `(name, value)` pair replaces the `{name}` placeholder with the
    /// percent-encoded value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] when a parameter has no matching
    /// placeholder or a placeholder is left unresolved, and
    /// [`Error::InvalidUrl`] when the result is not a valid URL.
    pub fn resolve(&self, base_url: &Url, params: &[(&str, String)]) -> Result<Url> {
        let mut path = self.path.to_string();
        for (name, value) in params {
            let placeholder = format!("{{{name}}}");
            if !path.contains(&placeholder) {
                return Err(Error::invalid_request(format!(
                    "no placeholder `{placeholder}` in `{}`",
                    self.path
                )));
            }
            let encoded = utf8_percent_encode(value, PATH_SEGMENT_ENCODE_SET).to_string();
            path = path.replace(&placeholder, &encoded);
        }

        // substituted values are encoded, so any brace left is a placeholder
        if path.contains('{') {
            return Err(Error::invalid_request(format!(
                "unresolved placeholder in `{}`",
                self.path
            )));
        }

        base_url.join(&path).map_err(Error::InvalidUrl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://jsonplaceholder.typicode.com/").expect("valid URL")
    }

    #[test]
    fn relative_path_joins_base() {
        let url = Endpoint::get("todos").resolve(&base(), &[]).expect("resolve");
        assert_eq!(url.as_str(), "https://jsonplaceholder.typicode.com/todos");
    }

    #[test]
    fn relative_path_keeps_base_prefix() {
        let base = Url::parse("https://api.example.com/v1/").expect("valid URL");
        let url = Endpoint::get("todos").resolve(&base, &[]).expect("resolve");
        assert_eq!(url.as_str(), "https://api.example.com/v1/todos");

        let url = Endpoint::get("/todos").resolve(&base, &[]).expect("resolve");
        assert_eq!(url.as_str(), "https://api.example.com/todos");
    }

    #[test]
    fn placeholders_are_encoded() {
        let endpoint = Endpoint::new(Method::Get, "users/{user}/todos");
        let url = endpoint
            .resolve(&base(), &[("user", "a b/c".to_string())])
            .expect("resolve");
        assert_eq!(
            url.as_str(),
            "https://jsonplaceholder.typicode.com/users/a%20b%2Fc/todos"
        );
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let err = Endpoint::get("todos")
            .resolve(&base(), &[("id", "1".to_string())])
            .expect_err("no placeholder");
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn missing_parameter_is_rejected() {
        let err = Endpoint::get("todos/{id}")
            .resolve(&base(), &[])
            .expect_err("unresolved");
        assert!(err.to_string().contains("unresolved placeholder"));
    }

    #[test]
    fn method_body_rules() {
        assert!(!Method::Get.permits_body());
        assert!(!Method::Head.permits_body());
        assert!(Method::Post.permits_body());
        assert!(Method::Patch.permits_body());
    }

    #[test]
    fn method_into_http() {
        assert_eq!(http::Method::from(Method::Get), http::Method::GET);
        assert_eq!(http::Method::from(Method::Options), http::Method::OPTIONS);
    }
}
